#![no_main]
use libfuzzer_sys::fuzz_target;

use qoi::{decode_header, Channels, ColorSpace, Decoder, Header};

fuzz_target!(|input: (u32, u32, bool, bool, &[u8])| {
    let (w, h, is_4, raw_dims, data) = input;
    // raw dimensions may promise far more pixels than the chunk bytes can hold
    let (w, h) = if raw_dims { (w, h) } else { (1 + w % 260, 1 + h % 260) };
    let channels = if is_4 { 4 } else { 3 };

    let mut vec = b"qoif".to_vec();
    vec.extend(w.to_be_bytes());
    vec.extend(h.to_be_bytes());
    vec.extend([channels, 0]);
    vec.extend(data);
    vec.extend(&[0, 0, 0, 0, 0, 0, 0, 1]);

    let header = match decode_header(&vec) {
        Ok(header) => header,
        Err(err) => {
            assert!(raw_dims && err.is_format_error());
            return;
        }
    };
    let header_expected = Header {
        width: w,
        height: h,
        channels: Channels::try_from(channels).unwrap(),
        colorspace: ColorSpace::Srgb,
    };
    assert_eq!(header, header_expected);

    let mut decoder = Decoder::new(&vec).unwrap();
    match decoder.decode_to_vec() {
        Ok(out) => assert_eq!(out.len(), header_expected.n_bytes()),
        Err(err) => assert!(err.is_format_error()),
    }
});
