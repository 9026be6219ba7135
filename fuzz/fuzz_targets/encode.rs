#![no_main]
use libfuzzer_sys::fuzz_target;

use qoi::{decode_to_vec, encode_max_len, encode_to_vec, Channels, ColorSpace};

fuzz_target!(|input: (u8, &[u8])| {
    let (w_frac, data) = input;
    let n_pixels = data.len() / 4;
    let (w, h) = if n_pixels == 0 {
        (0, 0)
    } else {
        let w = ((n_pixels * (1 + w_frac as usize)) / 256).max(1);
        let h = n_pixels / w;
        (w, h)
    };
    let img = &data[..(w * h * 4)];
    let out = encode_to_vec(img, w as u32, h as u32, Channels::Rgba, ColorSpace::Srgb);
    if w * h != 0 {
        let out = out.unwrap();
        assert!(out.len() <= encode_max_len(w as u32, h as u32));
        assert_eq!(decode_to_vec(&out).unwrap().1, img);
    } else {
        assert!(out.is_err());
    }
});
