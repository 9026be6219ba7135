mod common;

use qoi::{
    consts::{QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN},
    decode_header, decode_to_buf, decode_to_vec, encode_to_buf, encode_to_vec, Channels,
    ColorSpace, Decoder, Encoder, Error, ErrorKind, Header, Result, Warning,
};

use self::common::{header, stream};

fn encoded_image() -> Result<Vec<u8>> {
    let data = [[12, 34, 56, 255], [200, 1, 2, 3], [200, 1, 2, 3], [13, 35, 57, 3]].concat();
    encode_to_vec(data, 2, 2, Channels::Rgba, ColorSpace::Srgb)
}

#[test]
fn test_encode_invalid_input() {
    let data = [0_u8; 16];
    assert!(matches!(
        encode_to_vec([] as [u8; 0], 1, 1, 4_u8, 0_u8),
        Err(Error::EmptyImage { width: 1, height: 1 })
    ));
    assert!(matches!(
        encode_to_vec(data, 0, 4, 4_u8, 0_u8),
        Err(Error::EmptyImage { width: 0, height: 4 })
    ));
    assert!(matches!(
        encode_to_vec(data, 2, 3, 4_u8, 0_u8),
        Err(Error::InvalidImageLength { size: 16, width: 2, height: 3 })
    ));
    assert!(matches!(
        encode_to_vec(data, u32::MAX, 2, 4_u8, 0_u8),
        Err(Error::ImageTooLarge { .. })
    ));
    assert!(matches!(
        encode_to_vec(data, 2, 2, 5_u8, 0_u8),
        Err(Error::InvalidChannels { channels: 5 })
    ));
    assert!(matches!(
        encode_to_vec(data, 2, 2, 4_u8, 2_u8),
        Err(Error::InvalidColorSpace { colorspace: 2 })
    ));
    let err = encode_to_vec(data, 0, 0, 4_u8, 0_u8).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.is_invalid_input());
}

#[test]
fn test_encode_output_buffer_too_small() -> Result<()> {
    let data = [0_u8; 16];
    let encoder = Encoder::new(&data, 2, 2)?;
    let mut out = vec![0xee_u8; encoder.required_buf_len() - 1];
    let err = encoder.encode_to_buf(&mut out).unwrap_err();
    assert!(matches!(err, Error::OutputBufferTooSmall { .. }));
    // nothing written before failing
    assert!(out.iter().all(|&b| b == 0xee));

    let err = encode_to_buf(&mut out[..4], data, 2, 2, 4_u8, 0_u8).unwrap_err();
    assert!(err.is_invalid_input());
    Ok(())
}

#[test]
fn test_decode_bad_header() {
    let mut data = stream(1, 1, &[QOI_OP_RUN]);
    data[0] = b'Q';
    assert!(matches!(decode_header(&data), Err(Error::InvalidMagic { magic }) if &magic == b"Qoif"));

    let data = stream(0, 1, &[QOI_OP_RUN]);
    assert!(matches!(decode_to_vec(&data), Err(Error::InvalidDimensions { width: 0, height: 1 })));

    let data = stream(u32::MAX, 2, &[QOI_OP_RUN]);
    assert!(matches!(decode_header(&data), Err(Error::InvalidDimensions { .. })));

    let mut data = header(1, 1, 2, 0);
    data.extend([QOI_OP_RUN, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert!(matches!(decode_to_vec(&data), Err(Error::InvalidHeaderChannels { channels: 2 })));

    let data = header(1, 1, 4, 0);
    assert!(matches!(decode_header(&data[..13]), Err(Error::UnexpectedBufferEnd)));
    assert!(matches!(Decoder::from_stream(&data[..10]), Err(Error::UnexpectedBufferEnd)));

    let err = decode_header(b"qoif").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_unknown_colorspace_is_lenient() -> Result<()> {
    let mut data = stream(1, 1, &[QOI_OP_RUN]);
    data[13] = 7;
    let header = decode_header(&data)?;
    assert_eq!(header.colorspace, ColorSpace::Linear);
    Ok(())
}

#[test]
fn test_decode_truncated_payload() -> Result<()> {
    let chunks: [&[u8]; 3] = [&[QOI_OP_RGB, 1, 2], &[QOI_OP_RGBA, 1, 2, 3], &[QOI_OP_LUMA]];
    for chunk in chunks {
        let mut data = header(1, 1, 4, 0);
        data.extend(chunk);
        let err = decode_to_vec(&data).unwrap_err();
        assert!(matches!(err, Error::UnexpectedBufferEnd), "{:?}", chunk);
        assert!(err.is_format_error());
    }

    let encoded = encoded_image()?;
    for len in Header::SIZE..encoded.len() - 8 {
        assert!(decode_to_vec(&encoded[..len]).is_err(), "truncated at {}", len);
    }
    Ok(())
}

#[test]
fn test_decode_premature_end() {
    // two pixels promised, one delivered
    let mut data = header(2, 1, 4, 0);
    data.push(QOI_OP_RUN);
    assert!(matches!(decode_to_vec(&data), Err(Error::UnexpectedBufferEnd)));
}

#[test]
fn test_decode_declared_size_exceeds_stream() -> Result<()> {
    // 65536x65535 RGBA would need ~17 GB; one chunk byte can hold 62 pixels at most
    let mut data = header(65536, 65535, 4, 0);
    data.push(QOI_OP_RUN);
    assert_eq!(decode_header(&data)?.width, 65536);
    assert!(matches!(decode_to_vec(&data), Err(Error::UnexpectedBufferEnd)));
    assert!(matches!(
        Decoder::from_stream(&data[..])?.decode_to_vec(),
        Err(Error::UnexpectedBufferEnd)
    ));

    let mut out = [0xee_u8; 8];
    let mut data = header(2, 1, 4, 0);
    assert!(matches!(Decoder::new(&data)?.decode_to_buf(&mut out), Err(Error::UnexpectedBufferEnd)));
    assert_eq!(out, [0; 8]);

    // 63 pixels need at least two chunk bytes
    data = header(63, 1, 4, 0);
    data.push(QOI_OP_RUN | 61);
    assert!(matches!(decode_to_vec(&data), Err(Error::UnexpectedBufferEnd)));
    data.push(QOI_OP_RUN);
    assert_eq!(decode_to_vec(&data)?.1, [0_u8, 0, 0, 255].repeat(63));
    Ok(())
}

#[test]
fn test_decode_run_overflow() {
    let data = stream(2, 1, &[QOI_OP_RUN | 2]);
    assert!(matches!(decode_to_vec(&data), Err(Error::RunOverflow { run: 3, remaining: 2 })));
}

#[test]
fn test_decode_to_buf_clears_on_error() {
    let data = stream(2, 1, &[QOI_OP_RGB, 9, 9, 9, QOI_OP_RUN | 5]);
    let mut out = [0xee_u8; 12];
    assert!(decode_to_buf(&mut out, &data).is_err());
    assert_eq!(out[..8], [0; 8]);
    assert_eq!(out[8..], [0xee; 4]);
}

#[test]
fn test_decode_output_buffer_too_small() -> Result<()> {
    let encoded = encoded_image()?;
    let mut decoder = Decoder::new(&encoded)?;
    let mut out = vec![0_u8; decoder.required_buf_len() - 1];
    assert!(matches!(decoder.decode_to_buf(&mut out), Err(Error::OutputBufferTooSmall { .. })));
    Ok(())
}

#[test]
fn test_end_marker_warnings() -> Result<()> {
    let encoded = encoded_image()?;
    let (_, expected) = decode_to_vec(&encoded)?;

    let cases: [(Vec<u8>, Warning); 3] = [
        (encoded[..encoded.len() - 1].to_vec(), Warning::EndMarkerTruncated { len: 7 }),
        ([&encoded[..encoded.len() - 1], &[2_u8][..]].concat(), Warning::EndMarkerMismatch),
        ([&encoded[..], &[0_u8, 0, 0][..]].concat(), Warning::TrailingBytes { count: 3 }),
    ];
    for (data, warning) in cases {
        let mut decoder = Decoder::new(&data)?;
        assert_eq!(decoder.decode_to_vec()?, expected);
        assert_eq!(decoder.warnings(), &[warning]);

        let mut decoder = Decoder::new(&data)?.with_strict(true);
        let err = decoder.decode_to_vec().unwrap_err();
        assert!(matches!(err, Error::Integrity(w) if w == warning));
        assert_eq!(err.kind(), ErrorKind::Format);

        // the lenient free function still returns the image
        assert_eq!(decode_to_vec(&data)?.1, expected);
    }

    let mut decoder = Decoder::new(&encoded)?.with_strict(true);
    assert_eq!(decoder.decode_to_vec()?, expected);
    assert!(decoder.warnings().is_empty());
    Ok(())
}

#[test]
fn test_error_display() {
    let err = Error::RunOverflow { run: 3, remaining: 2 };
    assert_eq!(err.to_string(), "run of 3 pixels overflows image (2 pixels remaining)");
    let err = Error::Integrity(Warning::TrailingBytes { count: 5 });
    assert_eq!(
        err.to_string(),
        "stream integrity check failed: 5 trailing bytes after end-of-stream marker"
    );
}
