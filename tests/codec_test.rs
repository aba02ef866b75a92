use spreadsheet_export::codec::{
    CodecError, DecodeOptions, DecoderOptions, EncodeOptions, TextDecoder, TextEncoder,
};

fn encoder() -> TextEncoder {
    TextEncoder::new("utf-8").unwrap()
}

fn decoder() -> TextDecoder {
    TextDecoder::new("utf-8", DecoderOptions::default()).unwrap()
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

#[test]
fn encodes_one_to_four_byte_sequences() {
    let bytes = encoder().encode("A€😀");
    assert_eq!(
        bytes,
        vec![0x41, 0xE2, 0x82, 0xAC, 0xF0, 0x9F, 0x98, 0x80]
    );
    assert_eq!(encoder().encode("é"), vec![0xC3, 0xA9]);
    assert!(encoder().encode("").is_empty());
}

#[test]
fn decodes_example_back_to_text() {
    let bytes = [0x41, 0xE2, 0x82, 0xAC, 0xF0, 0x9F, 0x98, 0x80];
    assert_eq!(decoder().decode_to_string(&bytes), "A€😀");
    assert_eq!(decoder().decode(&bytes), units("A€😀"));
}

#[test]
fn round_trips_text_without_lone_surrogates() {
    let samples = [
        "plain ascii".to_string(),
        "Country,Product,Price".to_string(),
        "ünïcödé ✓ 漢字".to_string(),
        "😀🎉🚀".repeat(50),
        "ä".repeat(1000),
        format!("{}{}", "x".repeat(31), "𝄞".repeat(300)),
    ];

    for sample in &samples {
        let bytes = encoder().encode(sample);
        assert_eq!(bytes, sample.as_bytes(), "encoding of {:?}", sample);
        assert_eq!(decoder().decode(&bytes), units(sample), "decoding of {:?}", sample);
    }
}

#[test]
fn supplementary_code_points_decode_to_surrogate_pairs() {
    for c in ['😀', '𝄞', '\u{10000}', '\u{10FFFF}'] {
        let mut expected = [0u16; 2];
        c.encode_utf16(&mut expected);

        let mut utf8 = [0u8; 4];
        let bytes = c.encode_utf8(&mut utf8).as_bytes();

        assert_eq!(decoder().decode(bytes), expected.to_vec());
    }
}

#[test]
fn lone_high_surrogate_is_dropped() {
    assert_eq!(encoder().encode_utf16(&[0xD800, 0x0061]), vec![0x61]);
    assert_eq!(encoder().encode_utf16(&[0x0041, 0xDBFF]), vec![0x41]);
    assert_eq!(encoder().encode_utf16(&[0xD83D, 0xD83D, 0xDE00]), vec![0xF0, 0x9F, 0x98, 0x80]);
}

#[test]
fn lone_low_surrogate_is_encoded_as_three_bytes() {
    assert_eq!(encoder().encode_utf16(&[0xDC00]), vec![0xED, 0xB0, 0x80]);
}

#[test]
fn rejects_other_labels() {
    match TextEncoder::new("latin1") {
        Err(CodecError::InvalidEncodingLabel { label, .. }) => assert_eq!(label, "latin1"),
        other => panic!("expected InvalidEncodingLabel, got {:?}", other),
    }
    assert!(matches!(
        TextDecoder::new("utf8", DecoderOptions::default()),
        Err(CodecError::InvalidEncodingLabel { .. })
    ));
}

#[test]
fn rejects_unsupported_options() {
    let err = encoder()
        .encode_with(&units("abc"), EncodeOptions { stream: true })
        .unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedOption { option: "stream", .. }));
    assert_eq!(
        err.to_string(),
        "Failed to encode: the 'stream' option is unsupported."
    );

    assert!(matches!(
        TextDecoder::new("utf-8", DecoderOptions { fatal: true }),
        Err(CodecError::UnsupportedOption { option: "fatal", .. })
    ));
    assert!(matches!(
        decoder().decode_with(b"abc", DecodeOptions { stream: true }),
        Err(CodecError::UnsupportedOption { option: "stream", .. })
    ));

    let encoded = encoder().encode_with(&units("abc"), EncodeOptions::default()).unwrap();
    assert_eq!(encoded, b"abc");
    assert_eq!(
        decoder().decode_with(b"abc", DecodeOptions::default()).unwrap(),
        units("abc")
    );
}

#[test]
fn decode_stops_at_nul() {
    assert_eq!(decoder().decode_to_string(b"ab\0cd"), "ab");
    assert!(decoder().decode(b"\0abc").is_empty());
}

#[test]
fn malformed_input_decodes_deterministically() {
    // Stray continuation byte produces nothing.
    assert_eq!(decoder().decode(&[0x80, 0x41]), vec![0x41]);
    // Missing continuation bytes read as zero.
    assert_eq!(decoder().decode(&[0xE2, 0x82]), vec![0x2080]);
    assert_eq!(decoder().decode(&[0xC3]), vec![0xC0]);
    // Continuation bits are masked, not validated.
    assert_eq!(decoder().decode(&[0xC3, 0x29]), vec![0xE9]);

    let garbage = [0xFF, 0xF0, 0x41, 0xC0, 0xE0];
    assert_eq!(decoder().decode(&garbage), decoder().decode(&garbage));
}

#[test]
fn accessors_report_fixed_values() {
    assert_eq!(encoder().encoding(), "utf-8");
    assert_eq!(decoder().encoding(), "utf-8");
    assert!(!decoder().fatal());
    assert!(!decoder().ignore_bom());
}
