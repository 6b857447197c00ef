use super::*;

// -------------------- encode_field --------------------

#[test]
fn encode_zero_is_space_padded() {
    let mut out = Vec::new();
    encode_field(&mut out, 0, 7).unwrap();
    assert_eq!(out, b"      0");
}

#[test]
fn encode_appends_without_clearing() {
    let mut out = b"x".to_vec();
    encode_field(&mut out, 12, 4).unwrap();
    assert_eq!(out, b"x  12");
}

#[test]
fn encode_exact_width_needs_no_padding() {
    let mut out = Vec::new();
    encode_field(&mut out, 9_999_999, 7).unwrap();
    assert_eq!(out, b"9999999");
}

#[test]
fn encode_rejects_value_wider_than_field() {
    let mut out = Vec::new();
    let err = encode_field(&mut out, 10_000_000, 7).unwrap_err();
    assert_eq!(
        err,
        CodecError::Overflow {
            value: 10_000_000,
            width: 7
        }
    );
    assert!(out.is_empty());
}

// -------------------- decode_field --------------------

#[test]
fn decode_round_trips() {
    for value in [0u64, 1, 42, 137, 9_999_999] {
        let mut out = Vec::new();
        encode_field(&mut out, value, 7).unwrap();
        assert_eq!(decode_field(&out).unwrap(), value);
    }
}

#[test]
fn decode_rejects_all_spaces() {
    assert_eq!(
        decode_field(b"       ").unwrap_err(),
        CodecError::Malformed("empty numeric field")
    );
}

#[test]
fn decode_rejects_embedded_garbage() {
    assert_eq!(
        decode_field(b"  12x34").unwrap_err(),
        CodecError::Malformed("non-digit in numeric field")
    );
}

#[test]
fn decode_rejects_trailing_space() {
    // padding is leading-only; a trailing space is not a digit
    assert!(decode_field(b" 12 ").is_err());
}

#[test]
fn decode_rejects_u64_overflow() {
    assert_eq!(
        decode_field(b"99999999999999999999").unwrap_err(),
        CodecError::Malformed("numeric field overflows u64")
    );
}

// -------------------- build_body / parse_body --------------------

#[test]
fn body_round_trips() {
    let mut body = Vec::new();
    build_body(&mut body, b"alice", 96, 3);
    assert_eq!(body, b"alice:96:3\n");

    let parsed = parse_body(&body).unwrap();
    assert_eq!(
        parsed,
        Body {
            key_len: 5,
            data_off: 96,
            data_len: 3
        }
    );
    assert_eq!(&body[..parsed.key_len], b"alice");
}

#[test]
fn blank_key_parses() {
    // the shape of a deleted record: key bytes replaced with the fill byte
    let parsed = parse_body(b"     :96:3\n").unwrap();
    assert_eq!(parsed.key_len, 5);
    assert!(b"     "[..parsed.key_len].iter().all(|&b| b == FILL));
}

#[test]
fn parse_rejects_missing_terminator() {
    assert_eq!(
        parse_body(b"alice:96:3").unwrap_err(),
        CodecError::Malformed("missing body terminator")
    );
}

#[test]
fn parse_rejects_missing_separators() {
    assert_eq!(
        parse_body(b"alice\n").unwrap_err(),
        CodecError::Malformed("missing first separator")
    );
    assert_eq!(
        parse_body(b"alice:96\n").unwrap_err(),
        CodecError::Malformed("missing second separator")
    );
}

#[test]
fn parse_rejects_extra_separator() {
    assert_eq!(
        parse_body(b"alice:96:3:9\n").unwrap_err(),
        CodecError::Malformed("too many separators")
    );
}

#[test]
fn parse_rejects_non_decimal_offset() {
    assert!(parse_body(b"alice:9x:3\n").is_err());
    assert!(parse_body(b"alice::3\n").is_err());
}

// -------------------- decimal_width --------------------

#[test]
fn decimal_width_counts_digits() {
    assert_eq!(decimal_width(0), 1);
    assert_eq!(decimal_width(9), 1);
    assert_eq!(decimal_width(10), 2);
    assert_eq!(decimal_width(9_999_999), 7);
    assert_eq!(decimal_width(u64::MAX), 20);
}
