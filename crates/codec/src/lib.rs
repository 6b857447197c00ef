//! # Codec - fixed-width ASCII fields and index-record bodies
//!
//! Everything TandemDB writes to disk is printable ASCII: chain pointers and
//! record lengths are right-aligned, space-padded decimal fields of a fixed
//! width, and each index-record body is a single `key:offset:length` line.
//! This crate is the only place those byte layouts are produced or
//! interpreted, so malformed on-disk data is detected at exactly one
//! boundary.
//!
//! ## Fixed-width field
//!
//! ```text
//! [padding spaces ...][decimal digits]      exactly `width` bytes
//! ```
//!
//! A 7-byte pointer field holding 42 is `"     42"`. The all-zero pointer
//! that terminates every chain is `"      0"`.
//!
//! ## Index-record body
//!
//! ```text
//! [key bytes]':'[data offset]':'[data length]'\n'
//! ```
//!
//! Offset and length inside the body are plain unpadded decimal. The body of
//! a deleted record keeps its exact length but has every key byte replaced
//! with the fill byte, so parsers accept an all-blank key field.
//!
//! ## Example
//!
//! ```rust
//! let mut field = Vec::new();
//! codec::encode_field(&mut field, 42, 7).unwrap();
//! assert_eq!(field, b"     42");
//! assert_eq!(codec::decode_field(&field).unwrap(), 42);
//!
//! let mut body = Vec::new();
//! codec::build_body(&mut body, b"alice", 96, 3);
//! assert_eq!(body, b"alice:96:3\n");
//! let parsed = codec::parse_body(&body).unwrap();
//! assert_eq!(parsed.key_len, 5);
//! ```

use thiserror::Error;

/// Separator between the key, data-offset, and data-length body fields.
pub const SEP: u8 = b':';

/// Terminator of the index-file header, every index-record body, and every
/// data record.
pub const NEWLINE: u8 = b'\n';

/// Byte used to pad fixed-width fields and to blank out deleted records.
///
/// Deleted records are filled with this byte rather than zero; existing
/// database files depend on the exact choice.
pub const FILL: u8 = b' ';

/// Errors produced while encoding or decoding on-disk fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The value has more decimal digits than the field width allows.
    #[error("value {value} does not fit in a {width}-byte field")]
    Overflow { value: u64, width: usize },

    /// The bytes read from disk are not a well-formed field or body.
    #[error("malformed on-disk data: {0}")]
    Malformed(&'static str),
}

/// Parsed contents of an index-record body.
///
/// The key itself is not copied out; callers slice it from the body buffer
/// via `key_len` so the handle's reusable buffer stays the only copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    /// Length in bytes of the key field (blank-filled for deleted records).
    pub key_len: usize,
    /// Byte offset of the paired data record in the data file.
    pub data_off: u64,
    /// Length in bytes of the paired data record, terminator included.
    pub data_len: u64,
}

/// Appends `value` to `out` as a right-aligned, space-padded decimal field of
/// exactly `width` bytes.
pub fn encode_field(out: &mut Vec<u8>, value: u64, width: usize) -> Result<(), CodecError> {
    if decimal_width(value) > width {
        return Err(CodecError::Overflow { value, width });
    }
    let field = format!("{value:>width$}");
    out.extend_from_slice(field.as_bytes());
    Ok(())
}

/// Decodes a fixed-width field: leading spaces, then one or more decimal
/// digits, nothing else.
pub fn decode_field(field: &[u8]) -> Result<u64, CodecError> {
    let mut start = 0;
    while start < field.len() && field[start] == FILL {
        start += 1;
    }
    parse_decimal(&field[start..])
}

/// Appends a full index-record body (`key:offset:length\n`) to `out`.
///
/// Offset and length are written as plain unpadded decimal; the caller is
/// responsible for bounds-checking the resulting body length.
pub fn build_body(out: &mut Vec<u8>, key: &[u8], data_off: u64, data_len: u64) {
    out.extend_from_slice(key);
    out.push(SEP);
    out.extend_from_slice(data_off.to_string().as_bytes());
    out.push(SEP);
    out.extend_from_slice(data_len.to_string().as_bytes());
    out.push(NEWLINE);
}

/// Parses an index-record body, terminator included.
///
/// Verifies the trailing newline and that the line splits into exactly three
/// `:`-separated fields; the offset and length fields must be pure decimal.
pub fn parse_body(body: &[u8]) -> Result<Body, CodecError> {
    let Some((&last, line)) = body.split_last() else {
        return Err(CodecError::Malformed("empty index-record body"));
    };
    if last != NEWLINE {
        return Err(CodecError::Malformed("missing body terminator"));
    }

    let first = line
        .iter()
        .position(|&b| b == SEP)
        .ok_or(CodecError::Malformed("missing first separator"))?;
    let rest = &line[first + 1..];
    let second = rest
        .iter()
        .position(|&b| b == SEP)
        .ok_or(CodecError::Malformed("missing second separator"))?;

    let off_field = &rest[..second];
    let len_field = &rest[second + 1..];
    if len_field.contains(&SEP) {
        return Err(CodecError::Malformed("too many separators"));
    }

    Ok(Body {
        key_len: first,
        data_off: parse_decimal(off_field)?,
        data_len: parse_decimal(len_field)?,
    })
}

/// Returns the number of decimal digits needed to print `value`.
pub fn decimal_width(value: u64) -> usize {
    match value.checked_ilog10() {
        Some(d) => d as usize + 1,
        None => 1, // value == 0 prints as "0"
    }
}

fn parse_decimal(digits: &[u8]) -> Result<u64, CodecError> {
    if digits.is_empty() {
        return Err(CodecError::Malformed("empty numeric field"));
    }
    let mut value: u64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(CodecError::Malformed("non-digit in numeric field"));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or(CodecError::Malformed("numeric field overflows u64"))?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests;
