//! Order-preserving encoding of typed values.
//!
//! Keycode flattens typed values into byte strings whose lexicographic
//! order equals the values' logical order, so a plain byte-ordered
//! key/value store can serve typed range scans. Every encoding starts with
//! a single type tag; payloads are self-terminating, so concatenated
//! components parse left-to-right without length prefixes.
//!
//! # Tag alphabet
//!
//! | Byte | Meaning |
//! |------|---------|
//! | 0x00 | Reserved: escape terminator, stored-value sentinel |
//! | 0x01 | Container terminator (arrays, rows) |
//! | 0x02..=0x1D | Ascending type corridors, one `[min, tag, max]` trio per type |
//! | 0xE2..=0xFD | Descending tags, complements of the ascending alphabet |
//! | 0xFF | Never emitted in a tag position; free for range-bound suffixes |
//!
//! The min/max sentinel tags are reserved: they are never produced by
//! `encode_value`, and compare strictly below (resp. above) every real
//! encoding of their type. Range boundary synthesis appends them to key
//! prefixes to build type-homogeneous open bounds.
//!
//! # Descending encodings
//!
//! The descending encoding of a value is the bitwise complement of its
//! ascending encoding, tag included. Complementing every byte reverses
//! lexicographic order, prefixes included, so a single rule covers both
//! fixed-width and terminated payloads. Descending tags therefore have
//! their high bit set, which lets a decoder recognize the direction from
//! the tag alone.
//!
//! # Payloads
//!
//! - Integers and timestamps: 8-byte big-endian with the sign bit flipped,
//!   so negative values sort before positive ones.
//! - Doubles: IEEE 754 bits, negative values fully complemented and
//!   positive values with the sign bit set.
//! - Booleans and null: tag-only.
//! - Text and blobs: raw bytes with embedded 0x00 escaped as 0x00 0xFF,
//!   terminated by 0x00 0x00.
//! - Arrays and rows: recursively encoded elements, terminated by 0x01.

use crate::errdata;
use crate::error::Result;
use crate::value::Value;

pub(crate) const ARRAY_TERM: u8 = 0x01;

pub(crate) const NULL_MIN: u8 = 0x02;
pub(crate) const NULL: u8 = 0x03;
pub(crate) const NULL_MAX: u8 = 0x04;
pub(crate) const BOOLEAN_MIN: u8 = 0x05;
pub(crate) const FALSE: u8 = 0x06;
pub(crate) const TRUE: u8 = 0x07;
pub(crate) const BOOLEAN_MAX: u8 = 0x08;
pub(crate) const INTEGER_MIN: u8 = 0x09;
pub(crate) const INTEGER: u8 = 0x0A;
pub(crate) const INTEGER_MAX: u8 = 0x0B;
pub(crate) const DOUBLE_MIN: u8 = 0x0C;
pub(crate) const DOUBLE: u8 = 0x0D;
pub(crate) const DOUBLE_MAX: u8 = 0x0E;
pub(crate) const TIMESTAMP_MIN: u8 = 0x0F;
pub(crate) const TIMESTAMP: u8 = 0x10;
pub(crate) const TIMESTAMP_MAX: u8 = 0x11;
pub(crate) const TEXT_MIN: u8 = 0x12;
pub(crate) const TEXT: u8 = 0x13;
pub(crate) const TEXT_MAX: u8 = 0x14;
pub(crate) const BLOB_MIN: u8 = 0x15;
pub(crate) const BLOB: u8 = 0x16;
pub(crate) const BLOB_MAX: u8 = 0x17;
pub(crate) const ARRAY_MIN: u8 = 0x18;
pub(crate) const ARRAY: u8 = 0x19;
pub(crate) const ARRAY_MAX: u8 = 0x1A;
pub(crate) const ROW_MIN: u8 = 0x1B;
pub(crate) const ROW: u8 = 0x1C;
pub(crate) const ROW_MAX: u8 = 0x1D;

const SIGN_BIT: u64 = 1 << 63;

/// Returns true if the tag byte marks a descending encoding.
pub(crate) fn is_desc_tag(tag: u8) -> bool {
    tag & 0x80 != 0
}

/// Encodes an unsigned integer as a tagged big-endian byte string. Used
/// for namespace prefixes; the successor of an encoding is the encoding
/// of n+1, which makes `[encode_u64(n), encode_u64(n+1))` cover exactly
/// the keys of namespace n.
pub fn encode_u64(buf: &mut Vec<u8>, n: u64) {
    buf.push(INTEGER);
    buf.extend_from_slice(&n.to_be_bytes());
}

/// Decodes an unsigned integer encoded by [`encode_u64`], returning the
/// value and the number of bytes consumed.
pub fn decode_u64(buf: &[u8]) -> Result<(u64, usize)> {
    if buf.len() < 9 {
        return errdata!("truncated integer, got {} bytes", buf.len());
    }
    if buf[0] != INTEGER {
        return errdata!("expected integer tag, got {:#04x}", buf[0]);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[1..9]);
    Ok((u64::from_be_bytes(bytes), 9))
}

/// Encodes a value in ascending order: equal values encode equal, and
/// lesser values encode lexicographically lesser.
pub fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.push(NULL),
        Value::Boolean(false) => buf.push(FALSE),
        Value::Boolean(true) => buf.push(TRUE),
        Value::Integer(i) => {
            buf.push(INTEGER);
            buf.extend_from_slice(&((*i as u64) ^ SIGN_BIT).to_be_bytes());
        }
        Value::Double(d) => {
            buf.push(DOUBLE);
            let bits = d.to_bits();
            // Negative floats flip all bits, positive ones only the sign
            // bit, which linearizes the IEEE 754 order.
            let ordered = if bits & SIGN_BIT != 0 { !bits } else { bits | SIGN_BIT };
            buf.extend_from_slice(&ordered.to_be_bytes());
        }
        Value::Timestamp(us) => {
            buf.push(TIMESTAMP);
            buf.extend_from_slice(&((*us as u64) ^ SIGN_BIT).to_be_bytes());
        }
        Value::Text(s) => {
            buf.push(TEXT);
            encode_escaped(buf, s.as_bytes());
        }
        Value::Blob(b) => {
            buf.push(BLOB);
            encode_escaped(buf, b);
        }
        Value::Array(items) => {
            buf.push(ARRAY);
            for item in items {
                encode_value(buf, item);
            }
            buf.push(ARRAY_TERM);
        }
        Value::Row(fields) => {
            buf.push(ROW);
            for (name, value) in fields {
                buf.push(TEXT);
                encode_escaped(buf, name.as_bytes());
                encode_value(buf, value);
            }
            buf.push(ARRAY_TERM);
        }
    }
}

/// Encodes a value in descending order: the bitwise complement of the
/// ascending encoding.
pub fn encode_value_desc(buf: &mut Vec<u8>, value: &Value) {
    let start = buf.len();
    encode_value(buf, value);
    for b in &mut buf[start..] {
        *b = !*b;
    }
}

/// Decodes one value from the front of the buffer, returning it together
/// with the number of bytes consumed. Handles both ascending and
/// descending encodings; the direction is recognized from the tag.
pub fn decode_value(buf: &[u8]) -> Result<(Value, usize)> {
    let Some(&tag) = buf.first() else {
        return errdata!("cannot decode value from empty buffer");
    };
    if is_desc_tag(tag) {
        let flipped: Vec<u8> = buf.iter().map(|b| !b).collect();
        return decode_value(&flipped);
    }
    match tag {
        NULL => Ok((Value::Null, 1)),
        FALSE => Ok((Value::Boolean(false), 1)),
        TRUE => Ok((Value::Boolean(true), 1)),
        INTEGER => {
            let n = decode_fixed(buf)?;
            Ok((Value::Integer((n ^ SIGN_BIT) as i64), 9))
        }
        DOUBLE => {
            let ordered = decode_fixed(buf)?;
            let bits = if ordered & SIGN_BIT != 0 { ordered ^ SIGN_BIT } else { !ordered };
            Ok((Value::Double(f64::from_bits(bits)), 9))
        }
        TIMESTAMP => {
            let n = decode_fixed(buf)?;
            Ok((Value::Timestamp((n ^ SIGN_BIT) as i64), 9))
        }
        TEXT => {
            let (bytes, n) = decode_escaped(&buf[1..])?;
            Ok((Value::Text(String::from_utf8(bytes)?), 1 + n))
        }
        BLOB => {
            let (bytes, n) = decode_escaped(&buf[1..])?;
            Ok((Value::Blob(bytes), 1 + n))
        }
        ARRAY => {
            let mut pos = 1;
            let mut items = Vec::new();
            loop {
                match buf.get(pos) {
                    None => return errdata!("unterminated array"),
                    Some(&ARRAY_TERM) => return Ok((Value::Array(items), pos + 1)),
                    Some(_) => {
                        let (item, n) = decode_value(&buf[pos..])?;
                        items.push(item);
                        pos += n;
                    }
                }
            }
        }
        ROW => {
            let mut pos = 1;
            let mut fields = Vec::new();
            loop {
                match buf.get(pos) {
                    None => return errdata!("unterminated row"),
                    Some(&ARRAY_TERM) => return Ok((Value::Row(fields), pos + 1)),
                    Some(&TEXT) => {
                        let (name, n) = decode_escaped(&buf[pos + 1..])?;
                        pos += 1 + n;
                        let (value, n) = decode_value(&buf[pos..])?;
                        pos += n;
                        fields.push((String::from_utf8(name)?, value));
                    }
                    Some(&t) => return errdata!("invalid row field name tag {t:#04x}"),
                }
            }
        }
        tag => errdata!("invalid type tag {tag:#04x}"),
    }
}

/// Reads the 8-byte payload following a fixed-width tag.
fn decode_fixed(buf: &[u8]) -> Result<u64> {
    if buf.len() < 9 {
        return errdata!("truncated fixed-width value, got {} bytes", buf.len());
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[1..9]);
    Ok(u64::from_be_bytes(bytes))
}

/// Appends bytes with 0x00 escaped as 0x00 0xFF and a 0x00 0x00
/// terminator, preserving lexicographic order across the escape.
fn encode_escaped(buf: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b == 0x00 {
            buf.extend_from_slice(&[0x00, 0xFF]);
        } else {
            buf.push(b);
        }
    }
    buf.extend_from_slice(&[0x00, 0x00]);
}

/// Decodes an escaped byte sequence, returning the unescaped bytes and
/// the encoded length including the terminator.
fn decode_escaped(buf: &[u8]) -> Result<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut pos = 0;
    loop {
        match buf.get(pos) {
            None => return errdata!("unterminated byte sequence"),
            Some(&0x00) => match buf.get(pos + 1) {
                Some(&0x00) => return Ok((out, pos + 2)),
                Some(&0xFF) => {
                    out.push(0x00);
                    pos += 2;
                }
                _ => return errdata!("invalid escape sequence at offset {pos}"),
            },
            Some(&b) => {
                out.push(b);
                pos += 1;
            }
        }
    }
}
