//! Formats encoded tree keys and values for logs, debugging, and test
//! assertions.

use itertools::Itertools as _;

use super::keycode;

/// Formats encoded tree keys as their namespace and typed components,
/// and stored values through the empty-value sentinel rule. Bytes that
/// don't decode as tree data fall back to escaped ASCII.
pub struct TreeKeys;

impl TreeKeys {
    /// Formats an encoded tree key, e.g. `10/(1, "a")`.
    pub fn key(key: &[u8]) -> String {
        let Ok((ns, mut pos)) = keycode::decode_u64(key) else {
            return Self::raw(key);
        };
        let mut components = Vec::new();
        while pos < key.len() {
            match keycode::decode_value(&key[pos..]) {
                Ok((value, n)) => {
                    components.push(value.to_string());
                    pos += n;
                }
                Err(_) => return Self::raw(key),
            }
        }
        format!("{ns}/({})", components.iter().join(", "))
    }

    /// Formats a stored value. The empty-value sentinel renders as None;
    /// payloads that hold a single encoded value decode.
    pub fn value(value: &[u8]) -> String {
        if value.is_empty() || value[0] == 0x00 {
            return "None".to_string();
        }
        match keycode::decode_value(value) {
            Ok((decoded, n)) if n == value.len() => decoded.to_string(),
            _ => Self::raw(value),
        }
    }

    /// Formats a key/value pair, where the value may not exist.
    pub fn key_maybe_value(key: &[u8], value: Option<&[u8]>) -> String {
        let fmtkey = Self::key(key);
        let fmtvalue = value.map_or("None".to_string(), Self::value);
        format!("{fmtkey} → {fmtvalue}")
    }

    /// Escaped-ASCII rendering for bytes that don't decode as tree data.
    fn raw(bytes: &[u8]) -> String {
        let escaped = bytes
            .iter()
            .copied()
            .flat_map(std::ascii::escape_default)
            .collect_vec();
        format!("\"{}\"", String::from_utf8_lossy(&escaped))
    }
}
