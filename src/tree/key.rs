use super::{Namespace, SortOrder};
use crate::encoding::keycode;
use crate::error::Result;
use crate::value::Value;
use crate::{errdata, errinput};

/// The maximum number of components in a key, set by the 64-bit sort
/// order mask.
pub const MAX_COMPONENTS: usize = 64;

/// A composite tree key: an ordered tuple of typed values.
///
/// A key encodes to the tree's namespace prefix followed by each
/// component under its direction bit. Keys produced by iteration carry
/// only their encoded form and decode lazily; keys built from values
/// cache their encoding on first use. Two keys over the same namespace
/// and sort order are equal iff their encoded forms are byte-equal.
#[derive(Clone, Debug)]
pub struct Key {
    values: Vec<Value>,
    encoded: Option<Vec<u8>>,
}

impl Key {
    /// Creates a key from typed components. An empty key encodes to just
    /// the namespace prefix and is the least key of its namespace.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, encoded: None }
    }

    /// Creates a key from an already-encoded form, e.g. an iterator
    /// position. The components decode on demand via [`Key::decode`].
    pub fn from_encoded(encoded: Vec<u8>) -> Self {
        Self { values: Vec::new(), encoded: Some(encoded) }
    }

    /// The key's typed components. Empty for keys built from encoded
    /// bytes that haven't been decoded.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The number of components.
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// The cached encoded form, if any.
    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    /// Encodes the key under the given namespace and sort order. Returns
    /// the cached form when the key already carries one.
    pub fn encode(&self, namespace: Namespace, order: SortOrder) -> Result<Vec<u8>> {
        if let Some(encoded) = &self.encoded {
            return Ok(encoded.clone());
        }
        if self.values.len() > MAX_COMPONENTS {
            return errinput!(
                "keys support at most {MAX_COMPONENTS} components, got {}",
                self.values.len()
            );
        }
        let mut buf = Vec::with_capacity(16);
        keycode::encode_u64(&mut buf, namespace);
        for (i, value) in self.values.iter().enumerate() {
            if order.is_desc(i) {
                keycode::encode_value_desc(&mut buf, value);
            } else {
                keycode::encode_value(&mut buf, value);
            }
        }
        Ok(buf)
    }

    /// Decodes the key's components from its encoded form, checking each
    /// component's direction against the sort order. The inverse of
    /// [`Key::encode`].
    pub fn decode(&self, order: SortOrder) -> Result<Vec<Value>> {
        if !self.values.is_empty() {
            return Ok(self.values.clone());
        }
        let Some(encoded) = &self.encoded else {
            return Ok(Vec::new());
        };
        let (_, mut pos) = keycode::decode_u64(encoded)?;
        let mut values = Vec::new();
        while pos < encoded.len() {
            if values.len() >= MAX_COMPONENTS {
                return errdata!("encoded key exceeds {MAX_COMPONENTS} components");
            }
            let desc = keycode::is_desc_tag(encoded[pos]);
            if desc != order.is_desc(values.len()) {
                return errdata!("component {} direction does not match sort order", values.len());
            }
            let (value, n) = keycode::decode_value(&encoded[pos..])?;
            values.push(value);
            pos += n;
        }
        Ok(values)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (&self.encoded, &other.encoded) {
            (Some(a), Some(b)) => a == b,
            _ => self.values == other.values,
        }
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_roundtrip() {
        let orders = [
            SortOrder::default(),
            SortOrder::default().set_desc(0),
            SortOrder::default().set_desc(1),
            SortOrder::default().set_desc(0).set_desc(1).set_desc(2),
        ];
        let key = Key::new(vec![
            Value::Integer(42),
            Value::Text("alder".into()),
            Value::Array(vec![Value::Null, Value::Boolean(true)]),
        ]);

        for order in orders {
            let encoded = key.encode(7, order).unwrap();
            let decoded = Key::from_encoded(encoded).decode(order).unwrap();
            assert_eq!(decoded, key.values());
        }
    }

    #[test]
    fn test_empty_key_is_namespace_prefix() {
        let key = Key::new(vec![]);
        let encoded = key.encode(7, SortOrder::default()).unwrap();

        let mut prefix = Vec::new();
        keycode::encode_u64(&mut prefix, 7);
        assert_eq!(encoded, prefix);

        // Every non-empty key of the namespace sorts after the empty key.
        let other = Key::new(vec![Value::Null]);
        assert!(encoded < other.encode(7, SortOrder::default()).unwrap());
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let order = SortOrder::default();
        let big = Key::new(vec![Value::Blob(vec![0xFE; 32])]);
        let small = Key::new(vec![Value::Null]);
        // The largest key of namespace 7 sorts before the smallest of 8.
        assert!(big.encode(7, order).unwrap() < small.encode(8, order).unwrap());
    }

    #[test]
    fn test_too_many_components() {
        let key = Key::new(vec![Value::Integer(0); 65]);
        assert!(matches!(
            key.encode(1, SortOrder::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_decode_checks_direction() {
        let key = Key::new(vec![Value::Integer(1)]);
        let encoded = key.encode(1, SortOrder::default()).unwrap();
        // Decoding an ascending key with a descending mask is corruption.
        let result = Key::from_encoded(encoded).decode(SortOrder::default().set_desc(0));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_encoded_form_is_cached() {
        let key = Key::new(vec![Value::Integer(1)]);
        let encoded = key.encode(1, SortOrder::default()).unwrap();
        let carried = Key::from_encoded(encoded.clone());
        // A key carrying encoded bytes returns them regardless of context.
        assert_eq!(carried.encode(99, SortOrder::default()).unwrap(), encoded);
    }
}
