use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::encoding::keycode;

/// A typed datum of the tree's type lattice. Values are the components of
/// composite tree keys and the payloads of table rows.
///
/// The lattice is totally ordered by type: Null < Boolean < Integer <
/// Double < Timestamp < Text < Blob < Array < Row. Within a type, values
/// order by their natural comparison. The keycode encoding preserves both
/// orderings byte-wise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The null value. Sorts before all non-null values in ascending
    /// encodings and after them in descending encodings.
    Null,
    /// A boolean, false before true.
    Boolean(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A 64-bit IEEE 754 float.
    Double(f64),
    /// A timestamp as microseconds since the Unix epoch.
    Timestamp(i64),
    /// A UTF-8 string.
    Text(String),
    /// An arbitrary byte string.
    Blob(Vec<u8>),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// An ordered list of named fields.
    Row(Vec<(String, Value)>),
}

impl Value {
    /// Returns the type of the value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(_) => Type::Integer,
            Value::Double(_) => Type::Double,
            Value::Timestamp(_) => Type::Timestamp,
            Value::Text(_) => Type::Text,
            Value::Blob(_) => Type::Blob,
            Value::Array(_) => Type::Array,
            Value::Row(_) => Type::Row,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Timestamp(us) => write!(f, "timestamp({us})"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Blob(b) => write!(f, "x{b:02x?}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Row(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The type of a value.
///
/// Each type owns a corridor of the keycode tag alphabet, delimited by
/// sentinel tags that compare strictly below and above every encoded value
/// of the type. Boundary synthesis uses the sentinels to build open range
/// bounds that stay inside a single type's corridor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Null,
    Boolean,
    Integer,
    Double,
    Timestamp,
    Text,
    Blob,
    Array,
    Row,
}

impl Type {
    /// A tag that sorts strictly below every ascending encoding of this type.
    pub fn min_enctype(&self) -> u8 {
        match self {
            Type::Null => keycode::NULL_MIN,
            Type::Boolean => keycode::BOOLEAN_MIN,
            Type::Integer => keycode::INTEGER_MIN,
            Type::Double => keycode::DOUBLE_MIN,
            Type::Timestamp => keycode::TIMESTAMP_MIN,
            Type::Text => keycode::TEXT_MIN,
            Type::Blob => keycode::BLOB_MIN,
            Type::Array => keycode::ARRAY_MIN,
            Type::Row => keycode::ROW_MIN,
        }
    }

    /// A tag that sorts strictly above every ascending encoding of this type.
    pub fn max_enctype(&self) -> u8 {
        match self {
            Type::Null => keycode::NULL_MAX,
            Type::Boolean => keycode::BOOLEAN_MAX,
            Type::Integer => keycode::INTEGER_MAX,
            Type::Double => keycode::DOUBLE_MAX,
            Type::Timestamp => keycode::TIMESTAMP_MAX,
            Type::Text => keycode::TEXT_MAX,
            Type::Blob => keycode::BLOB_MAX,
            Type::Array => keycode::ARRAY_MAX,
            Type::Row => keycode::ROW_MAX,
        }
    }

    /// A tag that sorts strictly below every descending encoding of this
    /// type. Descending encodings are bitwise complements of ascending
    /// ones, so this is the complement of the ascending max sentinel.
    pub fn min_enctype_desc(&self) -> u8 {
        !self.max_enctype()
    }

    /// A tag that sorts strictly above every descending encoding of this type.
    pub fn max_enctype_desc(&self) -> u8 {
        !self.min_enctype()
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Type::Null => write!(f, "null"),
            Type::Boolean => write!(f, "boolean"),
            Type::Integer => write!(f, "integer"),
            Type::Double => write!(f, "double"),
            Type::Timestamp => write!(f, "timestamp"),
            Type::Text => write!(f, "text"),
            Type::Blob => write!(f, "blob"),
            Type::Array => write!(f, "array"),
            Type::Row => write!(f, "row"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_tags_bracket_value_tags() {
        let types = [
            Type::Null,
            Type::Boolean,
            Type::Integer,
            Type::Double,
            Type::Timestamp,
            Type::Text,
            Type::Blob,
            Type::Array,
            Type::Row,
        ];

        for t in types {
            assert!(t.min_enctype() < t.max_enctype(), "{t} ascending sentinels");
            assert!(
                t.min_enctype_desc() < t.max_enctype_desc(),
                "{t} descending sentinels"
            );
        }

        // Type corridors must not overlap, in lattice order.
        for pair in types.windows(2) {
            assert!(pair[0].max_enctype() < pair[1].min_enctype());
            // Descending corridors sit in reversed order.
            assert!(pair[1].max_enctype_desc() < pair[0].min_enctype_desc());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Text("a\"b".into()).to_string(), "\"a\\\"b\"");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Boolean(true)]).to_string(),
            "[1, true]"
        );
        assert_eq!(
            Value::Row(vec![("id".into(), Value::Integer(7))]).to_string(),
            "{id: 7}"
        );
    }
}
