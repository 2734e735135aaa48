use super::{Key, Namespace, SortOrder};
use crate::encoding::keycode;
use crate::error::Result;

/// A range of keys to iterate on.
///
/// By default, min and max are inclusive. If exclusive is true, min and
/// max are excluded from the results. An absent min means "from the
/// smallest key matching the other bound's type"; an absent max means
/// "to the largest". Partial keys denote prefix ranges.
#[derive(Clone, Debug, Default)]
pub struct Range {
    pub min: Option<Key>,
    pub max: Option<Key>,
    pub exclusive: bool,
}

impl Range {
    /// A range covering every key of the tree.
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a range with the given bounds.
    pub fn new(min: Option<Key>, max: Option<Key>, exclusive: bool) -> Self {
        Self { min, max, exclusive }
    }

    /// The range's direction: that of the last component of min under
    /// the tree's sort order, else the same test on max, else ascending.
    fn is_desc(&self, order: SortOrder) -> bool {
        if let Some(min) = &self.min {
            return min.arity() > 0 && order.is_desc(min.arity() - 1);
        }
        if let Some(max) = &self.max {
            return max.arity() > 0 && order.is_desc(max.arity() - 1);
        }
        false
    }

    /// Synthesizes the encoded byte interval `[start, end)` that covers
    /// exactly this range's keys.
    ///
    /// Descending encodings invert byte order, so for a descending range
    /// the logical min and max swap roles before synthesis. A given
    /// inclusive max widens by a 0xFF suffix to cover every completion
    /// of the prefix; an exclusive min widens the start the same way. An
    /// absent bound synthesizes from the other bound's type sentinels so
    /// that iteration stays inside one type's corridor.
    pub(crate) fn boundaries(
        &self,
        namespace: Namespace,
        order: SortOrder,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let desc = self.is_desc(order);
        let (min, max) = if desc {
            (self.max.as_ref(), self.min.as_ref())
        } else {
            (self.min.as_ref(), self.max.as_ref())
        };

        let start = match min {
            None => min_key_for_type(max, desc, namespace, order)?,
            Some(key) if self.exclusive => encode_with_suffix(key, namespace, order)?,
            Some(key) => key.encode(namespace, order)?,
        };
        let end = match max {
            None => max_key_for_type(min, desc, namespace, order)?,
            Some(key) if self.exclusive => key.encode(namespace, order)?,
            Some(key) => encode_with_suffix(key, namespace, order)?,
        };
        Ok((start, end))
    }
}

/// Encodes a key followed by 0xFF. No type tag is 0xFF, so the result
/// sorts after every completion of the key's prefix but before any key
/// that doesn't share the prefix.
fn encode_with_suffix(key: &Key, namespace: Namespace, order: SortOrder) -> Result<Vec<u8>> {
    let mut buf = key.encode(namespace, order)?;
    buf.push(0xFF);
    Ok(buf)
}

/// The smallest encoded key matching the given bound's prefix and the
/// type of its last component. With no bound, the namespace prefix
/// itself, which is the least key of the namespace.
fn min_key_for_type(
    bound: Option<&Key>,
    desc: bool,
    namespace: Namespace,
    order: SortOrder,
) -> Result<Vec<u8>> {
    let values = bound.map(Key::values).unwrap_or_default();
    let Some(last) = values.last() else {
        return Key::new(vec![]).encode(namespace, order);
    };
    let sentinel = if desc { last.ty().min_enctype_desc() } else { last.ty().min_enctype() };
    let mut buf = Key::new(values[..values.len() - 1].to_vec()).encode(namespace, order)?;
    buf.push(sentinel);
    Ok(buf)
}

/// The largest encoded key matching the given bound's prefix and the
/// type of its last component. With no bound, the namespace prefix
/// followed by 0xFF, which sorts after every key of the namespace.
fn max_key_for_type(
    bound: Option<&Key>,
    desc: bool,
    namespace: Namespace,
    order: SortOrder,
) -> Result<Vec<u8>> {
    let values = bound.map(Key::values).unwrap_or_default();
    let Some(last) = values.last() else {
        let mut buf = Vec::new();
        keycode::encode_u64(&mut buf, namespace);
        buf.push(0xFF);
        return Ok(buf);
    };
    let sentinel = if desc { last.ty().max_enctype_desc() } else { last.ty().max_enctype() };
    let mut buf = Key::new(values[..values.len() - 1].to_vec()).encode(namespace, order)?;
    buf.push(sentinel);
    Ok(buf)
}
