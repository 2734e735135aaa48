//! Ordered trees over a byte-level key/value session.
//!
//! A tree is an abstraction over a flat key/value session that
//! manipulates data using high-level composite keys of the typed value
//! lattice. Trees are the basis for tables and indexes: the key is a
//! combination of several values, encoded so that byte order equals the
//! logical order under the tree's per-component sort directions, while
//! the value is an opaque byte payload. A tree doesn't support duplicate
//! keys.
//!
//! Each tree owns a numeric namespace that prefixes its encoded keys,
//! keeping trees over the same session disjoint. The tree holds no
//! mutable state of its own; concurrency and transactionality are
//! whatever the session provides.

mod key;
mod range;
mod sort;

pub use key::{Key, MAX_COMPONENTS};
pub use range::Range;
pub use sort::SortOrder;

use crate::encoding::keycode;
use crate::error::{Error, Result};
use crate::session::{Session, SessionIter};

/// A tree's namespace: a numeric prefix partitioning the flat byte key
/// space into disjoint regions, one per tree.
pub type Namespace = u64;

/// Stored in place of an empty value, so the session never sees a
/// zero-length payload. Reads map it back to "no value".
const EMPTY_VALUE: [u8; 1] = [0x00];

/// An ordered tree of composite typed keys over a key/value session.
pub struct Tree<'a, S: Session> {
    session: &'a S,
    namespace: Namespace,
    order: SortOrder,
}

impl<'a, S: Session> Tree<'a, S> {
    /// Creates a tree over the given session namespace.
    pub fn new(session: &'a S, namespace: Namespace, order: SortOrder) -> Self {
        Self { session, namespace, order }
    }

    /// Creates a transient tree: a scratch tree whose namespace must be
    /// empty at creation, along with a guard that truncates the
    /// namespace when released. Fails with [`Error::NamespaceInUse`] if
    /// the namespace already holds keys.
    pub fn new_transient(
        session: &'a S,
        namespace: Namespace,
        order: SortOrder,
    ) -> Result<(Self, TransientGuard<'a, S>)> {
        let tree = Self::new(session, namespace, order);
        let cursor = tree.cursor(&Range::all(), false)?;
        if cursor.valid() {
            return Err(Error::NamespaceInUse(namespace));
        }
        tracing::debug!(namespace, "created transient tree");
        Ok((tree, TransientGuard { session, namespace }))
    }

    /// The tree's namespace.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The tree's per-component sort order.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Adds a key-value pair to the tree. If the key already exists, it
    /// returns [`Error::KeyAlreadyExists`].
    pub fn insert(&self, key: &Key, value: &[u8]) -> Result<()> {
        let k = key.encode(self.namespace, self.order)?;
        let value = if value.is_empty() { &EMPTY_VALUE[..] } else { value };
        self.session.insert(&k, value)
    }

    /// Adds or replaces a key-value pair in the tree.
    pub fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        let k = key.encode(self.namespace, self.order)?;
        let value = if value.is_empty() { &EMPTY_VALUE[..] } else { value };
        self.session.put(&k, value)
    }

    /// Gets a value from the tree, or [`Error::KeyNotFound`] if the key
    /// doesn't exist. A present key with an empty value yields `None`.
    pub fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        let k = key.encode(self.namespace, self.order)?;
        let v = self.session.get(&k)?;
        if v.is_empty() || v[0] == 0x00 {
            return Ok(None);
        }
        Ok(Some(v))
    }

    /// Returns true if the key exists in the tree.
    pub fn exists(&self, key: &Key) -> Result<bool> {
        let k = key.encode(self.namespace, self.order)?;
        self.session.exists(&k)
    }

    /// Deletes a key from the tree, or [`Error::KeyNotFound`] if the key
    /// doesn't exist.
    pub fn delete(&self, key: &Key) -> Result<()> {
        let k = key.encode(self.namespace, self.order)?;
        self.session.delete(&k)
    }

    /// Deletes every key in the tree's namespace.
    pub fn truncate(&self) -> Result<()> {
        tracing::debug!(namespace = self.namespace, "truncating tree");
        truncate_namespace(self.session, self.namespace)
    }

    /// Opens a cursor over the keys in the given range, positioned on
    /// the first key (or the last, when reverse). Dropping the cursor
    /// releases the session iterator.
    pub fn cursor(&self, range: &Range, reverse: bool) -> Result<Cursor<S::Iter<'a>>> {
        let (start, end) = range.boundaries(self.namespace, self.order)?;
        let iter = self.session.iterator(&start, &end)?;
        Ok(Cursor::new(iter, reverse))
    }

    /// Iterates over all keys in the given range, invoking the callback
    /// with each key and its value. The key carries its raw encoded form
    /// and decodes on demand. A callback error aborts the iteration and
    /// is returned.
    pub fn iterate_on_range<F>(&self, range: &Range, reverse: bool, mut f: F) -> Result<()>
    where
        F: FnMut(&Key, Option<&[u8]>) -> Result<()>,
    {
        let mut cursor = self.cursor(range, reverse)?;
        while cursor.valid() {
            let key = cursor.key();
            let value = cursor.value()?;
            f(&key, value.as_deref())?;
            cursor.advance();
        }
        cursor.status()
    }
}

/// Deletes every key of the namespace via the canonical successor bound
/// `[encode_u64(ns), encode_u64(ns + 1))`.
fn truncate_namespace<S: Session>(session: &S, namespace: Namespace) -> Result<()> {
    let mut lower = Vec::new();
    keycode::encode_u64(&mut lower, namespace);
    let mut upper = Vec::new();
    keycode::encode_u64(&mut upper, namespace + 1);
    session.delete_range(&lower, &upper)
}

/// A positioned cursor over a tree range.
///
/// Keys are delivered in strictly increasing encoded-byte order, or
/// strictly decreasing when reversed.
pub struct Cursor<I: SessionIter> {
    iter: I,
    reverse: bool,
}

impl<I: SessionIter> Cursor<I> {
    fn new(mut iter: I, reverse: bool) -> Self {
        if reverse {
            iter.last();
        } else {
            iter.first();
        }
        Self { iter, reverse }
    }

    /// Returns true while positioned on a key.
    pub fn valid(&self) -> bool {
        self.iter.valid()
    }

    /// The current key, carrying its raw encoded form.
    pub fn key(&self) -> Key {
        Key::from_encoded(self.iter.key().to_vec())
    }

    /// The current value, with the empty-value sentinel mapped to `None`.
    pub fn value(&self) -> Result<Option<Vec<u8>>> {
        let v = self.iter.value()?;
        if v.is_empty() || v[0] == 0x00 {
            return Ok(None);
        }
        Ok(Some(v))
    }

    /// Moves to the next key in iteration order, returning false at the
    /// end of the range.
    pub fn advance(&mut self) -> bool {
        if self.reverse {
            self.iter.prev()
        } else {
            self.iter.next()
        }
    }

    /// The underlying iterator's terminal error, if any.
    pub fn status(&self) -> Result<()> {
        self.iter.status()
    }
}

/// Cleanup handle for a transient tree. Releasing it truncates the
/// namespace; consuming self makes release happen at most once.
#[must_use = "dropping the guard without releasing leaves the transient namespace behind"]
pub struct TransientGuard<'a, S: Session> {
    session: &'a S,
    namespace: Namespace,
}

impl<S: Session> TransientGuard<'_, S> {
    /// Truncates the transient tree's namespace.
    pub fn release(self) -> Result<()> {
        tracing::debug!(namespace = self.namespace, "releasing transient tree");
        truncate_namespace(self.session, self.namespace)
    }
}
