//! A minimal table insert path over a tree.
//!
//! Tables store rows keyed by their primary key. The part that belongs
//! to this layer is conflict handling: when an insert collides with an
//! existing primary key or a unique constraint, the configured
//! [`OnConflict`] action decides what happens. Rows are keycode-encoded
//! values, typically [`Value::Row`], so stored payloads always begin
//! with a nonzero type tag and never collide with the tree's
//! empty-value sentinel.

use crate::encoding::keycode;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::tree::{Key, Namespace, SortOrder, Tree};
use crate::value::Value;

/// A conflict handler: invoked with the table, the encoded primary key
/// if one is known, the incoming row, and the error that triggered the
/// conflict. Returns the row that ended up stored, if any.
pub type ConflictFn<S> =
    dyn for<'t> Fn(&Table<'t, S>, Option<&[u8]>, &Value, &Error) -> Result<Option<Value>>;

/// The action taken when an insert conflicts with an existing primary
/// key or unique constraint.
pub enum OnConflict<S: Session> {
    /// Skip the insert and keep the existing row.
    DoNothing,
    /// Replace the existing row with the incoming one. If the conflict
    /// came from a unique constraint rather than the primary key, no
    /// prior key is known and the original error surfaces unchanged.
    DoReplace,
    /// A user-defined handler.
    Custom(Box<ConflictFn<S>>),
}

/// A table of rows stored in a tree, keyed by primary key.
pub struct Table<'a, S: Session> {
    name: String,
    tree: Tree<'a, S>,
}

impl<'a, S: Session> Table<'a, S> {
    /// Creates a table over the given session namespace.
    pub fn new(
        name: impl Into<String>,
        session: &'a S,
        namespace: Namespace,
        order: SortOrder,
    ) -> Self {
        Self { name: name.into(), tree: Tree::new(session, namespace, order) }
    }

    /// The table's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree<'a, S> {
        &self.tree
    }

    /// Inserts a row under its primary key. On a primary-key conflict
    /// the on_conflict action decides the outcome. Returns the row that
    /// ended up stored, or None if the insert was skipped.
    pub fn insert(
        &self,
        key: &Key,
        row: &Value,
        on_conflict: &OnConflict<S>,
    ) -> Result<Option<Value>> {
        let mut payload = Vec::new();
        keycode::encode_value(&mut payload, row);
        match self.tree.insert(key, &payload) {
            Ok(()) => Ok(Some(row.clone())),
            Err(err @ Error::KeyAlreadyExists) => {
                let key_bytes = key.encode(self.tree.namespace(), self.tree.order())?;
                self.resolve_conflict(Some(&key_bytes), row, err, on_conflict)
            }
            Err(err) => Err(err),
        }
    }

    /// Routes a conflict through the given action. key_bytes is the
    /// encoded primary key when known; unique-constraint violations
    /// reported by an index have none.
    pub fn resolve_conflict(
        &self,
        key_bytes: Option<&[u8]>,
        row: &Value,
        err: Error,
        on_conflict: &OnConflict<S>,
    ) -> Result<Option<Value>> {
        match on_conflict {
            OnConflict::DoNothing => Ok(None),
            OnConflict::DoReplace => match key_bytes {
                None => Err(err),
                Some(key_bytes) => self.replace(key_bytes, row).map(Some),
            },
            OnConflict::Custom(f) => f(self, key_bytes, row, &err),
        }
    }

    /// Replaces the row stored under an encoded primary key, failing
    /// with [`Error::KeyNotFound`] if the key doesn't exist.
    pub fn replace(&self, key_bytes: &[u8], row: &Value) -> Result<Value> {
        let key = Key::from_encoded(key_bytes.to_vec());
        if !self.tree.exists(&key)? {
            return Err(Error::KeyNotFound);
        }
        let mut payload = Vec::new();
        keycode::encode_value(&mut payload, row);
        self.tree.put(&key, &payload)?;
        Ok(row.clone())
    }

    /// Returns the row stored under a primary key, or None if absent.
    pub fn get(&self, key: &Key) -> Result<Option<Value>> {
        match self.tree.get(key) {
            Ok(Some(payload)) => {
                let (row, _) = keycode::decode_value(&payload)?;
                Ok(Some(row))
            }
            Ok(None) => Ok(None),
            Err(Error::KeyNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Deletes the row stored under a primary key.
    pub fn delete(&self, key: &Key) -> Result<()> {
        self.tree.delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn row(text: &str) -> Value {
        Value::Row(vec![("v".to_string(), Value::Text(text.to_string()))])
    }

    fn pk(i: i64) -> Key {
        Key::new(vec![Value::Integer(i)])
    }

    #[test]
    fn test_insert_and_get() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        let stored = table.insert(&pk(1), &row("a"), &OnConflict::DoNothing).unwrap();
        assert_eq!(stored, Some(row("a")));
        assert_eq!(table.get(&pk(1)).unwrap(), Some(row("a")));
        assert_eq!(table.get(&pk(2)).unwrap(), None);
    }

    #[test]
    fn test_conflict_do_nothing() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        table.insert(&pk(1), &row("old"), &OnConflict::DoNothing).unwrap();
        let stored = table.insert(&pk(1), &row("new"), &OnConflict::DoNothing).unwrap();
        assert_eq!(stored, None);
        assert_eq!(table.get(&pk(1)).unwrap(), Some(row("old")));
    }

    #[test]
    fn test_conflict_do_replace() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        table.insert(&pk(1), &row("old"), &OnConflict::DoNothing).unwrap();
        let stored = table.insert(&pk(1), &row("new"), &OnConflict::DoReplace).unwrap();
        assert_eq!(stored, Some(row("new")));
        assert_eq!(table.get(&pk(1)).unwrap(), Some(row("new")));
    }

    #[test]
    fn test_replace_requires_prior_key() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        // A unique-constraint conflict carries no primary key; DoReplace
        // must surface the original error unchanged.
        let result = table.resolve_conflict(
            None,
            &row("new"),
            Error::IndexDuplicateValue,
            &OnConflict::DoReplace,
        );
        assert_eq!(result, Err(Error::IndexDuplicateValue));
    }

    #[test]
    fn test_custom_conflict_action() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        table.insert(&pk(1), &row("old"), &OnConflict::DoNothing).unwrap();

        // Keep the existing row but report it back to the caller.
        let keep_existing: OnConflict<Memory> =
            OnConflict::Custom(Box::new(|table, key_bytes, _, _| {
                let key = Key::from_encoded(key_bytes.expect("pk conflict").to_vec());
                table.get(&key)
            }));
        let stored = table.insert(&pk(1), &row("new"), &keep_existing).unwrap();
        assert_eq!(stored, Some(row("old")));
        assert_eq!(table.get(&pk(1)).unwrap(), Some(row("old")));
    }

    #[test]
    fn test_replace_missing_key() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());
        let key_bytes = pk(1).encode(1, SortOrder::default()).unwrap();
        assert_eq!(table.replace(&key_bytes, &row("x")), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_io_errors_bypass_conflict_actions() {
        let session = Memory::new();
        let table = Table::new("items", &session, 1, SortOrder::default());

        // Only conflict errors reach the action; anything else surfaces.
        let key = Key::new(vec![Value::Integer(0); 65]);
        let result = table.insert(&key, &row("x"), &OnConflict::DoReplace);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
