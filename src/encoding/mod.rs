//! Byte encodings for keys and values.
//!
//! Tree keys use the keycode module for order-preserving serialization:
//! encoded keys sort lexicographically in the same order as their typed
//! components, which is what makes range scans over a flat byte store
//! correct. Stored values are opaque to the tree; the table layer encodes
//! rows with keycode as well, since the stored-value wire format reserves
//! a leading 0x00 byte for the empty-value sentinel and keycode tags are
//! never zero.

pub mod format;
pub mod keycode;
