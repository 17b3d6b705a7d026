//! Core types used throughout Minnow
//!
//! The keyspace is a flat namespace of text keys. Keys, members and string
//! values are UTF-8 text; sorted-set scores are IEEE-754 doubles.

/// A key in the keyspace
pub type Key = String;

/// A string value stored under a key
pub type Value = String;

/// A sorted-set score
pub type Score = f64;

/// An absolute expiration deadline, milliseconds since the Unix epoch
pub type DeadlineMs = u64;
