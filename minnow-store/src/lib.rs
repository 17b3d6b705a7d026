//! In-memory data structures for Minnow
//!
//! This crate implements the typed stores behind the command surface:
//!
//! - **Dict**: the string keyspace with its expiration side-table
//! - **SimpleSet**: unordered unique-string sets
//! - **SortedSet**: score/member pairs over a span-tracking skip list
//!
//! Everything here assumes exclusive access; the server owns the stores on a
//! single thread and no locking is involved.

pub mod dict;
pub mod simple_set;
pub mod skip_list;
pub mod sorted_set;

pub use dict::{now_ms, Dict};
pub use simple_set::SimpleSet;
pub use skip_list::SkipList;
pub use sorted_set::SortedSet;
