//! String keyspace with a time-to-live side-table
//!
//! The [`Dict`] maps keys to string values and keeps an expiration table
//! beside the value map. Expired keys are collapsed lazily on read; the
//! active sweeper walks the expiration table between requests.
//!
//! # Example
//!
//! ```
//! use minnow_store::dict::Dict;
//!
//! let mut dict = Dict::new();
//! dict.set("user:1", "Alice".to_string(), -1);
//! assert_eq!(dict.get("user:1"), Some("Alice"));
//! assert_eq!(dict.expiry("user:1"), None);
//! ```

use minnow_core::{DeadlineMs, Key, Value};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as u64
}

/// The string keyspace: a value map plus an expiration table
///
/// Invariant: a key removed from the value map is removed from the
/// expiration table in the same operation.
#[derive(Default)]
pub struct Dict {
    store: HashMap<Key, Value>,
    expires: HashMap<Key, DeadlineMs>,
}

impl Dict {
    /// Creates an empty keyspace
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            expires: HashMap::new(),
        }
    }

    /// Stores `value` under `key`
    ///
    /// A positive `ttl_ms` rewrites the key's deadline to now + `ttl_ms`,
    /// replacing any earlier deadline. A non-positive `ttl_ms` means no
    /// expiration and leaves the expiration table untouched.
    pub fn set(&mut self, key: &str, value: Value, ttl_ms: i64) {
        if ttl_ms > 0 {
            self.expires
                .insert(key.to_string(), now_ms() + ttl_ms as u64);
        }
        self.store.insert(key.to_string(), value);
    }

    /// Reads the value under `key`, collapsing it first if its deadline has
    /// passed
    pub fn get(&mut self, key: &str) -> Option<&str> {
        if self.has_expired(key) {
            self.remove(key);
            return None;
        }
        self.store.get(key).map(Value::as_str)
    }

    /// Removes `key` from the value map and the expiration table
    ///
    /// Returns false when the key was absent.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.store.remove(key).is_some() {
            self.expires.remove(key);
            return true;
        }
        false
    }

    /// Returns true when `key` carries a deadline that has passed
    pub fn has_expired(&self, key: &str) -> bool {
        match self.expires.get(key) {
            Some(&deadline) => deadline <= now_ms(),
            None => false,
        }
    }

    /// The key's absolute deadline, if one is set
    pub fn expiry(&self, key: &str) -> Option<DeadlineMs> {
        self.expires.get(key).copied()
    }

    /// The expiration table, for the active sweeper
    pub fn expires(&self) -> &HashMap<Key, DeadlineMs> {
        &self.expires
    }

    /// Number of keys in the value map
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true when the value map is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
