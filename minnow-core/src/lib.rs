//! Core types and wire framing for Minnow
//!
//! This crate contains the pieces shared by every part of the Minnow project:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - Basic data types like [`Key`], [`Value`], and [`Score`]
//! - The RESP codec in [`resp`]
//!
//! # Example
//!
//! ```
//! use minnow_core::resp::Frame;
//!
//! let reply = Frame::Bulk("bar".to_string());
//! assert_eq!(reply.encode(), b"$3\r\nbar\r\n");
//! ```

pub mod error;
pub mod resp;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
