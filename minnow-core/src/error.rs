//! Error types for Minnow
//!
//! This module defines the error types used throughout Minnow.

use thiserror::Error;

/// The main error type for Minnow operations
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred on a socket or the listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RESP framing was received
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server configuration is unusable
    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for Minnow operations
pub type Result<T> = std::result::Result<T, Error>;
