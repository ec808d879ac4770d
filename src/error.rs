//! Error types for the watcher.
//!
//! Each concern gets its own error enum so callers can tell a bad frame
//! (never fatal) from a dead capture source (fatal to the session).

use thiserror::Error;

/// Errors raised while decoding a single frame.
///
/// These only ever abort the frame that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{layer}: truncated at offset {offset} (need {needed} bytes, have {available})")]
    Truncated {
        layer: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{field}: {length} bytes exceeds capacity of {capacity}")]
    FieldTooLong {
        field: &'static str,
        length: usize,
        capacity: usize,
    },
}

/// Errors raised when constructing an observation buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer capacity must be at least 2 slots, got {0}")]
    CapacityTooSmall(usize),
}

/// Errors from the packet source. Any of these ends the capture session.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("insufficient permissions to capture (try running as root)")]
    InsufficientPermissions,

    #[error("failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("receive failed: {0}")]
    Receive(#[from] std::io::Error),

    #[error("capture thread panicked")]
    WorkerPanicked,
}

/// Errors from an observation sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value for '{key}': {value}")]
    Invalid { key: String, value: String },
}
