//! # Error Types
//!
//! Error handling for the packet codec.
//!
//! Every failure the codec can report lives in [`ProtocolError`], from
//! primitive field overflows up to frame-level validation failures.
//!
//! ## Error Categories
//! - **Field Errors**: values that do not fit a wire width, short buffers
//! - **Frame Errors**: sync, length, checksum and shape violations
//! - **Registry Errors**: unknown message types
//! - **Ambient Errors**: I/O plumbing and configuration problems
//!
//! Encode-side errors are always returned to the caller. On the decode side
//! the stream decoder turns frame errors into rejection events instead of
//! failing the stream (see [`crate::core::decoder`]).
//!
//! ## Example Usage
//! ```rust
//! use hibike_packet::core::packet::Packet;
//! use hibike_packet::error::ProtocolError;
//!
//! let oversized = vec![0u8; 256];
//! match Packet::new(1, 0x10, oversized) {
//!     Err(ProtocolError::PayloadTooLarge { size, max }) => assert!(size > max),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use crate::core::registry::PayloadShape;
use std::io;
use thiserror::Error;

/// Error message constants shared by configuration and registry loading.
pub mod constants {
    pub const ERR_DUPLICATE_MESSAGE_TYPE: &str = "Message type registered twice";
    pub const ERR_INVALID_SHAPE: &str = "Invalid payload shape";
    pub const ERR_CONFIG_READ: &str = "Failed to read config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse config";
    pub const ERR_LOGGING_INIT: &str = "Failed to initialise logging";
}

// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: u64, bits: u8 },

    #[error("Buffer too short: need {needed} bytes, {available} available")]
    BufferTooShort { needed: usize, available: usize },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Sync marker mismatch: expected {expected:#04x}, found {found:#04x}")]
    SyncMismatch { expected: u8, found: u8 },

    #[error("Incomplete frame: need {needed} bytes, {available} available")]
    IncompleteFrame { needed: usize, available: usize },

    #[error("Checksum mismatch: computed {expected:#04x}, frame carries {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Unknown message type: {0:#04x}")]
    UnknownMessageType(u8),

    #[error("Payload of {length} bytes does not match shape {shape} for message type {message_type:#04x}")]
    PayloadShapeMismatch {
        message_type: u8,
        length: usize,
        shape: PayloadShape,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// True for errors that only mean "more bytes are needed".
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ProtocolError::IncompleteFrame { .. })
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
