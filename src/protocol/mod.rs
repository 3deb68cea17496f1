//! # Protocol Catalogue
//!
//! Message types and error codes defined by the peripheral firmware.

pub mod message;

pub use message::{ErrorCode, MessageKind};
