//! # Core Codec Components
//!
//! Low-level field encoding, checksums, packet framing and stream
//! reassembly.
//!
//! ## Components
//! - **Field**: little-endian fixed-width integers and raw bytes
//! - **Checksum**: single-byte frame checksum
//! - **Registry**: message-type code to payload shape
//! - **Packet**: packet value type and frame assembly/validation
//! - **Decoder**: resynchronizing stream reassembler
//! - **Codec**: `tokio_util` codec over the decoder and frame
//!
//! ## Wire Format
//! ```text
//! [Sync(1)] [Length(1)] [DeviceId(1)] [MessageType(1)] [Payload(N)] [Checksum(1)]
//! ```
//!
//! ## Limits
//! - Maximum payload: 255 bytes (8-bit length field)
//! - Maximum frame: 260 bytes
//! - Length validated before any payload is buffered

pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod field;
pub mod packet;
pub mod registry;
