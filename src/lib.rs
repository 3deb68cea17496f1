//! # hibike-packet
//!
//! Binary packet codec for host-to-peripheral messaging over a serial-style
//! byte stream.
//!
//! The crate frames packets, validates them with a single-byte checksum and
//! a message-type registry, and reassembles them from a byte stream that may
//! be fragmented, noisy or corrupted. The transport is the caller's: bytes go
//! in through [`StreamDecoder::feed`] and come out of [`PacketFrame::encode`].
//!
//! ## Modules
//! - [`core`]: field codec, checksum, registry, packet frame, stream decoder,
//!   tokio codec adapter
//! - [`protocol`]: standard message catalogue and error codes
//! - [`config`]: wire constants and TOML/env configuration
//! - [`error`]: the crate error type
//! - [`utils`]: logging setup and decoder statistics
//!
//! ## Quick Start
//! ```rust
//! use std::sync::Arc;
//! use hibike_packet::{DecodeEvent, MessageTypeRegistry, Packet, PacketFrame, StreamDecoder};
//!
//! let frame = PacketFrame::new(Arc::new(MessageTypeRegistry::standard()));
//! let bytes = frame.encode(&Packet::new(3, 0x13, vec![0x01, 0x00])?)?;
//!
//! let mut decoder = StreamDecoder::new(frame);
//! for event in decoder.feed(&bytes) {
//!     if let DecodeEvent::Packet(packet) = event {
//!         assert_eq!(packet.device_id(), 3);
//!     }
//! }
//! # Ok::<(), hibike_packet::ProtocolError>(())
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::codec::PacketCodec;
pub use crate::core::decoder::{DecodeEvent, FrameRejection, RejectReason, StreamDecoder};
pub use crate::core::packet::{Packet, PacketFrame};
pub use crate::core::registry::{MessageTypeEntry, MessageTypeRegistry, PayloadShape};
pub use crate::error::{ProtocolError, Result};
