//! # Stream Decoder
//!
//! Reassembles packets from a byte stream that may arrive in arbitrary
//! fragments, contain line noise, or carry corrupted frames.
//!
//! Bytes are accumulated in a single `BytesMut`. A small state machine walks
//! the buffer:
//! - `Seeking`: scan for the sync byte, discarding anything before it
//! - `ReadingHeader`: wait for length, device id and message type
//! - `ReadingPayload`: wait for the payload and checksum byte
//! - `Validating`: run full frame validation
//!
//! A frame that fails validation costs exactly one byte (its sync marker),
//! so a sync byte inside the corrupted frame is still considered as the
//! start of the next frame. The same holds for a header that declares more
//! payload than the configured maximum: it is rejected as soon as the
//! length byte arrives, and only its sync byte is dropped.
//!
//! Decoding never blocks and never fails the stream: frame errors are
//! reported as [`DecodeEvent::Rejected`] and processing continues. An
//! incomplete frame simply stays buffered until more bytes arrive.
//!
//! ```rust
//! use std::sync::Arc;
//! use hibike_packet::core::decoder::{DecodeEvent, StreamDecoder};
//! use hibike_packet::core::packet::{Packet, PacketFrame};
//! use hibike_packet::core::registry::{MessageTypeRegistry, PayloadShape};
//!
//! let registry = MessageTypeRegistry::builder()
//!     .register(0x10, "Ping", PayloadShape::Fixed(0))?
//!     .build();
//! let frame = PacketFrame::new(Arc::new(registry));
//! let bytes = frame.encode(&Packet::new(4, 0x10, Vec::new())?)?;
//!
//! let mut decoder = StreamDecoder::new(frame);
//! assert!(decoder.feed(&bytes[..2]).next().is_none());
//! let events: Vec<_> = decoder.feed(&bytes[2..]).collect();
//! assert!(matches!(&events[..], [DecodeEvent::Packet(p)] if p.device_id() == 4));
//! # Ok::<(), hibike_packet::error::ProtocolError>(())
//! ```

use bytes::{Buf, BytesMut};
use std::fmt;
use tracing::{debug, trace};

use crate::config::HEADER_SIZE;
use crate::core::packet::{frame_len, FrameHeader, Packet, PacketFrame};
use crate::core::registry::PayloadShape;
use crate::error::ProtocolError;
use crate::protocol::message::ErrorCode;
use crate::utils::metrics::DecoderStats;

/// Position of the decoder's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Seeking,
    ReadingHeader,
    ReadingPayload { frame_len: usize },
    Validating { frame_len: usize },
}

impl DecoderState {
    pub fn name(&self) -> &'static str {
        match self {
            DecoderState::Seeking => "Seeking",
            DecoderState::ReadingHeader => "ReadingHeader",
            DecoderState::ReadingPayload { .. } => "ReadingPayload",
            DecoderState::Validating { .. } => "Validating",
        }
    }
}

/// Why a candidate frame was thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    ChecksumMismatch { expected: u8, actual: u8 },
    UnknownMessageType(u8),
    PayloadShapeMismatch {
        message_type: u8,
        length: usize,
        shape: PayloadShape,
    },
    PayloadTooLarge { size: usize, max: usize },
    /// Any other validation failure
    Malformed(String),
}

impl RejectReason {
    /// Wire error code to report back to the peripheral.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RejectReason::ChecksumMismatch { .. } => ErrorCode::ChecksumError,
            _ => ErrorCode::GenericError,
        }
    }
}

impl From<ProtocolError> for RejectReason {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::ChecksumMismatch { expected, actual } => {
                RejectReason::ChecksumMismatch { expected, actual }
            }
            ProtocolError::UnknownMessageType(code) => RejectReason::UnknownMessageType(code),
            ProtocolError::PayloadShapeMismatch {
                message_type,
                length,
                shape,
            } => RejectReason::PayloadShapeMismatch {
                message_type,
                length,
                shape,
            },
            ProtocolError::PayloadTooLarge { size, max } => {
                RejectReason::PayloadTooLarge { size, max }
            }
            other => RejectReason::Malformed(other.to_string()),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch ({expected:#04x} != {actual:#04x})")
            }
            RejectReason::UnknownMessageType(code) => write!(f, "unknown message type {code:#04x}"),
            RejectReason::PayloadShapeMismatch {
                message_type,
                length,
                shape,
            } => write!(
                f,
                "payload of {length} bytes does not match {shape} for {message_type:#04x}"
            ),
            RejectReason::PayloadTooLarge { size, max } => {
                write!(f, "declared payload {size} exceeds {max}")
            }
            RejectReason::Malformed(msg) => f.write_str(msg),
        }
    }
}

/// A frame the decoder gave up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRejection {
    pub reason: RejectReason,
    /// Bytes removed from the buffer because of this rejection
    pub discarded: usize,
}

/// Output of the stream decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    Packet(Packet),
    Rejected(FrameRejection),
}

impl DecodeEvent {
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            DecodeEvent::Packet(packet) => Some(packet),
            DecodeEvent::Rejected(_) => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, DecodeEvent::Rejected(_))
    }
}

/// Per-connection incremental decoder.
#[derive(Debug)]
pub struct StreamDecoder {
    frame: PacketFrame,
    buffer: BytesMut,
    state: DecoderState,
    stats: DecoderStats,
}

impl StreamDecoder {
    pub fn new(frame: PacketFrame) -> Self {
        let capacity = frame.max_frame_len() * 2;
        Self {
            frame,
            buffer: BytesMut::with_capacity(capacity),
            state: DecoderState::Seeking,
            stats: DecoderStats::default(),
        }
    }

    /// Append bytes and lazily yield every event they complete.
    ///
    /// Events left unconsumed when the iterator is dropped are produced by
    /// the next call. Bytes fed without consuming the iterator stay buffered:
    ///
    /// ```compile_fail
    /// # #![deny(unused_must_use)]
    /// # use std::sync::Arc;
    /// # use hibike_packet::{MessageTypeRegistry, PacketFrame, StreamDecoder};
    /// let frame = PacketFrame::new(Arc::new(MessageTypeRegistry::standard()));
    /// let mut decoder = StreamDecoder::new(frame);
    /// decoder.feed(&[0xAA, 0x00]);
    /// ```
    #[must_use = "events are only produced when the iterator is consumed"]
    pub fn feed(&mut self, data: &[u8]) -> DecodeEvents<'_> {
        self.extend(data);
        DecodeEvents { decoder: self }
    }

    /// Append bytes and collect every event they complete.
    pub fn push(&mut self, data: &[u8]) -> Vec<DecodeEvent> {
        self.feed(data).collect()
    }

    /// Append bytes without decoding.
    pub fn extend(&mut self, data: &[u8]) {
        self.stats.bytes_fed += data.len() as u64;
        self.buffer.extend_from_slice(data);
    }

    /// Take ownership of already-buffered bytes, avoiding a copy when possible.
    pub(crate) fn absorb(&mut self, data: BytesMut) {
        self.stats.bytes_fed += data.len() as u64;
        if self.buffer.is_empty() {
            self.buffer = data;
        } else {
            self.buffer.unsplit(data);
        }
    }

    /// Advance the state machine until it produces an event or needs more bytes.
    pub fn next_event(&mut self) -> Option<DecodeEvent> {
        loop {
            match self.state {
                DecoderState::Seeking => {
                    let sync = self.frame.sync_byte();
                    match memchr::memchr(sync, &self.buffer) {
                        Some(pos) => {
                            self.discard_noise(pos);
                            self.state = DecoderState::ReadingHeader;
                        }
                        None => {
                            let len = self.buffer.len();
                            self.discard_noise(len);
                            return None;
                        }
                    }
                }
                DecoderState::ReadingHeader => {
                    if self.buffer.len() < 2 {
                        return None;
                    }
                    let declared = self.buffer[1] as usize;
                    let max = self.frame.max_payload_size();
                    if declared > max {
                        // Cannot complete within the maximum frame size
                        return Some(self.reject(
                            RejectReason::PayloadTooLarge {
                                size: declared,
                                max,
                            },
                            1,
                        ));
                    }
                    if self.buffer.len() < HEADER_SIZE {
                        return None;
                    }
                    self.state = DecoderState::ReadingPayload {
                        frame_len: frame_len(declared),
                    };
                }
                DecoderState::ReadingPayload { frame_len } => {
                    if self.buffer.len() < frame_len {
                        return None;
                    }
                    self.state = DecoderState::Validating { frame_len };
                }
                DecoderState::Validating { frame_len } => {
                    return Some(match self.frame.validate(&self.buffer[..frame_len]) {
                        Ok(header) => self.emit(header),
                        Err(err) => self.reject(err.into(), 1),
                    });
                }
            }
        }
    }

    fn emit(&mut self, header: FrameHeader) -> DecodeEvent {
        let bytes = self.buffer.split_to(header.frame_len()).freeze();
        self.state = DecoderState::Seeking;
        self.stats.packets_decoded += 1;
        trace!(
            device_id = header.device_id,
            message_type = header.message_type,
            len = header.length,
            "Packet decoded"
        );
        DecodeEvent::Packet(header.into_packet(bytes))
    }

    fn reject(&mut self, reason: RejectReason, discard: usize) -> DecodeEvent {
        let discard = discard.min(self.buffer.len());
        self.buffer.advance(discard);
        self.state = DecoderState::Seeking;
        self.stats.frames_rejected += 1;
        self.stats.bytes_discarded += discard as u64;
        debug!(%reason, discarded = discard, buffered = self.buffer.len(), "Frame rejected");
        DecodeEvent::Rejected(FrameRejection {
            reason,
            discarded: discard,
        })
    }

    fn discard_noise(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.buffer.advance(count);
        self.stats.noise_bytes += count as u64;
        self.stats.bytes_discarded += count as u64;
        trace!(count, "Discarded bytes before sync marker");
    }

    /// Drop all buffered bytes and return to `Seeking`.
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!(
                dropped = self.buffer.len(),
                state = self.state.name(),
                "Decoder reset"
            );
        }
        self.stats.bytes_discarded += self.buffer.len() as u64;
        self.buffer.clear();
        self.state = DecoderState::Seeking;
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes held but not yet turned into events.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn frame(&self) -> &PacketFrame {
        &self.frame
    }
}

/// Lazy event iterator returned by [`StreamDecoder::feed`].
#[must_use = "events are only produced when the iterator is consumed"]
pub struct DecodeEvents<'a> {
    decoder: &'a mut StreamDecoder,
}

impl Iterator for DecodeEvents<'_> {
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_event()
    }
}
