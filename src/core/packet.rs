//! # Packet Frame
//!
//! The packet value type and its wire representation.
//!
//! ## Wire Format
//! ```text
//! [Sync(1)] [Length(1)] [DeviceId(1)] [MessageType(1)] [Payload(Length)] [Checksum(1)]
//! ```
//!
//! The checksum covers every byte between the sync marker and the checksum
//! byte itself: length, device id, message type and payload.
//!
//! ## Validation order on decode
//! 1. sync marker
//! 2. declared length against the configured maximum
//! 3. enough bytes for the whole frame
//! 4. checksum
//! 5. message type registered
//! 6. payload length matches the registered shape

use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Arc;

use crate::config::{CHECKSUM_SIZE, DEFAULT_SYNC_BYTE, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use crate::core::checksum;
use crate::core::field;
use crate::core::registry::MessageTypeRegistry;
use crate::error::{ProtocolError, Result};

/// A validated host/peripheral packet.
///
/// Fields are private so that a packet carrying an oversized payload cannot
/// exist. The checksum is derived at encode time and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    device_id: u8,
    message_type: u8,
    payload: Bytes,
}

impl Packet {
    pub fn new(device_id: u8, message_type: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            device_id,
            message_type,
            payload,
        })
    }

    /// Build a packet from wider integer fields.
    ///
    /// Values that do not fit in a wire byte fail with
    /// [`ProtocolError::ValueOutOfRange`] rather than being truncated.
    pub fn from_raw_fields(
        device_id: u64,
        message_type: u64,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        Self::new(
            field::narrow_u8(device_id)?,
            field::narrow_u8(message_type)?,
            payload,
        )
    }

    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    pub fn message_type(&self) -> u8 {
        self.message_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Size of this packet once framed.
    pub fn frame_len(&self) -> usize {
        frame_len(self.payload.len())
    }
}

/// Total encoded size for a payload of `payload_len` bytes.
#[inline]
pub const fn frame_len(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len + CHECKSUM_SIZE
}

/// Header fields of a frame that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u8,
    pub device_id: u8,
    pub message_type: u8,
}

impl FrameHeader {
    pub fn frame_len(&self) -> usize {
        frame_len(self.length as usize)
    }

    /// Packet for the frame this header was validated from, sharing its buffer.
    pub(crate) fn into_packet(self, frame: Bytes) -> Packet {
        Packet {
            device_id: self.device_id,
            message_type: self.message_type,
            payload: frame.slice(HEADER_SIZE..HEADER_SIZE + self.length as usize),
        }
    }
}

/// Frame assembler and validator.
///
/// Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct PacketFrame {
    sync_byte: u8,
    max_payload_size: usize,
    registry: Arc<MessageTypeRegistry>,
}

impl PacketFrame {
    /// Frame with the default sync byte and size limit.
    pub fn new(registry: Arc<MessageTypeRegistry>) -> Self {
        Self {
            sync_byte: DEFAULT_SYNC_BYTE,
            max_payload_size: MAX_PAYLOAD_SIZE,
            registry,
        }
    }

    pub fn with_sync_byte(mut self, sync_byte: u8) -> Self {
        self.sync_byte = sync_byte;
        self
    }

    /// Lower the payload limit. Values above the wire maximum are clamped.
    pub fn with_max_payload(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size.min(MAX_PAYLOAD_SIZE);
        self
    }

    pub fn sync_byte(&self) -> u8 {
        self.sync_byte
    }

    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Largest frame this instance will ever accept.
    pub fn max_frame_len(&self) -> usize {
        frame_len(self.max_payload_size)
    }

    pub fn registry(&self) -> &Arc<MessageTypeRegistry> {
        &self.registry
    }

    /// Encode a packet into a fresh buffer.
    pub fn encode(&self, packet: &Packet) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(packet.frame_len());
        self.encode_into(packet, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the encoded frame to `dst`.
    pub fn encode_into(&self, packet: &Packet, dst: &mut BytesMut) -> Result<()> {
        let len = packet.payload.len();
        if len > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                size: len,
                max: self.max_payload_size,
            });
        }

        let start = dst.len();
        dst.reserve(packet.frame_len());
        dst.put_u8(self.sync_byte);
        dst.put_slice(&field::encode_u8(len as u64)?);
        dst.put_u8(packet.device_id);
        dst.put_u8(packet.message_type);
        field::encode_bytes(dst, &packet.payload);

        let ck = checksum::compute(&dst[start + 1..]);
        dst.put_u8(ck);
        Ok(())
    }

    /// Validate the frame at the start of `bytes` without building a packet.
    ///
    /// Trailing bytes after the frame are ignored.
    pub fn validate(&self, bytes: &[u8]) -> Result<FrameHeader> {
        let (sync, offset) = field::decode_u8(bytes, 0).map_err(|_| incomplete(1, bytes.len()))?;
        if sync != self.sync_byte {
            return Err(ProtocolError::SyncMismatch {
                expected: self.sync_byte,
                found: sync,
            });
        }

        let (length, offset) =
            field::decode_u8(bytes, offset).map_err(|_| incomplete(2, bytes.len()))?;
        if length as usize > self.max_payload_size {
            return Err(ProtocolError::PayloadTooLarge {
                size: length as usize,
                max: self.max_payload_size,
            });
        }

        let total = frame_len(length as usize);
        if bytes.len() < total {
            return Err(incomplete(total, bytes.len()));
        }

        let (device_id, offset) = field::decode_u8(bytes, offset)?;
        let (message_type, offset) = field::decode_u8(bytes, offset)?;
        let (_, offset) = field::decode_bytes(bytes, offset, length as usize)?;
        let (claimed, _) = field::decode_u8(bytes, offset)?;

        let expected = checksum::compute(&bytes[1..offset]);
        if expected != claimed {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: claimed,
            });
        }

        self.registry.check(message_type, length as usize)?;

        Ok(FrameHeader {
            length,
            device_id,
            message_type,
        })
    }

    /// Decode the frame at the start of `bytes`, copying the payload.
    pub fn decode(&self, bytes: &[u8]) -> Result<Packet> {
        let header = self.validate(bytes)?;
        let payload = Bytes::copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + header.length as usize]);
        Ok(Packet {
            device_id: header.device_id,
            message_type: header.message_type,
            payload,
        })
    }

    /// Decode the frame at the start of `bytes`, slicing the payload without copying.
    pub fn decode_bytes(&self, bytes: Bytes) -> Result<Packet> {
        let header = self.validate(&bytes)?;
        Ok(header.into_packet(bytes))
    }
}

#[inline]
fn incomplete(needed: usize, available: usize) -> ProtocolError {
    ProtocolError::IncompleteFrame { needed, available }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::core::registry::PayloadShape;

    fn frame() -> PacketFrame {
        let registry = MessageTypeRegistry::builder()
            .register(0x01, "Test", PayloadShape::ANY)
            .unwrap()
            .register(0x13, "DeviceRead", PayloadShape::Fixed(2))
            .unwrap()
            .build();
        PacketFrame::new(Arc::new(registry))
    }

    #[test]
    fn test_encode_reference_frame() {
        let packet = Packet::new(3, 1, vec![0x01, 0x02]).unwrap();
        let bytes = frame().encode(&packet).unwrap();
        let ck = checksum::compute(&[0x02, 0x03, 0x01, 0x01, 0x02]);
        assert_eq!(&bytes[..], &[0xAA, 0x02, 0x03, 0x01, 0x01, 0x02, ck]);

        let decoded = frame().decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_empty_payload() {
        let packet = Packet::new(7, 1, Bytes::new()).unwrap();
        let bytes = frame().encode(&packet).unwrap();
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[1], 0);
        assert_eq!(frame().decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_packet_rejects_oversized_payload() {
        assert!(Packet::new(1, 1, vec![0u8; 255]).is_ok());
        assert!(matches!(
            Packet::new(1, 1, vec![0u8; 256]),
            Err(ProtocolError::PayloadTooLarge { size: 256, max: 255 })
        ));
    }

    #[test]
    fn test_raw_fields_out_of_range() {
        assert!(Packet::from_raw_fields(255, 1, vec![]).is_ok());
        assert!(matches!(
            Packet::from_raw_fields(256, 1, vec![]),
            Err(ProtocolError::ValueOutOfRange { value: 256, bits: 8 })
        ));
        assert!(matches!(
            Packet::from_raw_fields(1, 0x1FF, vec![]),
            Err(ProtocolError::ValueOutOfRange { value: 0x1FF, .. })
        ));
    }

    #[test]
    fn test_encode_respects_configured_limit() {
        let limited = frame().with_max_payload(4);
        let packet = Packet::new(1, 1, vec![0u8; 5]).unwrap();
        assert!(matches!(
            limited.encode(&packet),
            Err(ProtocolError::PayloadTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn test_decode_sync_mismatch() {
        let mut bytes = frame()
            .encode(&Packet::new(1, 1, vec![9]).unwrap())
            .unwrap()
            .to_vec();
        bytes[0] = 0x55;
        assert!(matches!(
            frame().decode(&bytes),
            Err(ProtocolError::SyncMismatch {
                expected: 0xAA,
                found: 0x55
            })
        ));
    }

    #[test]
    fn test_decode_incomplete() {
        let bytes = frame()
            .encode(&Packet::new(1, 1, vec![1, 2, 3]).unwrap())
            .unwrap();
        for cut in 0..bytes.len() {
            let err = frame().decode(&bytes[..cut]).unwrap_err();
            assert!(err.is_incomplete(), "cut {cut}: {err:?}");
        }
        match frame().decode(&bytes[..4]) {
            Err(ProtocolError::IncompleteFrame { needed, available }) => {
                assert_eq!(needed, 8);
                assert_eq!(available, 4);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut bytes = frame()
            .encode(&Packet::new(1, 1, vec![1, 2, 3]).unwrap())
            .unwrap()
            .to_vec();
        bytes[5] ^= 0x40;
        assert!(matches!(
            frame().decode(&bytes),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_type_after_checksum() {
        let packet = Packet::new(1, 0x42, vec![]).unwrap();
        let bytes = frame().encode(&packet).unwrap();
        assert!(matches!(
            frame().decode(&bytes),
            Err(ProtocolError::UnknownMessageType(0x42))
        ));
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let packet = Packet::new(1, 0x13, vec![1, 2, 3]).unwrap();
        let bytes = frame().encode(&packet).unwrap();
        assert!(matches!(
            frame().decode(&bytes),
            Err(ProtocolError::PayloadShapeMismatch {
                message_type: 0x13,
                length: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_declared_length_over_limit() {
        let limited = frame().with_max_payload(2);
        let bytes = frame()
            .encode(&Packet::new(1, 1, vec![1, 2, 3]).unwrap())
            .unwrap();
        assert!(matches!(
            limited.decode(&bytes),
            Err(ProtocolError::PayloadTooLarge { size: 3, max: 2 })
        ));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let packet = Packet::new(9, 1, vec![5, 6]).unwrap();
        let mut bytes = frame().encode(&packet).unwrap().to_vec();
        bytes.extend_from_slice(&[0xAA, 0x00]);
        assert_eq!(frame().decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_decode_bytes_shares_buffer() {
        let packet = Packet::new(2, 1, vec![7; 32]).unwrap();
        let bytes = frame().encode(&packet).unwrap();
        let base = bytes.as_ptr();
        let decoded = frame().decode_bytes(bytes).unwrap();
        assert_eq!(decoded.payload().as_ptr(), base.wrapping_add(HEADER_SIZE));
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_custom_sync_byte() {
        let custom = frame().with_sync_byte(0x7E);
        let packet = Packet::new(3, 1, vec![0x01, 0x02]).unwrap();
        let bytes = custom.encode(&packet).unwrap();
        assert_eq!(bytes[0], 0x7E);
        assert_eq!(bytes[6], 0x03);
        assert_eq!(custom.decode(&bytes).unwrap(), packet);
        assert!(frame().decode(&bytes).is_err());
    }
}
