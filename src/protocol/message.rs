//! Well-known message types and error codes spoken by the peripheral firmware.
//!
//! The codec itself never assumes this catalogue; it is one registry an
//! application may choose to install via [`MessageTypeRegistry::standard`].

use crate::core::registry::{MessageTypeEntry, MessageTypeRegistry, PayloadShape};
use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::Result;

/// Standard message-type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Ping = 0x10,
    SubscriptionRequest = 0x11,
    SubscriptionResponse = 0x12,
    DeviceRead = 0x13,
    DeviceWrite = 0x14,
    DeviceData = 0x15,
    Disable = 0x16,
    HeartBeatRequest = 0x17,
    HeartBeatResponse = 0x18,
    Error = 0xFF,
}

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        MessageKind::Ping,
        MessageKind::SubscriptionRequest,
        MessageKind::SubscriptionResponse,
        MessageKind::DeviceRead,
        MessageKind::DeviceWrite,
        MessageKind::DeviceData,
        MessageKind::Disable,
        MessageKind::HeartBeatRequest,
        MessageKind::HeartBeatResponse,
        MessageKind::Error,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Ping => "Ping",
            MessageKind::SubscriptionRequest => "SubscriptionRequest",
            MessageKind::SubscriptionResponse => "SubscriptionResponse",
            MessageKind::DeviceRead => "DeviceRead",
            MessageKind::DeviceWrite => "DeviceWrite",
            MessageKind::DeviceData => "DeviceData",
            MessageKind::Disable => "Disable",
            MessageKind::HeartBeatRequest => "HeartBeatRequest",
            MessageKind::HeartBeatResponse => "HeartBeatResponse",
            MessageKind::Error => "Error",
        }
    }

    /// Payload layout expected by the firmware.
    pub fn shape(self) -> PayloadShape {
        match self {
            MessageKind::Ping | MessageKind::Disable => PayloadShape::Fixed(0),
            // params bitmask (u16) + delay (u16)
            MessageKind::SubscriptionRequest => PayloadShape::Fixed(4),
            // params (u16) + delay (u16) + uid (11)
            MessageKind::SubscriptionResponse => PayloadShape::Fixed(15),
            MessageKind::DeviceRead => PayloadShape::Fixed(2),
            // bitmask followed by parameter values
            MessageKind::DeviceWrite | MessageKind::DeviceData => PayloadShape::Variable {
                min: 2,
                max: MAX_PAYLOAD_SIZE,
            },
            MessageKind::HeartBeatRequest | MessageKind::HeartBeatResponse => {
                PayloadShape::Fixed(1)
            }
            MessageKind::Error => PayloadShape::Fixed(1),
        }
    }

    pub fn entry(self) -> MessageTypeEntry {
        MessageTypeEntry {
            code: self.code(),
            name: self.name().to_string(),
            shape: self.shape(),
        }
    }
}

/// Payload of an `Error` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    UnexpectedDelimiter = 0xFD,
    ChecksumError = 0xFE,
    GenericError = 0xFF,
}

impl ErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0xFD => Some(ErrorCode::UnexpectedDelimiter),
            0xFE => Some(ErrorCode::ChecksumError),
            0xFF => Some(ErrorCode::GenericError),
            _ => None,
        }
    }
}

impl MessageTypeRegistry {
    /// Registry holding the standard firmware catalogue.
    pub fn standard() -> Self {
        // Enum discriminants are distinct, so no code can be registered twice
        Self::from_distinct(MessageKind::ALL.into_iter().map(MessageKind::entry))
    }

    /// Standard catalogue plus application-specific entries.
    pub fn standard_with<I>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = MessageTypeEntry>,
    {
        Self::from_entries(
            MessageKind::ALL
                .into_iter()
                .map(MessageKind::entry)
                .chain(extra),
        )
    }
}
