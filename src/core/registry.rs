//! # Message Type Registry
//!
//! Lookup table from message-type code to the payload shape a frame of
//! that type must carry.
//!
//! The registry is configuration data owned by the application: it is
//! built once (in code, from JSON, or from the TOML config), never mutated
//! afterwards, and shared between codec instances behind an `Arc`. Frame
//! decoding consults it after the checksum has been verified.
//!
//! ```rust
//! use hibike_packet::core::registry::{MessageTypeRegistry, PayloadShape};
//!
//! let registry = MessageTypeRegistry::builder()
//!     .register(0x10, "Ping", PayloadShape::Fixed(0))?
//!     .register(0x15, "DeviceData", PayloadShape::Variable { min: 2, max: 255 })?
//!     .build();
//!
//! assert!(registry.check(0x10, 0).is_ok());
//! assert!(registry.check(0x15, 1).is_err());
//! # Ok::<(), hibike_packet::error::ProtocolError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{constants, ProtocolError, Result};

/// Expected payload length for a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    /// Exactly `n` bytes
    Fixed(usize),
    /// Between `min` and `max` bytes, inclusive
    Variable { min: usize, max: usize },
}

impl PayloadShape {
    /// Any length the wire can carry.
    pub const ANY: PayloadShape = PayloadShape::Variable {
        min: 0,
        max: MAX_PAYLOAD_SIZE,
    };

    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            PayloadShape::Fixed(n) => len == n,
            PayloadShape::Variable { min, max } => (min..=max).contains(&len),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            PayloadShape::Fixed(n) if n > MAX_PAYLOAD_SIZE => {
                Err(format!("fixed length {n} exceeds {MAX_PAYLOAD_SIZE}"))
            }
            PayloadShape::Variable { min, max } if min > max => {
                Err(format!("minimum {min} is larger than maximum {max}"))
            }
            PayloadShape::Variable { max, .. } if max > MAX_PAYLOAD_SIZE => {
                Err(format!("maximum {max} exceeds {MAX_PAYLOAD_SIZE}"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Fixed(n) => write!(f, "exactly {n} bytes"),
            PayloadShape::Variable { min, max } => write!(f, "{min}..={max} bytes"),
        }
    }
}

/// One registered message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTypeEntry {
    pub code: u8,
    pub name: String,
    pub shape: PayloadShape,
}

/// Immutable message-type table.
#[derive(Debug, Clone, Default)]
pub struct MessageTypeRegistry {
    entries: HashMap<u8, MessageTypeEntry>,
}

impl MessageTypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build from a list of entries, rejecting duplicates and impossible shapes.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = MessageTypeEntry>,
    {
        entries
            .into_iter()
            .try_fold(Self::builder(), |builder, entry| builder.insert(entry))
            .map(RegistryBuilder::build)
    }

    /// Build from entries whose codes are already known to be distinct,
    /// such as the discriminants of a fieldless enum.
    pub(crate) fn from_distinct(entries: impl IntoIterator<Item = MessageTypeEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.code, e)).collect(),
        }
    }

    /// Build from a JSON array of `{ "code", "name", "shape" }` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<MessageTypeEntry> = serde_json::from_str(json).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })?;
        Self::from_entries(entries)
    }

    pub fn lookup(&self, code: u8) -> Option<&MessageTypeEntry> {
        self.entries.get(&code)
    }

    pub fn contains(&self, code: u8) -> bool {
        self.entries.contains_key(&code)
    }

    /// Validate a decoded payload length against the registered shape.
    pub fn check(&self, code: u8, len: usize) -> Result<&MessageTypeEntry> {
        let entry = self
            .lookup(code)
            .ok_or(ProtocolError::UnknownMessageType(code))?;
        if !entry.shape.accepts(len) {
            return Err(ProtocolError::PayloadShapeMismatch {
                message_type: code,
                length: len,
                shape: entry.shape,
            });
        }
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &MessageTypeEntry> + '_ {
        self.entries.values()
    }

    /// Entries ordered by code.
    pub fn entries(&self) -> Vec<&MessageTypeEntry> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by_key(|e| e.code);
        all
    }
}

/// Collects entries before freezing them into a [`MessageTypeRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<u8, MessageTypeEntry>,
}

impl RegistryBuilder {
    pub fn register(self, code: u8, name: impl Into<String>, shape: PayloadShape) -> Result<Self> {
        self.insert(MessageTypeEntry {
            code,
            name: name.into(),
            shape,
        })
    }

    pub fn insert(mut self, entry: MessageTypeEntry) -> Result<Self> {
        entry.shape.validate().map_err(|reason| {
            ProtocolError::ConfigError(format!(
                "{} for {} ({:#04x}): {reason}",
                constants::ERR_INVALID_SHAPE,
                entry.name,
                entry.code
            ))
        })?;
        if let Some(existing) = self.entries.get(&entry.code) {
            return Err(ProtocolError::ConfigError(format!(
                "{}: {:#04x} ({} and {})",
                constants::ERR_DUPLICATE_MESSAGE_TYPE,
                entry.code,
                existing.name,
                entry.name
            )));
        }
        self.entries.insert(entry.code, entry);
        Ok(self)
    }

    pub fn build(self) -> MessageTypeRegistry {
        MessageTypeRegistry {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn sample() -> MessageTypeRegistry {
        MessageTypeRegistry::builder()
            .register(0x10, "Ping", PayloadShape::Fixed(0))
            .unwrap()
            .register(0x14, "DeviceWrite", PayloadShape::Variable { min: 2, max: 10 })
            .unwrap()
            .build()
    }

    #[test]
    fn test_lookup_and_check() {
        let registry = sample();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(0x10).map(|e| e.name.as_str()), Some("Ping"));
        assert!(registry.check(0x10, 0).is_ok());
        assert!(registry.check(0x14, 2).is_ok());
        assert!(registry.check(0x14, 10).is_ok());
    }

    #[test]
    fn test_check_failures() {
        let registry = sample();
        assert!(matches!(
            registry.check(0x99, 0),
            Err(ProtocolError::UnknownMessageType(0x99))
        ));
        assert!(matches!(
            registry.check(0x10, 1),
            Err(ProtocolError::PayloadShapeMismatch {
                message_type: 0x10,
                length: 1,
                shape: PayloadShape::Fixed(0)
            })
        ));
        assert!(registry.check(0x14, 11).is_err());
        assert!(registry.check(0x14, 1).is_err());
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = MessageTypeRegistry::builder()
            .register(0x10, "Ping", PayloadShape::Fixed(0))
            .and_then(|b| b.register(0x10, "Pong", PayloadShape::Fixed(0)));
        match result {
            Err(ProtocolError::ConfigError(msg)) => assert!(msg.contains("registered twice")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_impossible_shapes_rejected() {
        assert!(MessageTypeRegistry::builder()
            .register(1, "Big", PayloadShape::Fixed(256))
            .is_err());
        assert!(MessageTypeRegistry::builder()
            .register(1, "Inverted", PayloadShape::Variable { min: 5, max: 4 })
            .is_err());
        assert!(MessageTypeRegistry::builder()
            .register(1, "Wide", PayloadShape::Variable { min: 0, max: 300 })
            .is_err());
        assert!(MessageTypeRegistry::builder()
            .register(1, "Any", PayloadShape::ANY)
            .is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"code": 16, "name": "Ping", "shape": {"fixed": 0}},
            {"code": 21, "name": "DeviceData", "shape": {"variable": {"min": 2, "max": 255}}}
        ]"#;
        let registry = MessageTypeRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.check(16, 0).is_ok());
        assert!(registry.check(21, 40).is_ok());
        let codes: Vec<u8> = registry.entries().iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![16, 21]);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            MessageTypeRegistry::from_json("not json"),
            Err(ProtocolError::ConfigError(_))
        ));
    }
}
