//! # Configuration Management
//!
//! Centralized configuration for the packet codec.
//!
//! This module holds the wire constants and the structured configuration
//! an application uses to build codec instances: sync byte, payload
//! limit, the message-type table, and logging. The checksum algorithm is
//! fixed by the firmware and has no setting.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Environment overrides via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Example
//! ```toml
//! [codec]
//! sync_byte = 170
//! max_payload_size = 255
//! standard_catalogue = true
//!
//! [[codec.message_types]]
//! code = 32
//! name = "Calibrate"
//! shape = { fixed = 3 }
//!
//! [logging]
//! app_name = "hibike-host"
//! log_level = "debug"
//! ```

use crate::core::decoder::StreamDecoder;
use crate::core::packet::PacketFrame;
use crate::core::registry::{MessageTypeEntry, MessageTypeRegistry, PayloadShape};
use crate::error::{constants, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;

/// Default sync marker at the start of every frame
pub const DEFAULT_SYNC_BYTE: u8 = 0xAA;

/// Max payload size carried by the 8-bit length field
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Sync, length, device id and message type
pub const HEADER_SIZE: usize = 4;

/// Trailing checksum byte
pub const CHECKSUM_SIZE: usize = 1;

/// Largest frame the wire format can describe
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CHECKSUM_SIZE;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PacketConfig {
    /// Codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PacketConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_READ))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_READ))
        })?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content).map_err(|e| {
            ProtocolError::ConfigError(format!("{}: {e}", constants::ERR_CONFIG_PARSE))
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `HIBIKE_PACKET_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(sync) = std::env::var("HIBIKE_PACKET_SYNC_BYTE") {
            self.codec.sync_byte = parse_byte(&sync).ok_or_else(|| {
                ProtocolError::ConfigError(format!("Invalid HIBIKE_PACKET_SYNC_BYTE: {sync}"))
            })?;
        }

        if let Ok(max) = std::env::var("HIBIKE_PACKET_MAX_PAYLOAD") {
            self.codec.max_payload_size = max.parse::<usize>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid HIBIKE_PACKET_MAX_PAYLOAD: {max}"))
            })?;
        }

        if let Ok(level) = std::env::var("HIBIKE_PACKET_LOG_LEVEL") {
            self.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid HIBIKE_PACKET_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Accepts decimal (`170`) or hex (`0xAA`) notation.
fn parse_byte(value: &str) -> Option<u8> {
    let value = value.trim();
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => value.parse::<u8>().ok(),
    }
}

/// Codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Byte marking the start of a frame
    pub sync_byte: u8,


    /// Maximum payload size in bytes (at most 255)
    pub max_payload_size: usize,

    /// Start from the standard firmware catalogue
    pub standard_catalogue: bool,

    /// Message types accepted on decode, in addition to the standard catalogue
    #[serde(default)]
    pub message_types: Vec<MessageTypeEntry>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sync_byte: DEFAULT_SYNC_BYTE,
            max_payload_size: MAX_PAYLOAD_SIZE,
            standard_catalogue: true,
            message_types: Vec::new(),
        }
    }
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            errors.push(format!(
                "Max payload size too large: {} bytes (wire maximum: {MAX_PAYLOAD_SIZE})",
                self.max_payload_size
            ));
        }

        if self.sync_byte == 0x00 || self.sync_byte == 0xFF {
            errors.push(format!(
                "WARNING: sync byte {:#04x} is common line noise - resynchronization will be slow",
                self.sync_byte
            ));
        }

        match self.registry() {
            Ok(registry) if registry.is_empty() => {
                errors.push(
                    "No message types configured - every frame will be rejected".to_string(),
                );
            }
            Ok(registry) => {
                for entry in registry.entries() {
                    let shortest = match entry.shape {
                        PayloadShape::Fixed(n) => n,
                        PayloadShape::Variable { min, .. } => min,
                    };
                    if shortest > self.max_payload_size {
                        errors.push(format!(
                            "Message type {} ({:#04x}) can never fit in {} payload bytes",
                            entry.name, entry.code, self.max_payload_size
                        ));
                    }
                }
            }
            Err(e) => errors.push(e.to_string()),
        }

        errors
    }

    /// Build the message-type registry described by this configuration
    pub fn build_registry(&self) -> Result<Arc<MessageTypeRegistry>> {
        self.registry().map(Arc::new)
    }

    fn registry(&self) -> Result<MessageTypeRegistry> {
        let extra = self.message_types.iter().cloned();
        if self.standard_catalogue {
            MessageTypeRegistry::standard_with(extra)
        } else {
            MessageTypeRegistry::from_entries(extra)
        }
    }

    /// Build a frame codec using this configuration and an existing registry
    pub fn frame_with_registry(&self, registry: Arc<MessageTypeRegistry>) -> Result<PacketFrame> {
        if self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::ConfigError(format!(
                "Max payload size too large: {}",
                self.max_payload_size
            )));
        }
        Ok(PacketFrame::new(registry)
            .with_sync_byte(self.sync_byte)
            .with_max_payload(self.max_payload_size))
    }

    /// Build a frame codec from this configuration
    pub fn build_frame(&self) -> Result<PacketFrame> {
        self.frame_with_registry(self.build_registry()?)
    }

    /// Build a stream decoder from this configuration
    pub fn build_decoder(&self) -> Result<StreamDecoder> {
        self.build_frame().map(StreamDecoder::new)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("hibike-packet"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte("170"), Some(0xAA));
        assert_eq!(parse_byte("0xAA"), Some(0xAA));
        assert_eq!(parse_byte(" 0X7e "), Some(0x7E));
        assert_eq!(parse_byte("0x100"), None);
        assert_eq!(parse_byte("sync"), None);
    }

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(MAX_FRAME_SIZE, 260);
        assert_eq!(MAX_PAYLOAD_SIZE, 255);
    }
}
