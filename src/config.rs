//! # Configuration Management
//!
//! Centralized configuration for the segment codec.
//!
//! Everything the engine needs is passed explicitly per call; this module only
//! bundles the defaults the reader and writer facades are built from.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - TOML strings via `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Example
//! ```toml
//! [text]
//! encoding = "utf-8"
//! length_prefix = "compressed"
//! write_threshold = 256
//! max_chars = 16777216
//!
//! [write]
//! segment_size = 4096
//!
//! [logging]
//! app_name = "segment-codec"
//! log_level = "info"
//! json_format = false
//! ```

use crate::core::text::TextEncoding;
use crate::error::{CodecError, Result};
use crate::utils::length::LengthPrefix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Encoded text below this many bytes is written with a single flush
pub const DEFAULT_TEXT_THRESHOLD: usize = 256;

/// Default size of a sink region requested per chunk
pub const DEFAULT_SEGMENT_SIZE: usize = 4096;

/// Demand hint reported by unbounded hashing; not a limit
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Largest declared text length accepted before allocating (16 Mi characters)
pub const MAX_TEXT_CHARS: usize = 16 * 1024 * 1024;

/// Upper bound on the bytes reserved up front for decoded text
pub const MAX_TEXT_PRESIZE: usize = 64 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    /// Text encoding settings
    #[serde(default)]
    pub text: TextConfig,

    /// Write path settings
    #[serde(default)]
    pub write: WriteConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(encoding) = std::env::var("SEGMENT_CODEC_TEXT_ENCODING") {
            config.text.encoding = parse_env_enum("SEGMENT_CODEC_TEXT_ENCODING", &encoding)?;
        }

        if let Ok(format) = std::env::var("SEGMENT_CODEC_LENGTH_PREFIX") {
            config.text.length_prefix = parse_env_enum("SEGMENT_CODEC_LENGTH_PREFIX", &format)?;
        }

        if let Ok(threshold) = std::env::var("SEGMENT_CODEC_WRITE_THRESHOLD") {
            if let Ok(val) = threshold.parse::<usize>() {
                config.text.write_threshold = (val > 0).then_some(val);
            }
        }

        if let Ok(size) = std::env::var("SEGMENT_CODEC_SEGMENT_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.write.segment_size = val;
            }
        }

        if let Ok(level) = std::env::var("SEGMENT_CODEC_LOG_LEVEL") {
            if let Ok(val) = level.parse::<Level>() {
                config.logging.log_level = val;
            }
        }

        Ok(config)
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
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.text.validate());
        errors.extend(self.write.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Reuse the serde names so env values match the TOML spelling
fn parse_env_enum<T: for<'de> Deserialize<'de>>(var: &str, value: &str) -> Result<T> {
    T::deserialize(serde::de::value::StrDeserializer::<serde::de::value::Error>::new(value))
        .map_err(|e| CodecError::ConfigError(format!("Invalid value for {var}: {e}")))
}

/// Text encoding settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextConfig {
    /// Encoding used by the reader and writer text contexts
    pub encoding: TextEncoding,

    /// Length prefix written before and expected ahead of text payloads
    pub length_prefix: LengthPrefix,

    /// Encoded size (bytes) below which text is written in one region;
    /// `None` always writes in chunks
    #[serde(default)]
    pub write_threshold: Option<usize>,

    /// Largest declared character count the reader accepts
    pub max_chars: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            length_prefix: LengthPrefix::Compressed,
            write_threshold: Some(DEFAULT_TEXT_THRESHOLD),
            max_chars: MAX_TEXT_CHARS,
        }
    }
}

impl TextConfig {
    /// Validate text configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_chars == 0 {
            errors.push("Max text characters must be greater than 0".to_string());
        } else if self.max_chars > i32::MAX as usize {
            errors.push(format!(
                "Max text characters too large: {} (maximum: {})",
                self.max_chars,
                i32::MAX
            ));
        }

        if let Some(threshold) = self.write_threshold {
            if threshold == 0 {
                errors.push(
                    "Write threshold of 0 never applies; leave it unset to always chunk"
                        .to_string(),
                );
            } else if threshold > 16 * 1024 * 1024 {
                errors.push(format!(
                    "Write threshold too large: {threshold} bytes (maximum: 16 MB)"
                ));
            }
        }

        errors
    }
}

/// Write path settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WriteConfig {
    /// Size hint for each region requested from a sink
    pub segment_size: usize,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

impl WriteConfig {
    /// Validate write configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Must hold at least one character in every supported encoding
        if self.segment_size < 4 {
            errors.push(format!(
                "Segment size too small: {} bytes (minimum: 4)",
                self.segment_size
            ));
        } else if self.segment_size > 16 * 1024 * 1024 {
            errors.push(format!(
                "Segment size too large: {} bytes (maximum: 16 MB)",
                self.segment_size
            ));
        }

        errors
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

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("segment-codec"),
            log_level: Level::INFO,
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
