//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use segment_codec::config::{CodecConfig, LoggingConfig, TextConfig, WriteConfig};
use segment_codec::core::text::TextEncoding;
use segment_codec::utils::length::LengthPrefix;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = CodecConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_zero_max_chars() {
    let mut config = CodecConfig::default();
    config.text.max_chars = 0;

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .any(|e| e.contains("Max text characters must be greater than 0")));
}

#[test]
fn test_excessive_max_chars() {
    let text = TextConfig {
        max_chars: i32::MAX as usize + 1,
        ..TextConfig::default()
    };
    let errors = text.validate();
    assert!(errors.iter().any(|e| e.contains("Max text characters too large")));
}

#[test]
fn test_zero_write_threshold() {
    let mut config = CodecConfig::default();
    config.text.write_threshold = Some(0);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Write threshold of 0")));
}

#[test]
fn test_unset_write_threshold_is_valid() {
    let mut config = CodecConfig::default();
    config.text.write_threshold = None;
    assert!(config.validate().is_empty());
}

#[test]
fn test_tiny_segment_size() {
    let write = WriteConfig { segment_size: 2 };
    let errors = write.validate();
    assert!(errors.iter().any(|e| e.contains("Segment size too small")));
}

#[test]
fn test_huge_segment_size() {
    let write = WriteConfig {
        segment_size: 64 * 1024 * 1024,
    };
    let errors = write.validate();
    assert!(errors.iter().any(|e| e.contains("Segment size too large")));
}

#[test]
fn test_empty_app_name() {
    let logging = LoggingConfig {
        app_name: String::new(),
        log_level: Level::DEBUG,
        json_format: false,
    };
    let errors = logging.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_validate_strict_collects_everything() {
    let mut config = CodecConfig::default();
    config.text.max_chars = 0;
    config.write.segment_size = 1;

    let err = config.validate_strict().expect_err("should fail");
    let msg = err.to_string();
    assert!(msg.contains("Max text characters"));
    assert!(msg.contains("Segment size too small"));
}

#[test]
fn test_toml_roundtrip() {
    let config = CodecConfig::default_with_overrides(|c| {
        c.text.encoding = TextEncoding::Utf16Be;
        c.text.length_prefix = LengthPrefix::PlainLittleEndian;
        c.text.write_threshold = Some(1024);
        c.logging.log_level = Level::WARN;
    });

    let dir = std::env::temp_dir().join(format!("segment-codec-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("codec.toml");
    config.save_to_file(&path).expect("save");

    let loaded = CodecConfig::from_file(&path).expect("load");
    assert_eq!(loaded.text.encoding, TextEncoding::Utf16Be);
    assert_eq!(loaded.text.length_prefix, LengthPrefix::PlainLittleEndian);
    assert_eq!(loaded.text.write_threshold, Some(1024));
    assert_eq!(loaded.logging.log_level, Level::WARN);

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = CodecConfig::from_toml(
        r#"
        [text]
        encoding = "utf-16le"
        length_prefix = "plain_big_endian"
        max_chars = 100
        "#,
    )
    .expect("parse");
    assert_eq!(config.text.encoding, TextEncoding::Utf16Le);
    assert_eq!(config.text.length_prefix, LengthPrefix::PlainBigEndian);
    assert_eq!(config.text.write_threshold, None);
    assert_eq!(config.write.segment_size, WriteConfig::default().segment_size);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = CodecConfig::from_toml("[text]\nencoding = \"ebcdic\"");
    assert!(result.is_err());
}

#[test]
fn test_example_config_parses() {
    let example = CodecConfig::example_config();
    let parsed = CodecConfig::from_toml(&example).expect("example should parse");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_env_overrides() {
    std::env::set_var("SEGMENT_CODEC_TEXT_ENCODING", "latin-1");
    std::env::set_var("SEGMENT_CODEC_LENGTH_PREFIX", "plain");
    std::env::set_var("SEGMENT_CODEC_WRITE_THRESHOLD", "0");
    std::env::set_var("SEGMENT_CODEC_SEGMENT_SIZE", "512");

    let config = CodecConfig::from_env().expect("env config");
    assert_eq!(config.text.encoding, TextEncoding::Latin1);
    assert_eq!(config.text.length_prefix, LengthPrefix::Plain);
    assert_eq!(config.text.write_threshold, None);
    assert_eq!(config.write.segment_size, 512);

    std::env::set_var("SEGMENT_CODEC_LENGTH_PREFIX", "sideways");
    assert!(CodecConfig::from_env().is_err());

    for var in [
        "SEGMENT_CODEC_TEXT_ENCODING",
        "SEGMENT_CODEC_LENGTH_PREFIX",
        "SEGMENT_CODEC_WRITE_THRESHOLD",
        "SEGMENT_CODEC_SEGMENT_SIZE",
    ] {
        std::env::remove_var(var);
    }
}
