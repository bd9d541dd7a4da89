//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Applications that want
//! them printed can install a subscriber built from [`LoggingConfig`].

use crate::config::LoggingConfig;
use crate::error::{CodecError, Result};
use tracing::info;

/// Install a global fmt subscriber at the configured level
///
/// # Errors
/// `ConfigError` if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed
        .map_err(|e| CodecError::ConfigError(format!("Failed to install log subscriber: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_reported() {
        let config = LoggingConfig::default();
        let first = init(&config);
        let second = init(&config);
        // Another test may have installed a subscriber first.
        assert!(first.is_err() || second.is_err());
        assert!(matches!(second, Err(CodecError::ConfigError(_))));
    }
}
