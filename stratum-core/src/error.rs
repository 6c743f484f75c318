//! Error handling for the Stratum core layer.
//!
//! The main error type is [`CoreError`], which wraps the more specific
//! [`ConfigError`] and [`LoggingError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the Stratum compositor.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while installing or reconfiguring the logger.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Filesystem operations outside of config/log I/O.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Parsed values are out of range or inconsistent.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (e.g. XDG config home) could not be determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging-related operations.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    #[error("Failed to set log filter: {0}")]
    FilterError(String),

    #[error("Logging I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::ErrorKind;

    #[test]
    fn test_core_error_config_variant() {
        let core_err = CoreError::Config(ConfigError::ValidationError("bad timeout".to_string()));
        assert_eq!(
            core_err.to_string(),
            "Configuration Error: Configuration validation failed: bad timeout"
        );
        match core_err.source().and_then(|s| s.downcast_ref::<ConfigError>()) {
            Some(ConfigError::ValidationError(msg)) => assert_eq!(msg, "bad timeout"),
            other => panic!("Incorrect source for CoreError::Config: {:?}", other),
        }
    }

    #[test]
    fn test_core_error_filesystem_variant_keeps_source() {
        let path = PathBuf::from("/tmp/stratum.toml");
        let core_err = CoreError::Filesystem {
            message: "create failed".to_string(),
            path: path.clone(),
            source: io::Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            core_err.to_string(),
            format!("Filesystem Error: create failed (Path: {:?})", path)
        );
        let kind = core_err
            .source()
            .and_then(|s| s.downcast_ref::<io::Error>())
            .map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_config_parse_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("key = = 1").unwrap_err();
        let cfg_err = ConfigError::from(toml_err);
        assert!(cfg_err.to_string().starts_with("Failed to parse configuration file:"));
    }

    #[test]
    fn test_logging_error_wraps_into_core() {
        let core_err: CoreError = LoggingError::FilterError("bogus".to_string()).into();
        assert_eq!(core_err.to_string(), "Logging Error: Failed to set log filter: bogus");
    }
}
