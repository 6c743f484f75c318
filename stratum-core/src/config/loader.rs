//! Configuration loading.
//!
//! [`ConfigLoader::load`] reads `config.toml` from the application config
//! directory, falls back to defaults when the file is missing, and validates
//! the result. `load_from_path` and `load_from_str` serve tests and explicit
//! `--config` overrides.

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::utils::fs as stratum_fs;
use crate::utils::paths::{get_app_state_dir, get_config_file_path};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Upper bound for the maximize/restore interpolation.
const MAX_ANIMATION_MS: u64 = 2_000;

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the configuration from the default location.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let path = get_config_file_path()?;
        Self::load_from_path(&path)
    }

    /// Loads from `path`; a missing or empty file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Read configuration file");
                Self::load_from_str(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No configuration file found, using defaults");
                let mut config = CoreConfig::default();
                Self::validate_config(&mut config)?;
                Ok(config)
            }
            Err(e) => Err(CoreError::Config(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })),
        }
    }

    /// Parses and validates TOML content.
    pub fn load_from_str(content: &str) -> Result<CoreConfig, CoreError> {
        let mut config: CoreConfig = if content.trim().is_empty() {
            CoreConfig::default()
        } else {
            toml::from_str(content).map_err(ConfigError::ParseError)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Normalizes string enums and rejects out-of-range values.
    fn validate_config(config: &mut CoreConfig) -> Result<(), CoreError> {
        let level_lower = config.logging.level.to_lowercase();
        match level_lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level_lower,
            _ => {
                return Err(validation(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                )))
            }
        }

        let format_lower = config.logging.format.to_lowercase();
        match format_lower.as_str() {
            "text" | "json" => config.logging.format = format_lower,
            _ => {
                return Err(validation(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                )))
            }
        }

        if let Some(file_path) = &config.logging.file_path {
            let absolute = if file_path.is_absolute() {
                file_path.clone()
            } else {
                get_app_state_dir()?.join(file_path)
            };
            if let Some(parent_dir) = absolute.parent() {
                stratum_fs::ensure_dir_exists(parent_dir)?;
            }
            config.logging.file_path = Some(absolute);
        }

        let deco = &config.decoration;
        if deco.border_width < 0 || deco.title_bar_height < 0 || deco.shadow_inset < 0 {
            return Err(validation(format!(
                "Decoration metrics must be non-negative (border={}, title_bar={}, shadow={}).",
                deco.border_width, deco.title_bar_height, deco.shadow_inset
            )));
        }

        if config.animation.duration_ms > MAX_ANIMATION_MS {
            return Err(validation(format!(
                "Animation duration {}ms exceeds the {}ms limit.",
                config.animation.duration_ms, MAX_ANIMATION_MS
            )));
        }

        if config.limits.max_windows == 0 {
            return Err(validation("limits.max_windows must be at least 1.".to_string()));
        }

        Ok(())
    }
}

fn validation(message: String) -> CoreError {
    CoreError::Config(ConfigError::ValidationError(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_from_str_empty_gives_defaults() {
        let config = ConfigLoader::load_from_str("   ").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn test_load_from_str_normalizes_level() {
        let config = ConfigLoader::load_from_str("[logging]\nlevel = \"DEBUG\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = ConfigLoader::load_from_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_negative_border_rejected() {
        let err = ConfigLoader::load_from_str("[decoration]\nborder_width = -1\n").unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_overlong_animation_rejected() {
        let err = ConfigLoader::load_from_str("[animation]\nduration_ms = 5000\n").unwrap_err();
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_load_from_missing_path_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.idle.system_timeout_secs, 900);
    }

    #[test]
    fn test_load_from_path_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[idle]\ndisplay_timeout_secs = 30\nsystem_timeout_secs = 60").unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.idle.display_timeout_secs, 30);
        assert_eq!(config.idle.system_timeout_secs, 60);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = ConfigLoader::load_from_str("[idle\n").unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::ParseError(_))));
    }
}
