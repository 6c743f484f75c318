//! Configuration data structures.
//!
//! Every struct uses `serde` defaults from [`super::defaults`] so that a
//! partial `config.toml` is valid, and rejects unknown keys via
//! `#[serde(deny_unknown_fields)]`.

use super::defaults;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the logging subsystem.
///
/// ```
/// use stratum_core::config::LoggingConfig;
///
/// let log_config: LoggingConfig = toml::from_str(r#"level = "debug""#).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.format, "text");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of "trace", "debug", "info", "warn", "error" (case-insensitive).
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file; relative paths are resolved against the state directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            file_path: defaults::default_log_file_path(),
            format: defaults::default_log_format(),
        }
    }
}

/// Server-side decoration metrics, in logical pixels before buffer scaling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecorationConfig {
    #[serde(default = "defaults::default_border_width")]
    pub border_width: i32,
    #[serde(default = "defaults::default_title_bar_height")]
    pub title_bar_height: i32,
    /// Drop-shadow inset added on every side of the decorated frame.
    #[serde(default = "defaults::default_shadow_inset")]
    pub shadow_inset: i32,
    /// Whether newly mapped toplevels start server-decorated.
    #[serde(default = "defaults::default_true")]
    pub server_side_by_default: bool,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            border_width: defaults::default_border_width(),
            title_bar_height: defaults::default_title_bar_height(),
            shadow_inset: defaults::default_shadow_inset(),
            server_side_by_default: defaults::default_true(),
        }
    }
}

/// Idle timeouts in seconds. Zero disables the corresponding transition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdleConfig {
    #[serde(default = "defaults::default_display_timeout_secs")]
    pub display_timeout_secs: u64,
    #[serde(default = "defaults::default_system_timeout_secs")]
    pub system_timeout_secs: u64,
}

impl IdleConfig {
    pub fn display_timeout(&self) -> Option<Duration> {
        (self.display_timeout_secs > 0).then(|| Duration::from_secs(self.display_timeout_secs))
    }

    pub fn system_timeout(&self) -> Option<Duration> {
        (self.system_timeout_secs > 0).then(|| Duration::from_secs(self.system_timeout_secs))
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            display_timeout_secs: defaults::default_display_timeout_secs(),
            system_timeout_secs: defaults::default_system_timeout_secs(),
        }
    }
}

/// Maximize/restore interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationConfig {
    #[serde(default = "defaults::default_true")]
    pub enabled: bool,
    #[serde(default = "defaults::default_animation_duration_ms")]
    pub duration_ms: u64,
}

impl AnimationConfig {
    /// The interpolation duration, or `None` when animations are off.
    pub fn duration(&self) -> Option<Duration> {
        (self.enabled && self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::default_true(),
            duration_ms: defaults::default_animation_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivationConfig {
    /// How long a committed activation token stays usable.
    #[serde(default = "defaults::default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: defaults::default_token_lifetime_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Upper bound on live window objects; further creations get a no-memory notice.
    #[serde(default = "defaults::default_max_windows")]
    pub max_windows: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_windows: defaults::default_max_windows(),
        }
    }
}

/// Root configuration structure.
///
/// ```
/// use stratum_core::config::CoreConfig;
///
/// let config: CoreConfig = toml::from_str(r#"
/// [idle]
/// display_timeout_secs = 60
/// "#).unwrap();
/// assert_eq!(config.idle.display_timeout_secs, 60);
/// assert_eq!(config.decoration.border_width, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub decoration: DecorationConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub activation: ActivationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}
