//! Default configuration values.
//!
//! Referenced by `serde`'s `default` attribute in [`super::types`].

use std::path::PathBuf;

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_border_width() -> i32 {
    4
}

pub(super) fn default_title_bar_height() -> i32 {
    28
}

pub(super) fn default_shadow_inset() -> i32 {
    12
}

/// Five minutes until the display is blanked.
pub(super) fn default_display_timeout_secs() -> u64 {
    300
}

/// Fifteen minutes until the system suspends.
pub(super) fn default_system_timeout_secs() -> u64 {
    900
}

pub(super) fn default_animation_duration_ms() -> u64 {
    150
}

pub(super) fn default_token_lifetime_secs() -> u64 {
    120
}

pub(super) fn default_max_windows() -> usize {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_file_path(), None);
        assert_eq!(default_log_format(), "text");
    }

    #[test]
    fn test_display_sleeps_before_system() {
        assert!(default_display_timeout_secs() < default_system_timeout_secs());
    }
}
