//! Configuration provider interface.
//!
//! Settings persistence and file watching live outside the compositor core.
//! Whatever owns them hands new configurations to a [`ConfigProvider`]; the
//! provider's generation counter tells consumers that a reload is due.

use crate::config::types::CoreConfig;

/// Read access to the active configuration plus a change counter.
pub trait ConfigProvider {
    fn get_config(&self) -> &CoreConfig;

    /// Increments every time the configuration is replaced.
    fn generation(&self) -> u64;
}

/// Holds a `CoreConfig` in memory and bumps its generation on [`update`](Self::update).
///
/// ```
/// use stratum_core::config::{ConfigProvider, CoreConfig, StaticConfigProvider};
///
/// let mut provider = StaticConfigProvider::new();
/// assert_eq!(provider.generation(), 0);
/// let mut config = CoreConfig::default();
/// config.idle.display_timeout_secs = 10;
/// provider.update(config);
/// assert_eq!(provider.generation(), 1);
/// assert_eq!(provider.get_config().idle.display_timeout_secs, 10);
/// ```
#[derive(Debug, Default)]
pub struct StaticConfigProvider {
    config: CoreConfig,
    generation: u64,
}

impl StaticConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self { config, generation: 0 }
    }

    /// Replaces the configuration; a no-op (generation unchanged) when nothing differs.
    pub fn update(&mut self, config: CoreConfig) {
        if config != self.config {
            self.config = config;
            self.generation += 1;
        }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get_config(&self) -> &CoreConfig {
        &self.config
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_update_keeps_generation() {
        let mut provider = StaticConfigProvider::with_config(CoreConfig::default());
        provider.update(CoreConfig::default());
        assert_eq!(provider.generation(), 0);
    }
}
