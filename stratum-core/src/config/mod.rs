//! Configuration management.
//!
//! - [`types`]: the schema ([`CoreConfig`] and its sections).
//! - [`defaults`]: default values referenced by `serde`.
//! - [`loader`]: TOML loading and validation ([`ConfigLoader`]).
//! - [`provider`]: the [`ConfigProvider`] seam used for hot reload.

pub mod defaults;
pub mod loader;
pub mod provider;
pub mod types;

pub use loader::ConfigLoader;
pub use provider::{ConfigProvider, StaticConfigProvider};
pub use types::{
    ActivationConfig, AnimationConfig, CoreConfig, DecorationConfig, IdleConfig, LimitsConfig,
    LoggingConfig,
};
