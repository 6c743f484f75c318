//! # Stratum Core Library (`stratum-core`)
//!
//! `stratum-core` is the foundational library for the Stratum compositor. It
//! carries the pieces every other crate in the workspace leans on:
//!
//! - **Error Handling**: [`CoreError`] and the specific [`ConfigError`] and
//!   [`LoggingError`] types.
//! - **Geometry**: integer [`Point`], [`Size`] and [`Rect`] in global
//!   compositor space.
//! - **Configuration**: TOML-backed [`CoreConfig`] with decoration metrics,
//!   idle timeouts, animation and activation settings, loaded by
//!   [`ConfigLoader`] and served through a [`ConfigProvider`].
//! - **Logging**: `tracing` subscriber setup for console and optional file
//!   output in text or JSON format.
//!
//! ```rust,ignore
//! use stratum_core::config::ConfigLoader;
//! use stratum_core::logging::init_logging;
//!
//! fn main() -> Result<(), stratum_core::CoreError> {
//!     let config = ConfigLoader::load()?;
//!     init_logging(&config.logging, false)?;
//!     tracing::info!("Stratum core initialized.");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

pub use config::{
    ActivationConfig, AnimationConfig, ConfigLoader, ConfigProvider, CoreConfig,
    DecorationConfig, IdleConfig, LimitsConfig, LoggingConfig, StaticConfigProvider,
};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use types::{Point, Rect, Size};
