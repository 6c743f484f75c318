// stratum-compositor/src/protocols/mod.rs

//! Adapters from typed protocol requests to [`crate::Desktop`] operations.
//!
//! Each adapter exposes one request enum and one `handle_*` entry point on
//! the desktop. Violations are reported back to the requesting client.

pub mod idle_inhibit;
pub mod layer_shell;
pub mod legacy_shell;
pub mod menu_registration;
pub mod native_shell;
pub mod xdg_activation;
pub mod xdg_shell;
pub mod xwayland;
