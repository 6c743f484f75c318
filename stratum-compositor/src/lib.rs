//! # Stratum Compositor (`stratum-compositor`)
//!
//! The window lifecycle and stacking core of the Stratum compositor.
//!
//! [`Desktop`] is the owning registry: every client surface becomes a
//! [`WindowObject`] in its arena, and every protocol request, timer tick and
//! client disconnect is a method call on it. Shell protocols (xdg-shell,
//! legacy `wl_shell`, layer shell, the native shells and the XWayland bridge)
//! are typed request enums handled in [`protocols`]. Client-visible effects are
//! queued as [`ClientEvent`]s and drained by the transport with
//! [`Desktop::take_events`].
//!
//! - **Stacking**: z-order, four layer-shell layers and a desktop list, with
//!   raise, activation and focus hand-off in [`stacking`].
//! - **Outputs**: geometry, exclusive-zone reservations and position
//!   correction in [`output`].
//! - **Activation**: one-time tokens for cross-client focus in [`activation`].
//! - **Idle**: display and system sleep timers with inhibitors in [`idle`].
//! - **Runtime**: a `calloop` loop ticking the desktop in [`runtime`].
//!
//! ```rust,ignore
//! use stratum_compositor::{ClientId, Collaborators, Desktop, SurfaceCommit};
//! use stratum_compositor::protocols::xdg_shell::XdgShellRequest;
//! use stratum_core::{CoreConfig, Rect, Size};
//!
//! let mut desktop = Desktop::new(CoreConfig::default(), Collaborators::default());
//! desktop.add_output("eDP-1", Rect::new(0, 0, 1920, 1080), 1);
//! let client = ClientId::from_raw(1);
//! desktop.connect_client(client);
//! let surface = desktop.create_surface(client).unwrap();
//! desktop.handle_xdg_shell(client, XdgShellRequest::GetToplevel { surface });
//! desktop.commit(client, surface, SurfaceCommit::with_buffer(Size::new(640, 480)));
//! assert_eq!(desktop.active_window(), Some(surface));
//! ```

pub mod activation;
pub mod client;
pub mod desktop;
pub mod error;
pub mod foreign_toplevel;
pub mod grab;
pub mod idle;
pub mod interfaces;
pub mod menu;
pub mod output;
pub mod pipeline;
pub mod protocols;
pub mod runtime;
pub mod shell;
pub mod stacking;
pub mod window;

pub use activation::{ActivationArbiter, ActivationOutcome, TokenHandle};
pub use client::{ClientEvent, ClientId};
pub use desktop::{Desktop, FrameReport, SurfaceCommit};
pub use error::{CompositorError, CompositorResult, ProtocolError, ProtocolErrorKind};
pub use grab::Grab;
pub use idle::{IdlePowerController, IdleTransition, PowerState};
pub use interfaces::{Collaborators, DecorationRenderer, DecorationRequest, PowerBackend, WindowManagementSink};
pub use output::{OutputAssigner, OutputId};
pub use runtime::CompositorRuntime;
pub use stacking::{StackingLists, MAX_RAISE_NEXT_RESTARTS, MAX_TRANSIENT_DEPTH};
pub use window::{Layer, WindowFlags, WindowId, WindowObject};
