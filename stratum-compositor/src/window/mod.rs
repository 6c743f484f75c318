//! Window objects and their vocabulary.

pub mod anchor;
pub mod object;
pub mod state;
pub mod types;

pub use object::{OutputView, WindowObject};
pub use state::{Animation, PendingTransition, ToplevelMachine, ToplevelState, TransitionRefusal};
pub use types::{
    Anchor, Edge, Layer, LayerProperties, LayerState, LegacyKind, Margins, NativeShellKind, ParentLink, Positioner,
    RoleKind, SurfaceType, WindowFlags, WindowId, WindowRole, WmState, XwaylandState,
};
