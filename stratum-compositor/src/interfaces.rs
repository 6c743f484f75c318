// stratum-compositor/src/interfaces.rs

//! Traits for the collaborators the window graph drives but does not own.
//!
//! Each has a no-op implementation so a [`crate::Desktop`] can be built
//! without a renderer, taskbar or power daemon attached.

use crate::window::WindowId;
use stratum_core::Rect;
use uuid::Uuid;

/// What a decoration painter needs to redraw one server-side frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationRequest {
    pub window: WindowId,
    pub title: String,
    pub frame: Rect,
    pub activated: bool,
    pub buffer_scale: i32,
}

/// Paints server-side decorations.
pub trait DecorationRenderer {
    fn redecorate(&mut self, request: &DecorationRequest);
}

/// Consumer of the window-management view (taskbars, pagers).
pub trait WindowManagementSink {
    /// A toplevel gained its control object.
    fn window_added(&mut self, window: Uuid, title: &str, app_id: &str);

    fn window_removed(&mut self, window: Uuid);

    /// The z-order changed; `order` is a bottom-to-top, comma-separated UUID list.
    fn stacking_changed(&mut self, order: &str);
}

/// Carries out display and system power transitions.
pub trait PowerBackend {
    fn display_sleep(&mut self);
    fn system_sleep(&mut self);
    fn wake(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDecorations;

impl DecorationRenderer for NoopDecorations {
    fn redecorate(&mut self, _request: &DecorationRequest) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWindowManagement;

impl WindowManagementSink for NoopWindowManagement {
    fn window_added(&mut self, _window: Uuid, _title: &str, _app_id: &str) {}
    fn window_removed(&mut self, _window: Uuid) {}
    fn stacking_changed(&mut self, _order: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPower;

impl PowerBackend for NoopPower {
    fn display_sleep(&mut self) {}
    fn system_sleep(&mut self) {}
    fn wake(&mut self) {}
}

/// The collaborator set handed to [`crate::Desktop::new`].
pub struct Collaborators {
    pub decorations: Box<dyn DecorationRenderer>,
    pub window_management: Box<dyn WindowManagementSink>,
    pub power: Box<dyn PowerBackend>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators {
            decorations: Box::new(NoopDecorations),
            window_management: Box::new(NoopWindowManagement),
            power: Box::new(NoopPower),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
