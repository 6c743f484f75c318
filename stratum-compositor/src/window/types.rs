// stratum-compositor/src/window/types.rs

use crate::output::OutputId;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;
use stratum_core::{Point, Rect, Size};

/// Arena key of a window object.
///
/// Allocated from a monotonic counter by the desktop and never reused, so a
/// stale id can only miss, never alias a newer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn from_raw(raw: u64) -> Self {
        WindowId(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Semantic classification of a window, derived from its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SurfaceType {
    #[default]
    Unknown,
    TopLevel,
    /// A toplevel with a toplevel parent (dialogs, tool windows).
    TopLevelTool,
    Popup,
    LayerShell,
    /// The background surface.
    Desktop,
}

bitflags! {
    /// Per-window state and decoration flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        const MINIMIZED        = 1 << 0;
        const MAXIMIZED        = 1 << 1;
        const FULLSCREEN       = 1 << 2;
        const ACTIVATED        = 1 << 3;
        const SERVER_DECORATED = 1 << 4;
        /// Surface used as a cursor image; never raised.
        const CURSOR           = 1 << 5;
        /// An interactive resize is in progress.
        const RESIZING         = 1 << 6;
    }
}

bitflags! {
    /// Edge anchoring for layer surfaces and popups.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Anchor: u32 {
        const TOP    = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT   = 1 << 2;
        const RIGHT  = 1 << 3;
    }
}

/// A single output edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Layer-shell margins, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Margins {
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Margins { top, right, bottom, left }
    }

    pub fn on(&self, edge: Edge) -> i32 {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
            Edge::Right => self.right,
        }
    }
}

/// The four layer-shell stacking layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Layer {
    Background,
    Bottom,
    Top,
    Overlay,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Background, Layer::Bottom, Layer::Top, Layer::Overlay];

    pub(crate) fn index(self) -> usize {
        match self {
            Layer::Background => 0,
            Layer::Bottom => 1,
            Layer::Top => 2,
            Layer::Overlay => 3,
        }
    }
}

/// Relation to a parent window. A window has at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentLink {
    /// Positioned relative to the parent and destroyed with it.
    Popup(WindowId),
    /// Transient-for / dialog parent; orphaned when the parent goes away.
    Toplevel(WindowId),
}

impl ParentLink {
    pub fn id(&self) -> WindowId {
        match self {
            ParentLink::Popup(id) | ParentLink::Toplevel(id) => *id,
        }
    }

    pub fn is_popup(&self) -> bool {
        matches!(self, ParentLink::Popup(_))
    }
}

/// Placement request for a popup, relative to its parent's content origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Positioner {
    pub size: Size,
    pub anchor_rect: Rect,
    pub anchor: Anchor,
    pub offset: Point,
}

/// Layer-surface properties. Requests land in `pending` and are applied on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerState {
    pub namespace: String,
    pub output: OutputId,
    pub current: LayerProperties,
    pub pending: LayerProperties,
    /// Serial of the last configure sent; `None` before the initial one.
    pub configure_serial: Option<u32>,
    /// Size carried by the last configure.
    pub configured_size: Size,
    pub acked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerProperties {
    pub layer: Layer,
    pub anchor: Anchor,
    pub desired_size: Size,
    pub exclusive_zone: i32,
    pub margins: Margins,
    pub keyboard_interactive: bool,
}

impl LayerProperties {
    pub fn new(layer: Layer) -> Self {
        LayerProperties {
            layer,
            anchor: Anchor::empty(),
            desired_size: Size::ZERO,
            exclusive_zone: 0,
            margins: Margins::default(),
            keyboard_interactive: false,
        }
    }
}

/// How a legacy shell surface was last configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LegacyKind {
    #[default]
    Unset,
    Toplevel,
    Transient,
    Popup,
}

/// ICCCM `WM_STATE` of an X11 window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WmState {
    #[default]
    Withdrawn,
    Normal,
    Iconic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XwaylandState {
    pub x11_window: u32,
    pub override_redirect: bool,
    pub wm_state: WmState,
    pub workspace: Option<u32>,
}

/// Which native desktop shell protocol owns a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeShellKind {
    A,
    B,
}

/// The protocol role bound to a window, with its role-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WindowRole {
    #[default]
    Unbound,
    XdgToplevel,
    XdgPopup(Positioner),
    LegacyShell(LegacyKind),
    LayerSurface(Box<LayerState>),
    NativeShellA,
    NativeShellB,
    XWaylandShell(XwaylandState),
}

/// Field-less discriminant of [`WindowRole`], for identity checks and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Unbound,
    XdgToplevel,
    XdgPopup,
    LegacyShell,
    LayerSurface,
    NativeShellA,
    NativeShellB,
    XWaylandShell,
}

impl WindowRole {
    pub fn kind(&self) -> RoleKind {
        match self {
            WindowRole::Unbound => RoleKind::Unbound,
            WindowRole::XdgToplevel => RoleKind::XdgToplevel,
            WindowRole::XdgPopup(_) => RoleKind::XdgPopup,
            WindowRole::LegacyShell(_) => RoleKind::LegacyShell,
            WindowRole::LayerSurface(_) => RoleKind::LayerSurface,
            WindowRole::NativeShellA => RoleKind::NativeShellA,
            WindowRole::NativeShellB => RoleKind::NativeShellB,
            WindowRole::XWaylandShell(_) => RoleKind::XWaylandShell,
        }
    }

    pub fn is_override_redirect(&self) -> bool {
        matches!(self, WindowRole::XWaylandShell(x) if x.override_redirect)
    }

    /// Whether the role carries activated/deactivated state to its client.
    pub fn receives_activation(&self) -> bool {
        match self {
            WindowRole::XdgToplevel | WindowRole::NativeShellA | WindowRole::NativeShellB => true,
            WindowRole::LegacyShell(kind) => *kind != LegacyKind::Popup,
            WindowRole::XWaylandShell(x) => !x.override_redirect,
            WindowRole::Unbound | WindowRole::XdgPopup(_) | WindowRole::LayerSurface(_) => false,
        }
    }

    /// A user-facing application window, eligible to take over focus.
    pub fn is_real(&self) -> bool {
        self.receives_activation()
    }

    /// The client draws its own drop shadow; the compositor adds none.
    pub fn paints_own_shadow(&self) -> bool {
        matches!(self, WindowRole::XdgPopup(_) | WindowRole::LayerSurface(_)) || self.is_override_redirect()
    }

    /// State transitions wait for the client to ack a configure serial.
    pub fn acks_configure(&self) -> bool {
        matches!(self, WindowRole::XdgToplevel | WindowRole::NativeShellA)
    }

    pub fn layer_state(&self) -> Option<&LayerState> {
        match self {
            WindowRole::LayerSurface(state) => Some(state),
            _ => None,
        }
    }

    pub fn layer_state_mut(&mut self) -> Option<&mut LayerState> {
        match self {
            WindowRole::LayerSurface(state) => Some(state),
            _ => None,
        }
    }

    /// The surface type a freshly bound role implies.
    pub fn surface_type(&self) -> SurfaceType {
        match self {
            WindowRole::Unbound => SurfaceType::Unknown,
            WindowRole::XdgToplevel | WindowRole::NativeShellA | WindowRole::NativeShellB => SurfaceType::TopLevel,
            WindowRole::XdgPopup(_) => SurfaceType::Popup,
            WindowRole::LegacyShell(LegacyKind::Popup) => SurfaceType::Popup,
            WindowRole::LegacyShell(LegacyKind::Transient) => SurfaceType::TopLevelTool,
            WindowRole::LegacyShell(_) => SurfaceType::TopLevel,
            WindowRole::LayerSurface(state) if state.current.layer == Layer::Background => SurfaceType::Desktop,
            WindowRole::LayerSurface(_) => SurfaceType::LayerShell,
            WindowRole::XWaylandShell(x) if x.override_redirect => SurfaceType::Popup,
            WindowRole::XWaylandShell(_) => SurfaceType::TopLevel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xwayland(override_redirect: bool) -> WindowRole {
        WindowRole::XWaylandShell(XwaylandState {
            x11_window: 0x400001,
            override_redirect,
            wm_state: WmState::Normal,
            workspace: None,
        })
    }

    #[test]
    fn activation_receivers() {
        assert!(WindowRole::XdgToplevel.receives_activation());
        assert!(WindowRole::NativeShellB.receives_activation());
        assert!(WindowRole::LegacyShell(LegacyKind::Transient).receives_activation());
        assert!(!WindowRole::LegacyShell(LegacyKind::Popup).receives_activation());
        assert!(xwayland(false).receives_activation());
        assert!(!xwayland(true).receives_activation());
        assert!(!WindowRole::Unbound.receives_activation());
    }

    #[test]
    fn override_redirect_paints_own_shadow() {
        assert!(xwayland(true).paints_own_shadow());
        assert!(!xwayland(false).paints_own_shadow());
        assert!(!WindowRole::XdgToplevel.paints_own_shadow());
    }

    #[test]
    fn background_layer_is_desktop_type() {
        let state = LayerState {
            namespace: "wallpaper".into(),
            output: OutputId::from_raw(1),
            current: LayerProperties::new(Layer::Background),
            pending: LayerProperties::new(Layer::Background),
            configure_serial: None,
            configured_size: Size::ZERO,
            acked: false,
        };
        assert_eq!(WindowRole::LayerSurface(Box::new(state)).surface_type(), SurfaceType::Desktop);
    }

    #[test]
    fn parent_link_id() {
        let id = WindowId::from_raw(3);
        assert_eq!(ParentLink::Popup(id).id(), id);
        assert!(!ParentLink::Toplevel(id).is_popup());
    }
}
