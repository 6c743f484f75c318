// stratum-compositor/src/window/object.rs

use super::state::ToplevelMachine;
use super::types::{ParentLink, RoleKind, SurfaceType, WindowFlags, WindowId, WindowRole};
use crate::client::ClientId;
use crate::error::{ProtocolError, ProtocolErrorKind};
use crate::output::{OutputAssigner, OutputId};
use stratum_core::{DecorationConfig, Point, Rect, Size};
use uuid::Uuid;

/// A window's presence on one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputView {
    pub output: OutputId,
    /// Part of the rendered rectangle that falls on this output.
    pub visible: Rect,
}

/// One client surface and everything the compositor knows about it.
///
/// `position` is the top-left of the decorated frame in global coordinates.
/// For undecorated windows the frame and the content coincide.
#[derive(Debug, Clone)]
pub struct WindowObject {
    pub(crate) id: WindowId,
    pub(crate) uuid: Uuid,
    pub(crate) client: ClientId,
    pub(crate) surface_type: SurfaceType,
    pub(crate) role: WindowRole,
    pub(crate) title: String,
    pub(crate) app_id: String,
    pub(crate) position: Point,
    pub(crate) content_size: Size,
    pub(crate) buffer_scale: i32,
    pub(crate) flags: WindowFlags,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) children: Vec<WindowId>,
    /// Set once the first buffer is committed after the role was bound.
    pub(crate) initialized: bool,
    /// The initial configure went out.
    pub(crate) configured: bool,
    /// The client chose its own position; initial placement keeps it.
    pub(crate) placed: bool,
    /// Popup and transient offset from the parent's content origin.
    pub(crate) relative_position: Point,
    pub(crate) toplevel: ToplevelMachine,
    pub(crate) views: Vec<OutputView>,
}

impl WindowObject {
    pub(crate) fn new(id: WindowId, client: ClientId) -> Self {
        WindowObject {
            id,
            uuid: Uuid::new_v4(),
            client,
            surface_type: SurfaceType::Unknown,
            role: WindowRole::Unbound,
            title: String::new(),
            app_id: String::new(),
            position: Point::ZERO,
            content_size: Size::ZERO,
            buffer_scale: 1,
            flags: WindowFlags::empty(),
            parent: None,
            children: Vec::new(),
            initialized: false,
            configured: false,
            placed: false,
            relative_position: Point::ZERO,
            toplevel: ToplevelMachine::default(),
            views: Vec::new(),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn surface_type(&self) -> SurfaceType {
        self.surface_type
    }

    pub fn role(&self) -> &WindowRole {
        &self.role
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn buffer_scale(&self) -> i32 {
        self.buffer_scale
    }

    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    pub fn children(&self) -> &[WindowId] {
        &self.children
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn toplevel(&self) -> &ToplevelMachine {
        &self.toplevel
    }

    pub fn views(&self) -> &[OutputView] {
        &self.views
    }

    pub fn is_activated(&self) -> bool {
        self.flags.contains(WindowFlags::ACTIVATED)
    }

    pub fn is_minimized(&self) -> bool {
        self.flags.contains(WindowFlags::MINIMIZED)
    }

    /// Cursor images and the desktop surface never take part in raising.
    pub fn is_special(&self) -> bool {
        self.flags.contains(WindowFlags::CURSOR) || self.surface_type == SurfaceType::Desktop
    }

    /// Binds `role`. The first non-Unbound role sticks for the window's lifetime.
    pub(crate) fn bind_role(&mut self, role: WindowRole) -> Result<(), ProtocolError> {
        let current = self.role.kind();
        if current != RoleKind::Unbound {
            return Err(ProtocolError::new(
                ProtocolErrorKind::Role,
                format!("window {} already has role {:?}, cannot become {:?}", self.id, current, role.kind()),
            ));
        }
        self.surface_type = role.surface_type();
        self.role = role;
        Ok(())
    }

    /// Width and height the server-side frame adds around the content.
    pub fn decoration_extent(&self, metrics: &DecorationConfig) -> Size {
        decoration_extent(self.flags, self.buffer_scale, metrics)
    }

    pub fn decorated_size(&self, metrics: &DecorationConfig) -> Size {
        let extent = self.decoration_extent(metrics);
        self.content_size.grow(extent.width, extent.height)
    }

    /// Offset of the content inside the decorated frame.
    pub fn content_offset(&self, metrics: &DecorationConfig) -> Point {
        if !decorations_visible(self.flags) {
            return Point::ZERO;
        }
        let scale = self.buffer_scale.max(1);
        Point::new(
            metrics.border_width * scale,
            (metrics.title_bar_height + metrics.border_width) * scale,
        )
    }

    pub fn shadow_inset(&self, metrics: &DecorationConfig) -> i32 {
        let suppressed = self
            .flags
            .intersects(WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN)
            || self.role.paints_own_shadow();
        if suppressed {
            0
        } else {
            metrics.shadow_inset * self.buffer_scale.max(1)
        }
    }

    pub fn rendered_size(&self, metrics: &DecorationConfig) -> Size {
        let inset = self.shadow_inset(metrics);
        self.decorated_size(metrics).grow(2 * inset, 2 * inset)
    }

    pub fn frame_rect(&self, metrics: &DecorationConfig) -> Rect {
        Rect::from_parts(self.position, self.decorated_size(metrics))
    }

    pub fn content_rect(&self, metrics: &DecorationConfig) -> Rect {
        Rect::from_parts(self.position + self.content_offset(metrics), self.content_size)
    }

    pub fn rendered_rect(&self, metrics: &DecorationConfig) -> Rect {
        let inset = self.shadow_inset(metrics);
        Rect::from_parts(self.position - Point::new(inset, inset), self.rendered_size(metrics))
    }

    /// Sets the frame to `frame`, deriving the content size from the current decorations.
    pub(crate) fn set_frame(&mut self, frame: Rect, metrics: &DecorationConfig) {
        let extent = self.decoration_extent(metrics);
        self.position = frame.origin;
        self.content_size = frame.size.grow(-extent.width, -extent.height);
    }

    /// Content size a frame of `frame_size` leaves after decorations, under `flags`.
    pub(crate) fn content_size_for(&self, frame_size: Size, flags: WindowFlags, metrics: &DecorationConfig) -> Size {
        let extent = decoration_extent(flags, self.buffer_scale, metrics);
        frame_size.grow(-extent.width, -extent.height)
    }

    /// Recomputes the per-output views from the rendered rectangle.
    pub(crate) fn update_views(&mut self, outputs: &OutputAssigner, metrics: &DecorationConfig) {
        let rendered = self.rendered_rect(metrics);
        self.views = outputs
            .iter()
            .filter_map(|output| {
                rendered.intersection(&output.geometry).map(|visible| OutputView {
                    output: output.id,
                    visible,
                })
            })
            .collect();
    }

    /// The view with the largest visible area; ties go to the earlier output.
    pub fn primary_view(&self) -> Option<&OutputView> {
        self.views.iter().fold(None, |best: Option<&OutputView>, view| match best {
            Some(b) if b.visible.area() >= view.visible.area() => Some(b),
            _ => Some(view),
        })
    }

    pub fn primary_output(&self) -> Option<OutputId> {
        self.primary_view().map(|view| view.output)
    }
}

fn decorations_visible(flags: WindowFlags) -> bool {
    flags.contains(WindowFlags::SERVER_DECORATED) && !flags.contains(WindowFlags::FULLSCREEN)
}

fn decoration_extent(flags: WindowFlags, buffer_scale: i32, metrics: &DecorationConfig) -> Size {
    if !decorations_visible(flags) {
        return Size::ZERO;
    }
    let scale = buffer_scale.max(1);
    Size::new(
        2 * metrics.border_width * scale,
        (metrics.title_bar_height + 2 * metrics.border_width) * scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::types::{LegacyKind, Positioner, Anchor};
    use pretty_assertions::assert_eq;

    fn metrics() -> DecorationConfig {
        DecorationConfig {
            border_width: 4,
            title_bar_height: 28,
            shadow_inset: 12,
            server_side_by_default: true,
        }
    }

    fn toplevel() -> WindowObject {
        let mut w = WindowObject::new(WindowId::from_raw(1), ClientId::from_raw(1));
        w.bind_role(WindowRole::XdgToplevel).unwrap();
        w.content_size = Size::new(640, 480);
        w.position = Point::new(100, 100);
        w
    }

    #[test]
    fn second_role_is_rejected() {
        let mut w = toplevel();
        let err = w.bind_role(WindowRole::LegacyShell(LegacyKind::Toplevel)).unwrap_err();
        assert_eq!(err.kind, ProtocolErrorKind::Role);
        assert_eq!(w.role().kind(), RoleKind::XdgToplevel);
        assert_eq!(w.surface_type(), SurfaceType::TopLevel);
    }

    #[test]
    fn undecorated_sizes() {
        let w = toplevel();
        let m = metrics();
        assert_eq!(w.decorated_size(&m), Size::new(640, 480));
        assert_eq!(w.rendered_size(&m), Size::new(664, 504));
    }

    #[test]
    fn decorated_sizes_scale_with_buffer() {
        let mut w = toplevel();
        w.flags |= WindowFlags::SERVER_DECORATED;
        w.buffer_scale = 2;
        let m = metrics();
        assert_eq!(w.decorated_size(&m), Size::new(640 + 16, 480 + 72));
        assert_eq!(w.content_offset(&m), Point::new(8, 64));
        assert_eq!(w.rendered_size(&m), Size::new(656 + 48, 552 + 48));
    }

    #[test]
    fn maximized_has_no_shadow() {
        let mut w = toplevel();
        w.flags |= WindowFlags::MAXIMIZED;
        assert_eq!(w.shadow_inset(&metrics()), 0);
    }

    #[test]
    fn popups_paint_their_own_shadow() {
        let mut w = WindowObject::new(WindowId::from_raw(2), ClientId::from_raw(1));
        w.bind_role(WindowRole::XdgPopup(Positioner {
            size: Size::new(10, 10),
            anchor_rect: Rect::new(0, 0, 1, 1),
            anchor: Anchor::empty(),
            offset: Point::ZERO,
        }))
        .unwrap();
        w.content_size = Size::new(10, 10);
        assert_eq!(w.rendered_size(&metrics()), Size::new(10, 10));
    }

    #[test]
    fn set_frame_subtracts_decorations() {
        let mut w = toplevel();
        w.flags |= WindowFlags::SERVER_DECORATED;
        w.set_frame(Rect::new(0, 0, 1920, 1080), &metrics());
        assert_eq!(w.content_size(), Size::new(1912, 1044));
        assert_eq!(w.frame_rect(&metrics()), Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn primary_view_has_largest_area() {
        let mut outputs = OutputAssigner::default();
        let left = outputs.add_output("left", Rect::new(0, 0, 1000, 1000), 1);
        let right = outputs.add_output("right", Rect::new(1000, 0, 1000, 1000), 1);
        let mut w = toplevel();
        w.content_size = Size::new(400, 300);
        w.position = Point::new(900, 100);
        w.update_views(&outputs, &metrics());
        assert_eq!(w.views().len(), 2);
        assert_eq!(w.primary_output(), Some(right));
        w.position = Point::new(700, 100);
        w.update_views(&outputs, &metrics());
        assert_eq!(w.primary_output(), Some(left));
    }
}
