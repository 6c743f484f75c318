// stratum-compositor/src/shell.rs

//! Toplevel and popup lifecycle shared by every shell protocol.
//!
//! The protocol adapters translate their requests into these operations;
//! mapping, placement, state transitions and parent links behave the same
//! whichever protocol owns the window.

use crate::client::{ClientEvent, ClientId};
use crate::desktop::Desktop;
use crate::error::{CompositorError, CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::anchor::anchored_position;
use crate::window::{
    Animation, LegacyKind, Margins, ParentLink, SurfaceType, ToplevelState, WindowFlags, WindowId, WindowRole,
};
use stratum_core::{Point, Rect, Size};
use tracing::{debug, trace, warn};

/// Bound on parent chains walked for cycle detection.
const MAX_PARENT_DEPTH: usize = 64;

impl Desktop {
    /// Commit handling for toplevel-like roles (xdg toplevel, legacy, native, X11).
    pub(crate) fn commit_toplevel(&mut self, id: WindowId, buffer: Option<Size>) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        match (buffer, window.initialized) {
            (None, false) => {
                if window.role == WindowRole::XdgToplevel && !window.configured {
                    window.configured = true;
                    let client = window.client;
                    let serial = self.next_serial();
                    self.outbox.push(
                        client,
                        ClientEvent::Configure {
                            window: id,
                            serial,
                            size: Size::ZERO,
                            states: WindowFlags::empty(),
                        },
                    );
                }
            }
            (None, true) => self.unmap_window(id),
            (Some(size), false) => {
                window.content_size = size;
                if window.role == WindowRole::LegacyShell(LegacyKind::Unset) {
                    trace!(window = %id, "Legacy surface has no kind yet, not mapping");
                    return;
                }
                self.map_window(id);
            }
            (Some(size), true) => {
                if size != window.content_size && !window.toplevel.is_animating() {
                    window.content_size = size;
                    let metrics = self.config.decoration.clone();
                    window.update_views(&self.outputs, &metrics);
                    self.pipeline.mark_redecoration(id);
                    self.sync_popups(id);
                } else {
                    self.pipeline.mark_present(id);
                }
            }
        }
    }

    /// Places and shows a toplevel-like window and gives it focus.
    pub(crate) fn map_window(&mut self, id: WindowId) {
        let metrics = self.config.decoration.clone();
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.initialized = true;
        window.toplevel.map();
        let override_redirect = window.role.is_override_redirect();
        if window.role.is_real() && metrics.server_side_by_default && !window.flags.contains(WindowFlags::CURSOR) {
            window.flags |= WindowFlags::SERVER_DECORATED;
        }

        if !override_redirect {
            let origin = self.initial_position(id);
            if let Some(window) = self.windows.get_mut(&id) {
                window.position = origin;
            }
        }

        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.update_views(&self.outputs, &metrics);
        let (uuid, title, app_id, real) = (window.uuid, window.title.clone(), window.app_id.clone(), window.role.is_real());
        debug!(window = %id, position = ?window.position, "Window mapped");

        self.stacking.push_top(id);
        if real {
            self.foreign_toplevels.add_control(
                self.collaborators.window_management.as_mut(),
                id,
                uuid,
                &title,
                &app_id,
            );
        }
        self.pipeline.mark_redecoration(id);
        self.sync_popups(id);

        if override_redirect {
            self.publish_stacking();
        } else {
            self.raise(id);
        }
    }

    /// Centres the frame on its transient parent, or on the output under the
    /// pointer, then keeps it out of reserved bands.
    fn initial_position(&self, id: WindowId) -> Point {
        let metrics = &self.config.decoration;
        let Some(window) = self.windows.get(&id) else {
            return Point::ZERO;
        };
        if window.placed {
            return self.outputs.corrected_position(window.position);
        }
        let frame = window.decorated_size(metrics);
        let area = match window.parent {
            Some(ParentLink::Toplevel(parent)) => self.windows.get(&parent).map(|p| p.frame_rect(metrics)),
            _ => None,
        }
        .or_else(|| {
            self.outputs
                .nearest_output(self.pointer)
                .and_then(|o| self.outputs.available_geometry(o.id))
        });
        let Some(area) = area else {
            return window.position;
        };
        let centred = Point::new(
            area.left() + (area.size.width - frame.width) / 2,
            area.top() + (area.size.height - frame.height) / 2,
        );
        self.outputs.corrected_position(centred)
    }

    /// Hides a window without destroying it.
    pub(crate) fn unmap_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if !window.initialized {
            return;
        }
        window.initialized = false;
        let popups: Vec<WindowId> = window.children.clone();
        debug!(window = %id, "Window unmapped");

        self.stacking.remove_everywhere(id);
        if self.outputs.release(id).is_some() {
            if let Some(output) = self.windows.get(&id).and_then(|w| w.role.layer_state()).map(|s| s.output) {
                self.rearrange_output(output);
            }
        }
        self.foreign_toplevels
            .remove_control(self.collaborators.window_management.as_mut(), id);
        for child in popups {
            let is_popup = self
                .windows
                .get(&child)
                .is_some_and(|c| c.parent == Some(ParentLink::Popup(id)));
            if is_popup {
                self.unmap_window(child);
            }
        }
        if self.active == Some(id) {
            self.deactivate(id);
            self.active = None;
            self.raise_next_in_line();
        }
        self.publish_stacking();
    }

    // --- Popups ---

    /// Binds a popup role and links it under `parent`.
    pub(crate) fn attach_popup(
        &mut self,
        client: ClientId,
        id: WindowId,
        parent: WindowId,
        role: WindowRole,
        offset: Point,
    ) -> CompositorResult<()> {
        self.owned(client, parent).map_err(|err| match err {
            CompositorError::StaleWindow(_) => {
                ProtocolError::new(ProtocolErrorKind::InvalidParent, format!("popup parent {} is gone", parent)).into()
            }
            other => other,
        })?;
        self.check_popup_parent(id, parent)?;
        let window = self.owned_mut(client, id)?;
        window.bind_role(role)?;
        window.surface_type = SurfaceType::Popup;
        self.link_parent(id, ParentLink::Popup(parent));
        if let Some(window) = self.windows.get_mut(&id) {
            window.relative_position = offset;
        }
        Ok(())
    }

    pub(crate) fn commit_popup(&mut self, id: WindowId, buffer: Option<Size>) -> CompositorResult<()> {
        let parent_area = self
            .windows
            .get(&id)
            .and_then(|w| w.parent)
            .and_then(|p| self.windows.get(&p.id()))
            .map(|p| Rect::from_parts(Point::ZERO, p.content_size));
        let Some(window) = self.windows.get_mut(&id) else {
            return Err(CompositorError::StaleWindow(id));
        };
        let positioner = match &window.role {
            WindowRole::XdgPopup(positioner) => Some(*positioner),
            _ => None,
        };
        if let Some(positioner) = positioner {
            // Without anchor edges the popup is centred on its parent.
            let area = match parent_area {
                Some(parent) if positioner.anchor.is_empty() => parent,
                _ => positioner.anchor_rect,
            };
            window.relative_position =
                anchored_position(area, positioner.anchor, positioner.size, Margins::default()) + positioner.offset;
        }

        match (buffer, window.initialized) {
            (None, false) => {
                if let Some(positioner) = positioner.filter(|_| !window.configured) {
                    window.configured = true;
                    let client = window.client;
                    let position = window.relative_position;
                    let serial = self.next_serial();
                    self.outbox.push(
                        client,
                        ClientEvent::PopupConfigure {
                            window: id,
                            serial,
                            position,
                            size: positioner.size,
                        },
                    );
                }
            }
            (None, true) => self.unmap_window(id),
            (Some(size), _) => {
                window.content_size = size;
                window.initialized = true;
                self.sync_popup_position(id);
                self.pipeline.mark_present(id);
            }
        }
        Ok(())
    }

    /// Recomputes the global position of `id` from its parent's content origin.
    fn sync_popup_position(&mut self, id: WindowId) {
        let metrics = self.config.decoration.clone();
        let parent_origin = self
            .windows
            .get(&id)
            .and_then(|w| w.parent)
            .and_then(|p| self.windows.get(&p.id()))
            .map(|p| p.content_rect(&metrics).origin);
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if let Some(origin) = parent_origin {
            window.position = origin + window.relative_position;
        }
        window.update_views(&self.outputs, &metrics);
        self.sync_popups(id);
    }

    /// Moves the popup children of `id` along with it.
    pub(crate) fn sync_popups(&mut self, id: WindowId) {
        let popups: Vec<WindowId> = self
            .windows
            .get(&id)
            .map(|w| {
                w.children
                    .iter()
                    .copied()
                    .filter(|c| self.windows.get(c).is_some_and(|cw| cw.parent == Some(ParentLink::Popup(id))))
                    .collect()
            })
            .unwrap_or_default();
        for popup in popups {
            self.sync_popup_position(popup);
        }
    }

    // --- Parents ---

    pub(crate) fn link_parent(&mut self, child: WindowId, link: ParentLink) {
        self.unlink_parent(child);
        if let Some(parent) = self.windows.get_mut(&link.id()) {
            if !parent.children.contains(&child) {
                parent.children.push(child);
            }
        }
        if let Some(window) = self.windows.get_mut(&child) {
            window.parent = Some(link);
        }
    }

    pub(crate) fn unlink_parent(&mut self, child: WindowId) {
        let previous = self.windows.get_mut(&child).and_then(|w| w.parent.take());
        if let Some(parent) = previous.and_then(|p| self.windows.get_mut(&p.id())) {
            parent.children.retain(|c| *c != child);
        }
    }

    /// Sets or clears the transient-for parent of a toplevel.
    pub(crate) fn set_toplevel_parent(
        &mut self,
        client: ClientId,
        child: WindowId,
        parent: Option<WindowId>,
    ) -> CompositorResult<()> {
        let window = self.owned(client, child)?;
        if window.parent.is_some_and(|p| p.is_popup()) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidParent,
                format!("window {} is a popup", child),
            )
            .into());
        }
        let Some(parent) = parent else {
            self.unlink_parent(child);
            if let Some(window) = self.windows.get_mut(&child) {
                if window.surface_type == SurfaceType::TopLevelTool {
                    window.surface_type = SurfaceType::TopLevel;
                }
            }
            return Ok(());
        };
        self.owned(client, parent)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidParent,
                format!("making {} the parent of {} would create a cycle", parent, child),
            )
            .into());
        }
        self.link_parent(child, ParentLink::Toplevel(parent));
        if let Some(window) = self.windows.get_mut(&child) {
            if window.surface_type == SurfaceType::TopLevel {
                window.surface_type = SurfaceType::TopLevelTool;
            }
        }
        debug!(window = %child, %parent, "Transient parent set");
        Ok(())
    }

    /// Refuses a popup parent that is the popup itself or one of its descendants.
    pub(crate) fn check_popup_parent(&self, popup: WindowId, parent: WindowId) -> CompositorResult<()> {
        if self.is_ancestor_or_self(popup, parent) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidParent,
                format!("making {} the popup parent of {} would create a cycle", parent, popup),
            )
            .into());
        }
        Ok(())
    }

    /// Whether `candidate` is `window` or reachable from `candidate`'s parent chain back to `window`.
    fn is_ancestor_or_self(&self, window: WindowId, candidate: WindowId) -> bool {
        let mut current = Some(candidate);
        for _ in 0..MAX_PARENT_DEPTH {
            match current {
                Some(id) if id == window => return true,
                Some(id) => current = self.windows.get(&id).and_then(|w| w.parent).map(|p| p.id()),
                None => return false,
            }
        }
        true
    }

    // --- Titles ---

    pub(crate) fn set_title(&mut self, client: ClientId, id: WindowId, title: String) -> CompositorResult<()> {
        let window = self.owned_mut(client, id)?;
        if window.title != title {
            window.title = title;
            self.pipeline.mark_redecoration(id);
        }
        Ok(())
    }

    pub(crate) fn set_app_id(&mut self, client: ClientId, id: WindowId, app_id: String) -> CompositorResult<()> {
        self.owned_mut(client, id)?.app_id = app_id;
        Ok(())
    }

    // --- State transitions ---

    /// Requests Normal, Maximized or Fullscreen.
    ///
    /// Roles that ack configures finish on [`Self::ack_toplevel_configure`];
    /// the rest finish immediately. Requests while an animation runs are dropped.
    pub(crate) fn request_state(&mut self, id: WindowId, target: ToplevelState) -> CompositorResult<()> {
        let metrics = self.config.decoration.clone();
        let window = self.windows.get(&id).ok_or(CompositorError::StaleWindow(id))?;
        if matches!(target, ToplevelState::Created | ToplevelState::Minimized) {
            return Ok(());
        }
        if window.is_minimized() {
            self.unminimize(id);
        }
        let Some(window) = self.windows.get(&id) else {
            return Err(CompositorError::StaleWindow(id));
        };

        let current = window.frame_rect(&metrics);
        let output = window
            .primary_output()
            .or_else(|| self.outputs.output_for_rect(current).map(|o| o.id));
        let target_frame = match (target, output) {
            (ToplevelState::Maximized, Some(output)) => self.outputs.available_geometry(output),
            (ToplevelState::Fullscreen, Some(output)) => self.outputs.output_geometry(output),
            (ToplevelState::Normal, _) => Some(window.toplevel.restore_frame(current)),
            _ => None,
        };
        let Some(target_frame) = target_frame else {
            warn!(window = %id, ?target, "No output to size the window against");
            return Ok(());
        };

        let mut target_flags = window.flags - (WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN);
        match target {
            ToplevelState::Maximized => target_flags |= WindowFlags::MAXIMIZED,
            ToplevelState::Fullscreen => target_flags |= WindowFlags::FULLSCREEN,
            _ => {}
        }
        let size = window.content_size_for(target_frame.size, target_flags, &metrics);
        let acks = window.role.acks_configure();
        let client = window.client;

        let serial = self.next_serial();
        let Some(window) = self.windows.get_mut(&id) else {
            return Err(CompositorError::StaleWindow(id));
        };
        if let Err(refusal) = window.toplevel.begin(target, current, target_frame, serial) {
            debug!(window = %id, ?target, ?refusal, "State request not started");
            return Ok(());
        }
        self.outbox.push(
            client,
            ClientEvent::Configure {
                window: id,
                serial,
                size,
                states: target_flags & (WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN | WindowFlags::ACTIVATED),
            },
        );
        if !acks {
            self.finish_transition(id, serial);
        }
        Ok(())
    }

    /// Handles ack-configure for toplevel roles. Serials never sent are a protocol error.
    pub(crate) fn ack_toplevel_configure(&mut self, id: WindowId, serial: u32) -> CompositorResult<()> {
        if serial == 0 || serial > self.last_serial() {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidSerial,
                format!("serial {} was never sent", serial),
            )
            .into());
        }
        self.finish_transition(id, serial);
        Ok(())
    }

    fn finish_transition(&mut self, id: WindowId, serial: u32) {
        let metrics = self.config.decoration.clone();
        let animation = self.config.animation.duration();
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        let from = window.frame_rect(&metrics);
        let Some(done) = window.toplevel.ack(serial) else {
            return;
        };
        window.flags.remove(WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN);
        match done.target {
            ToplevelState::Maximized => window.flags |= WindowFlags::MAXIMIZED,
            ToplevelState::Fullscreen => window.flags |= WindowFlags::FULLSCREEN,
            _ => {}
        }
        window.set_frame(done.frame, &metrics);
        if let Some(duration) = animation {
            window.toplevel.start_animation(Animation::new(from, done.frame, duration));
        }
        window.update_views(&self.outputs, &metrics);
        debug!(window = %id, state = ?done.target, frame = ?done.frame, "State transition finished");
        self.pipeline.mark_redecoration(id);
        self.sync_popups(id);
    }

    /// Minimizes immediately; focus moves on if `id` held it.
    pub(crate) fn minimize(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            warn!(window = %id, "Minimize requested for unregistered window");
            return;
        };
        if !window.toplevel.minimize() {
            return;
        }
        window.flags |= WindowFlags::MINIMIZED;
        debug!(window = %id, "Window minimized");
        self.pipeline.mark_present(id);
        if self.active == Some(id) {
            self.deactivate(id);
            self.active = None;
            self.raise_next_in_line();
        }
        self.publish_stacking();
    }

    pub(crate) fn unminimize(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if window.toplevel.unminimize() {
            window.flags.remove(WindowFlags::MINIMIZED);
            debug!(window = %id, "Window restored from minimized");
            self.pipeline.mark_present(id);
        }
    }

    /// Moves a window's frame to `origin`, corrected against reserved bands.
    pub(crate) fn move_window_to(&mut self, id: WindowId, origin: Point) {
        let metrics = self.config.decoration.clone();
        let corrected = self.outputs.corrected_position(origin);
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.position = corrected;
        window.placed = true;
        window.update_views(&self.outputs, &metrics);
        self.pipeline.mark_present(id);
        self.sync_popups(id);
    }

    /// Resizes the content and tells the client.
    pub(crate) fn resize_window(&mut self, id: WindowId, size: Size) {
        let metrics = self.config.decoration.clone();
        let serial = self.next_serial();
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        let size = Size::new(size.width.max(1), size.height.max(1));
        window.content_size = size;
        window.update_views(&self.outputs, &metrics);
        let client = window.client;
        let states = window.flags & (WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN | WindowFlags::ACTIVATED | WindowFlags::RESIZING);
        self.outbox.push(client, ClientEvent::Configure { window: id, serial, size, states });
        self.pipeline.mark_redecoration(id);
        self.sync_popups(id);
    }

    /// Frame rectangle of `id` under the current decoration metrics.
    pub fn frame_rect(&self, id: WindowId) -> Option<Rect> {
        self.windows.get(&id).map(|w| w.frame_rect(&self.config.decoration))
    }
}
