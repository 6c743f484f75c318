// stratum-compositor/src/desktop.rs

//! The owning registry of the window graph.
//!
//! [`Desktop`] holds every window object, the stacking lists, the outputs and
//! the arbiters. Protocol adapters and the event loop call into it; it never
//! calls back into a transport. All mutation happens on one thread.

use crate::activation::ActivationArbiter;
use crate::client::{ClientEvent, ClientId, ClientRegistry, Outbox};
use crate::error::{CompositorError, CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::foreign_toplevel::ForeignToplevelExport;
use crate::grab::Grab;
use crate::idle::{IdlePowerController, IdleTransition, PowerState};
use crate::interfaces::{Collaborators, DecorationRequest};
use crate::menu::MenuServerRegistry;
use crate::output::{OutputAssigner, OutputId};
use crate::pipeline::{FrameMarks, FramePipeline};
use crate::protocols::idle_inhibit::{Inhibitor, InhibitorId};
use crate::stacking::StackingLists;
use crate::window::{Layer, LegacyKind, ParentLink, RoleKind, SurfaceType, WindowFlags, WindowId, WindowObject, WindowRole};
use std::collections::HashMap;
use std::time::Duration;
use stratum_core::{ConfigProvider, CoreConfig, Point, Rect, Size};
use tracing::{debug, error, info, warn};

/// State a surface commit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCommit {
    /// Size of the attached buffer in surface coordinates; `None` when no buffer is attached.
    pub buffer: Option<Size>,
    pub buffer_scale: i32,
}

impl SurfaceCommit {
    pub fn with_buffer(size: Size) -> Self {
        SurfaceCommit {
            buffer: Some(size),
            buffer_scale: 1,
        }
    }

    pub fn empty() -> Self {
        SurfaceCommit {
            buffer: None,
            buffer_scale: 1,
        }
    }
}

/// What one frame tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub redecorated: Vec<WindowId>,
    /// Windows presented this frame, with the frame rectangle shown.
    pub presented: Vec<(WindowId, Rect)>,
}

pub struct Desktop {
    pub(crate) config: CoreConfig,
    config_generation: Option<u64>,
    pub(crate) windows: HashMap<WindowId, WindowObject>,
    next_window_id: u64,
    pub(crate) stacking: StackingLists,
    pub(crate) active: Option<WindowId>,
    /// Last window whose role was told it is activated; can differ from
    /// `active` while a layer surface holds keyboard focus.
    pub(crate) activated: Option<WindowId>,
    pub(crate) outputs: OutputAssigner,
    pub(crate) clients: ClientRegistry,
    pub(crate) activation: ActivationArbiter,
    pub(crate) idle: IdlePowerController,
    pub(crate) inhibitors: HashMap<InhibitorId, Inhibitor>,
    pub(crate) next_inhibitor_id: u64,
    pub(crate) pipeline: FramePipeline,
    pub(crate) menus: MenuServerRegistry,
    pub(crate) foreign_toplevels: ForeignToplevelExport,
    pub(crate) outbox: Outbox,
    pub(crate) collaborators: Collaborators,
    pub(crate) grab: Option<Grab>,
    pub(crate) pointer: Point,
    serial: u32,
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("windows", &self.windows.len())
            .field("z_order", &self.stacking.z_order())
            .field("active", &self.active)
            .field("power", &self.idle.state())
            .finish_non_exhaustive()
    }
}

impl Desktop {
    pub fn new(config: CoreConfig, collaborators: Collaborators) -> Self {
        let idle = IdlePowerController::new(config.idle.display_timeout(), config.idle.system_timeout());
        let activation = ActivationArbiter::new(Duration::from_secs(config.activation.token_lifetime_secs));
        info!(max_windows = config.limits.max_windows, "Desktop created");
        Desktop {
            config,
            config_generation: None,
            windows: HashMap::new(),
            next_window_id: 0,
            stacking: StackingLists::default(),
            active: None,
            activated: None,
            outputs: OutputAssigner::default(),
            clients: ClientRegistry::default(),
            activation,
            idle,
            inhibitors: HashMap::new(),
            next_inhibitor_id: 0,
            pipeline: FramePipeline::default(),
            menus: MenuServerRegistry::default(),
            foreign_toplevels: ForeignToplevelExport::default(),
            outbox: Outbox::default(),
            collaborators,
            grab: None,
            pointer: Point::ZERO,
            serial: 0,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowObject> {
        self.windows.get(&id)
    }

    pub fn is_registered(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowObject> {
        self.windows.values()
    }

    pub fn z_order(&self) -> &[WindowId] {
        self.stacking.z_order()
    }

    pub fn layer(&self, layer: Layer) -> &[WindowId] {
        self.stacking.layer(layer)
    }

    pub fn desktop_windows(&self) -> &[WindowId] {
        self.stacking.desktop()
    }

    pub fn stacking(&self) -> &StackingLists {
        &self.stacking
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.active
    }

    pub fn outputs(&self) -> &OutputAssigner {
        &self.outputs
    }

    pub fn power_state(&self) -> PowerState {
        self.idle.state()
    }

    pub fn idle(&self) -> &IdlePowerController {
        &self.idle
    }

    pub fn activation(&self) -> &ActivationArbiter {
        &self.activation
    }

    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    pub fn published_stacking(&self) -> Option<&str> {
        self.foreign_toplevels.last_published()
    }

    pub fn has_control_object(&self, id: WindowId) -> bool {
        self.foreign_toplevels.has_control(id)
    }

    /// Events queued since the last drain, oldest first.
    pub fn take_events(&mut self) -> Vec<(ClientId, ClientEvent)> {
        self.outbox.drain()
    }

    pub fn pending_events(&self) -> &[(ClientId, ClientEvent)] {
        self.outbox.pending()
    }

    pub(crate) fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1).max(1);
        self.serial
    }

    pub(crate) fn last_serial(&self) -> u32 {
        self.serial
    }

    // --- Error reporting ---

    /// Routes a handler result: protocol errors go to the client, stale ids are
    /// logged, exhaustion becomes a no-memory notice.
    pub(crate) fn report<T>(&mut self, client: ClientId, result: CompositorResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(CompositorError::Protocol(err)) => {
                warn!(%client, code = %err.kind, message = %err.message, "Protocol violation");
                self.outbox.push(
                    client,
                    ClientEvent::ProtocolError {
                        code: err.kind,
                        message: err.message,
                    },
                );
                None
            }
            Err(CompositorError::StaleWindow(window)) => {
                warn!(%client, %window, "Request names an unregistered window, ignoring");
                None
            }
            Err(CompositorError::ResourceExhausted { limit }) => {
                warn!(%client, limit, "Window table full, dropping request");
                self.outbox.push(client, ClientEvent::NoMemory);
                None
            }
            Err(other) => {
                error!(%client, error = %other, "Request failed");
                None
            }
        }
    }

    /// The window `id`, provided `client` owns it.
    pub(crate) fn owned(&self, client: ClientId, id: WindowId) -> CompositorResult<&WindowObject> {
        let window = self.windows.get(&id).ok_or(CompositorError::StaleWindow(id))?;
        if window.client != client {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidObject,
                format!("window {} belongs to another client", id),
            )
            .into());
        }
        Ok(window)
    }

    pub(crate) fn owned_mut(&mut self, client: ClientId, id: WindowId) -> CompositorResult<&mut WindowObject> {
        self.owned(client, id)?;
        self.windows.get_mut(&id).ok_or(CompositorError::StaleWindow(id))
    }

    /// Like [`Self::owned`], additionally requiring one of `roles`.
    pub(crate) fn owned_with_role(
        &self,
        client: ClientId,
        id: WindowId,
        roles: &[RoleKind],
    ) -> CompositorResult<&WindowObject> {
        let window = self.owned(client, id)?;
        let kind = window.role.kind();
        if !roles.contains(&kind) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidObject,
                format!("window {} has role {:?}, expected one of {:?}", id, kind, roles),
            )
            .into());
        }
        Ok(window)
    }

    // --- Clients ---

    pub fn connect_client(&mut self, client: ClientId) {
        debug!(%client, "Client connected");
        self.clients.connect(client);
    }

    /// The transport saw the connection fail. Teardown happens on the next
    /// activation of one of its windows or on [`Self::client_disconnected`].
    pub fn mark_client_lost(&mut self, client: ClientId) {
        warn!(%client, "Client connection lost");
        self.clients.mark_lost(client);
    }

    /// Destroys every window of `client` and drops its tokens, inhibitors and registrations.
    pub fn client_disconnected(&mut self, client: ClientId) {
        info!(%client, "Client disconnected, tearing down its windows");
        self.clients.mark_lost(client);

        let mut owned: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.client == client)
            .map(|w| w.id)
            .collect();
        owned.sort();
        for id in owned {
            if self.windows.contains_key(&id) {
                self.destroy_window(id);
            }
        }

        let inhibitors: Vec<InhibitorId> = self
            .inhibitors
            .iter()
            .filter(|(_, inhibitor)| inhibitor.client == client)
            .map(|(id, _)| *id)
            .collect();
        for inhibitor in inhibitors {
            self.release_inhibitor(inhibitor);
        }

        self.activation.forget_client(client);
        self.menus.forget_client(client);
        self.clients.remove(client);
        self.outbox.discard_client(client);
    }

    // --- Surfaces ---

    /// Allocates a window object for a new client surface.
    pub fn create_surface(&mut self, client: ClientId) -> Option<WindowId> {
        let result = self.try_create_surface(client);
        self.report(client, result)
    }

    fn try_create_surface(&mut self, client: ClientId) -> CompositorResult<WindowId> {
        let limit = self.config.limits.max_windows;
        if self.windows.len() >= limit {
            return Err(CompositorError::ResourceExhausted { limit });
        }
        self.next_window_id += 1;
        let id = WindowId::from_raw(self.next_window_id);
        self.windows.insert(id, WindowObject::new(id, client));
        debug!(%client, window = %id, "Surface created");
        Ok(id)
    }

    /// The seat uses `surface` as a cursor image.
    pub fn set_cursor_surface(&mut self, client: ClientId, surface: WindowId) {
        let result = self.owned_mut(client, surface).map(|w| {
            w.flags |= WindowFlags::CURSOR;
        });
        self.report(client, result);
    }

    pub fn destroy_surface(&mut self, client: ClientId, surface: WindowId) {
        let result = self.owned(client, surface).map(|_| ());
        if self.report(client, result).is_some() {
            self.destroy_window(surface);
        }
    }

    /// Applies a surface commit, mapping or unmapping the window as its role dictates.
    pub fn commit(&mut self, client: ClientId, surface: WindowId, commit: SurfaceCommit) {
        let result = self.handle_commit(client, surface, commit);
        self.report(client, result);
    }

    fn handle_commit(&mut self, client: ClientId, id: WindowId, commit: SurfaceCommit) -> CompositorResult<()> {
        let window = self.owned_mut(client, id)?;
        window.buffer_scale = commit.buffer_scale.max(1);
        let kind = window.role.kind();
        let legacy_popup = matches!(window.role, WindowRole::LegacyShell(LegacyKind::Popup));
        match kind {
            RoleKind::Unbound => {
                if let Some(size) = commit.buffer {
                    window.content_size = size;
                }
                Ok(())
            }
            RoleKind::LayerSurface => self.commit_layer_surface(id, commit.buffer),
            RoleKind::XdgPopup => self.commit_popup(id, commit.buffer),
            RoleKind::LegacyShell if legacy_popup => self.commit_popup(id, commit.buffer),
            _ => {
                self.commit_toplevel(id, commit.buffer);
                Ok(())
            }
        }
    }

    /// Tears `id` down and removes every reference to it.
    ///
    /// Popup children go with it; toplevel children are orphaned. If it held
    /// focus, the next window in line takes over.
    pub fn destroy_window(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            warn!(window = %id, "Destroy requested for unregistered window");
            return;
        };
        let parent = window.parent;
        let children = window.children.clone();
        let layer_output = window.role.layer_state().map(|s| s.output);
        debug!(window = %id, role = ?window.role.kind(), "Destroying window");

        for child in children {
            let is_popup_child = self
                .windows
                .get(&child)
                .is_some_and(|c| c.parent == Some(ParentLink::Popup(id)));
            if is_popup_child {
                if let Some(c) = self.windows.get(&child) {
                    self.outbox.push(c.client, ClientEvent::Closed { window: child });
                }
                self.destroy_window(child);
            } else if let Some(c) = self.windows.get_mut(&child) {
                c.parent = None;
                if c.surface_type == SurfaceType::TopLevelTool {
                    c.surface_type = SurfaceType::TopLevel;
                }
                debug!(window = %child, "Orphaned transient child");
            }
        }

        if let Some(parent) = parent.and_then(|p| self.windows.get_mut(&p.id())) {
            parent.children.retain(|c| *c != id);
        }

        self.stacking.remove_everywhere(id);
        let had_reservation = self.outputs.release(id).is_some();
        self.pipeline.forget(id);
        self.activation.forget_surface(id);
        self.menus.forget_window(id);
        self.foreign_toplevels
            .remove_control(self.collaborators.window_management.as_mut(), id);
        if matches!(self.grab, Some(g) if g.window() == id) {
            self.grab = None;
        }
        let inhibitors: Vec<InhibitorId> = self
            .inhibitors
            .iter()
            .filter(|(_, inhibitor)| inhibitor.surface == id)
            .map(|(inhibitor_id, _)| *inhibitor_id)
            .collect();
        for inhibitor in inhibitors {
            self.release_inhibitor(inhibitor);
        }

        self.windows.remove(&id);
        if self.activated == Some(id) {
            self.activated = None;
        }

        if self.active == Some(id) {
            self.active = None;
            self.raise_next_in_line();
        }
        if had_reservation {
            if let Some(output) = layer_output {
                self.rearrange_output(output);
            }
        }
        self.publish_stacking();
    }

    // --- Outputs ---

    pub fn add_output(&mut self, name: impl Into<String>, geometry: Rect, scale: i32) -> OutputId {
        self.outputs.add_output(name, geometry, scale)
    }

    /// Removes an output. Layer surfaces bound to it are closed and unmapped.
    pub fn remove_output(&mut self, output: OutputId) {
        self.outputs.remove_output(output);
        let stranded: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| w.role.layer_state().is_some_and(|s| s.output == output))
            .map(|w| w.id)
            .collect();
        for id in stranded {
            if let Some(window) = self.windows.get(&id) {
                self.outbox.push(window.client, ClientEvent::Closed { window: id });
            }
            self.unmap_window(id);
        }
        self.refresh_views();
    }

    /// Public form of [`OutputAssigner::corrected_position`].
    pub fn corrected_position(&self, point: Point) -> Point {
        self.outputs.corrected_position(point)
    }

    pub(crate) fn refresh_views(&mut self) {
        let metrics = &self.config.decoration;
        for window in self.windows.values_mut() {
            window.update_views(&self.outputs, metrics);
        }
    }

    // --- Configuration ---

    /// Re-applies decoration metrics, idle timeouts and token lifetime.
    pub fn apply_config(&mut self, config: CoreConfig) {
        let decoration_changed = config.decoration != self.config.decoration;
        self.idle
            .set_timeouts(config.idle.display_timeout(), config.idle.system_timeout());
        self.activation
            .set_lifetime(Duration::from_secs(config.activation.token_lifetime_secs));
        self.config = config;

        if decoration_changed {
            let ids: Vec<WindowId> = self.windows.keys().copied().collect();
            for id in ids {
                self.pipeline.mark_redecoration(id);
            }
            self.refresh_views();
        }
        info!(decoration_changed, "Configuration applied");
    }

    /// Applies the provider's configuration if its generation moved.
    pub fn sync_config(&mut self, provider: &dyn ConfigProvider) {
        let generation = provider.generation();
        if self.config_generation == Some(generation) {
            return;
        }
        self.config_generation = Some(generation);
        self.apply_config(provider.get_config().clone());
    }

    // --- Idle and power ---

    fn apply_idle_transitions(&mut self, transitions: impl IntoIterator<Item = IdleTransition>) {
        for transition in transitions {
            match transition {
                IdleTransition::DisplaySleep => self.collaborators.power.display_sleep(),
                IdleTransition::SystemSleep => self.collaborators.power.system_sleep(),
                IdleTransition::Wake => self.collaborators.power.wake(),
            }
        }
    }

    pub fn advance_idle(&mut self, dt: Duration) {
        let fired = self.idle.advance(dt);
        self.apply_idle_transitions(fired);
    }

    /// Input activity from any seat.
    pub fn notify_activity(&mut self) {
        let fired = self.idle.wake();
        self.apply_idle_transitions(fired);
    }

    /// Explicit wake request (power button, lid open).
    pub fn wake(&mut self) {
        self.notify_activity();
    }

    pub(crate) fn release_inhibitor(&mut self, inhibitor: InhibitorId) {
        if self.inhibitors.remove(&inhibitor).is_some() {
            let fired = self.idle.uninhibit();
            self.apply_idle_transitions(fired);
        }
    }

    // --- Frame ---

    /// One event-loop tick: idle timers, token expiry, interactive grabs,
    /// animations, then a frame.
    pub fn tick(&mut self, dt: Duration) -> FrameReport {
        self.advance_idle(dt);
        self.activation.advance(dt);
        self.apply_grab();

        let mut animated = HashMap::new();
        for window in self.windows.values_mut() {
            if let Some(frame) = window.toplevel.tick(dt) {
                animated.insert(window.id, frame);
                self.pipeline.mark_present(window.id);
            }
        }
        self.render_frame(&animated)
    }

    fn render_frame(&mut self, animated: &HashMap<WindowId, Rect>) -> FrameReport {
        let metrics = self.config.decoration.clone();
        let mut report = FrameReport::default();
        for (id, marks) in self.pipeline.drain() {
            let Some(window) = self.windows.get(&id) else {
                continue;
            };
            let frame = animated
                .get(&id)
                .copied()
                .unwrap_or_else(|| window.frame_rect(&metrics));
            if marks.contains(FrameMarks::NEEDS_REDECORATION)
                && window.flags.contains(WindowFlags::SERVER_DECORATED)
            {
                let request = DecorationRequest {
                    window: id,
                    title: window.title.clone(),
                    frame,
                    activated: window.is_activated(),
                    buffer_scale: window.buffer_scale,
                };
                self.collaborators.decorations.redecorate(&request);
                report.redecorated.push(id);
            }
            if marks.contains(FrameMarks::NEEDS_PRESENT) && window.initialized && !window.is_minimized() {
                report.presented.push((id, frame));
            }
        }
        report
    }
}
