// stratum-compositor/src/stacking.rs

//! Stacking lists and the focus/raise engine.
//!
//! Managed windows live in the z-order (bottom to top). Layer surfaces live in
//! exactly one of four layer lists instead. The desktop list remembers
//! background surfaces in the order they became desktops.

use crate::client::ClientEvent;
use crate::desktop::Desktop;
use crate::window::{Layer, ParentLink, SurfaceType, WindowFlags, WindowId, WindowRole};
use tracing::{debug, trace, warn};

/// Bound on how often [`Desktop::raise_next_in_line`] restarts its scan.
pub const MAX_RAISE_NEXT_RESTARTS: usize = 8;

/// Bound on transient-child chains followed by [`Desktop::raise`].
pub const MAX_TRANSIENT_DEPTH: usize = 16;

#[derive(Debug, Default)]
pub struct StackingLists {
    z_order: Vec<WindowId>,
    layers: [Vec<WindowId>; 4],
    desktop: Vec<WindowId>,
}

impl StackingLists {
    pub fn z_order(&self) -> &[WindowId] {
        &self.z_order
    }

    pub fn layer(&self, layer: Layer) -> &[WindowId] {
        &self.layers[layer.index()]
    }

    pub fn desktop(&self) -> &[WindowId] {
        &self.desktop
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.z_order.contains(&window)
    }

    pub fn top(&self) -> Option<WindowId> {
        self.z_order.last().copied()
    }

    pub fn layer_of(&self, window: WindowId) -> Option<Layer> {
        Layer::ALL
            .into_iter()
            .find(|layer| self.layers[layer.index()].contains(&window))
    }

    /// Moves (or inserts) `window` to the top of the z-order.
    pub fn push_top(&mut self, window: WindowId) {
        self.remove_from_layers(window);
        self.z_order.retain(|w| *w != window);
        self.z_order.push(window);
    }

    pub fn push_bottom(&mut self, window: WindowId) {
        self.remove_from_layers(window);
        self.z_order.retain(|w| *w != window);
        self.z_order.insert(0, window);
    }

    pub fn remove_from_z_order(&mut self, window: WindowId) -> bool {
        let before = self.z_order.len();
        self.z_order.retain(|w| *w != window);
        before != self.z_order.len()
    }

    /// Puts `window` on top of `layer`, out of the z-order and any other layer.
    pub fn insert_layer(&mut self, layer: Layer, window: WindowId) {
        self.remove_from_z_order(window);
        self.remove_from_layers(window);
        self.layers[layer.index()].push(window);
    }

    pub fn remove_from_layers(&mut self, window: WindowId) {
        for list in self.layers.iter_mut() {
            list.retain(|w| *w != window);
        }
    }

    pub fn add_desktop(&mut self, window: WindowId) {
        if !self.desktop.contains(&window) {
            self.desktop.push(window);
        }
    }

    pub fn remove_desktop(&mut self, window: WindowId) {
        self.desktop.retain(|w| *w != window);
    }

    pub fn remove_everywhere(&mut self, window: WindowId) {
        self.remove_from_z_order(window);
        self.remove_from_layers(window);
        self.remove_desktop(window);
    }

    /// Whether `window` appears in any list.
    pub fn references(&self, window: WindowId) -> bool {
        self.z_order.contains(&window)
            || self.layers.iter().any(|l| l.contains(&window))
            || self.desktop.contains(&window)
    }
}

impl Desktop {
    /// Moves `id` to the top of the z-order and gives it focus.
    ///
    /// Cursor and desktop surfaces are left alone. A window outside the
    /// z-order (layer surface, still initializing) is only activated. A
    /// minimized window is restored first. A transient child follows its
    /// parent to the top.
    pub fn raise(&mut self, id: WindowId) {
        self.raise_with_depth(id, 0);
    }

    fn raise_with_depth(&mut self, id: WindowId, depth: usize) {
        if depth > MAX_TRANSIENT_DEPTH {
            warn!(window = %id, "Transient chain too deep, stopping raise");
            return;
        }
        let Some(window) = self.windows.get(&id) else {
            warn!(window = %id, "Raise requested for unregistered window");
            return;
        };
        if window.is_special() {
            trace!(window = %id, "Special surface is not raised");
            return;
        }
        if window.is_minimized() {
            self.unminimize(id);
        }

        let in_z_order = self.stacking.contains(id);
        if self.active == Some(id) && (!in_z_order || self.stacking.top() == Some(id)) {
            trace!(window = %id, "Already active and on top");
            return;
        }
        if in_z_order {
            self.stacking.push_top(id);
        }
        self.activate(id);

        let child = self.windows.get(&id).and_then(|w| {
            w.children.iter().copied().find(|c| {
                self.windows.get(c).is_some_and(|cw| {
                    cw.parent == Some(ParentLink::Toplevel(id)) && cw.initialized && !cw.is_minimized()
                })
            })
        });
        if let Some(child) = child {
            if child != id {
                self.raise_with_depth(child, depth + 1);
            }
        }
    }

    /// Gives `id` input focus without changing the stacking order.
    pub fn activate(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            warn!(window = %id, "Activation requested for unregistered window");
            return;
        };
        if self.clients.is_lost(window.client) {
            debug!(window = %id, client = %window.client, "Activating window of lost client, tearing it down");
            self.destroy_window(id);
            return;
        }
        let receives = window.role.receives_activation();

        if receives {
            if let Some(previous) = self.activated.filter(|p| *p != id) {
                self.deactivate(previous);
            }
            self.activated = Some(id);
        }
        self.active = Some(id);

        if let Some(window) = self.windows.get_mut(&id) {
            if receives && !window.flags.contains(WindowFlags::ACTIVATED) {
                window.flags |= WindowFlags::ACTIVATED;
                let client = window.client;
                self.outbox.push(client, ClientEvent::Activated { window: id });
                self.pipeline.mark_redecoration(id);
            }
        }
        debug!(window = %id, "Window activated");

        self.notify_menu_server(id);
        self.publish_stacking();
    }

    /// Clears the activated state of `id` if its role carries one.
    pub(crate) fn deactivate(&mut self, id: WindowId) {
        if self.activated == Some(id) {
            self.activated = None;
        }
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        if !window.role.receives_activation() || !window.flags.contains(WindowFlags::ACTIVATED) {
            return;
        }
        window.flags.remove(WindowFlags::ACTIVATED);
        let client = window.client;
        self.outbox.push(client, ClientEvent::Deactivated { window: id });
        self.pipeline.mark_redecoration(id);
    }

    fn is_successor_candidate(&self, id: WindowId) -> bool {
        self.windows.get(&id).is_some_and(|w| {
            w.initialized && !w.is_minimized() && !w.is_special() && w.role.is_real()
        })
    }

    /// Hands focus to the topmost eligible window after the active one went away.
    ///
    /// Falls back to the most recent desktop surface; with none, focus stays empty.
    pub fn raise_next_in_line(&mut self) {
        let mut restarts = 0;
        'scan: loop {
            let snapshot_len = self.stacking.z_order().len();
            for index in (0..snapshot_len).rev() {
                let Some(candidate) = self.stacking.z_order().get(index).copied() else {
                    break;
                };
                if !self.is_successor_candidate(candidate) {
                    continue;
                }
                self.activate(candidate);
                if self.stacking.z_order().len() != snapshot_len {
                    restarts += 1;
                    if restarts > MAX_RAISE_NEXT_RESTARTS {
                        warn!(restarts, "Giving up on finding the next window to activate");
                        return;
                    }
                    debug!(restarts, "Stacking changed during successor scan, restarting");
                    continue 'scan;
                }
                return;
            }
            break;
        }

        match self.stacking.desktop().last().copied() {
            Some(desktop) => {
                debug!(window = %desktop, "No eligible window, activating desktop");
                self.activate(desktop);
            }
            None => trace!("No window left to activate"),
        }
    }

    /// Sends `id` to the bottom of the z-order.
    pub fn lower(&mut self, id: WindowId) {
        if !self.stacking.contains(id) {
            warn!(window = %id, "Lower requested for window outside the z-order");
            return;
        }
        self.stacking.push_bottom(id);
        if self.active == Some(id) {
            self.raise_next_in_line();
        }
        self.publish_stacking();
    }

    /// Moves a layer surface to `layer`. Background turns it into the desktop surface.
    pub fn reset_layer_shell_layer(&mut self, id: WindowId, layer: Layer) {
        let metrics = self.config.decoration.clone();
        let Some(window) = self.windows.get_mut(&id) else {
            warn!(window = %id, "Layer change requested for unregistered window");
            return;
        };
        let Some(state) = window.role.layer_state_mut() else {
            warn!(window = %id, role = ?window.role.kind(), "Layer change requested for non-layer window");
            return;
        };
        state.current.layer = layer;
        state.pending.layer = layer;
        let output = state.output;

        self.stacking.remove_from_z_order(id);
        self.stacking.insert_layer(layer, id);

        if layer == Layer::Background {
            self.foreign_toplevels
                .remove_control(self.collaborators.window_management.as_mut(), id);
            self.outputs.release(id);
            let geometry = self
                .outputs
                .available_geometry(output)
                .or_else(|| self.outputs.first().map(|o| o.geometry));

            let serial = self.next_serial();
            if let Some(window) = self.windows.get_mut(&id) {
                window.flags.remove(WindowFlags::SERVER_DECORATED);
                window.surface_type = SurfaceType::Desktop;
                if let Some(geometry) = geometry {
                    window.position = geometry.origin;
                    window.content_size = geometry.size;
                }
                let size = window.content_size;
                if let WindowRole::LayerSurface(state) = &mut window.role {
                    state.configure_serial = Some(serial);
                    state.configured_size = size;
                }
                let client = window.client;
                self.outbox.push(client, ClientEvent::LayerConfigure { window: id, serial, size });
            }
            self.stacking.add_desktop(id);
            debug!(window = %id, "Layer surface became the desktop");
        } else if window_is_desktop(self, id) {
            if let Some(window) = self.windows.get_mut(&id) {
                window.surface_type = SurfaceType::LayerShell;
            }
            self.stacking.remove_desktop(id);
        }

        if let Some(window) = self.windows.get_mut(&id) {
            window.update_views(&self.outputs, &metrics);
        }
        self.pipeline.mark_present(id);
        self.rearrange_output(output);
        self.publish_stacking();
    }

    /// Republishes the z-order to window-management consumers if it changed.
    pub(crate) fn publish_stacking(&mut self) {
        let order = self
            .stacking
            .z_order()
            .iter()
            .filter_map(|id| self.windows.get(id))
            .filter(|w| w.initialized && !w.is_special())
            .map(|w| w.uuid.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.foreign_toplevels
            .publish(self.collaborators.window_management.as_mut(), order);
    }

    pub(crate) fn notify_menu_server(&mut self, id: WindowId) {
        let Some(server) = self.menus.server() else {
            return;
        };
        let address = self.menus.address_for(id);
        self.outbox.push(
            server,
            ClientEvent::ActiveWindowChanged {
                service: address.service,
                object_path: address.object_path,
            },
        );
    }
}

fn window_is_desktop(desktop: &Desktop, id: WindowId) -> bool {
    desktop
        .windows
        .get(&id)
        .is_some_and(|w| w.surface_type == SurfaceType::Desktop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: u64) -> WindowId {
        WindowId::from_raw(n)
    }

    #[test]
    fn push_top_moves_to_end() {
        let mut lists = StackingLists::default();
        lists.push_top(id(1));
        lists.push_top(id(2));
        lists.push_top(id(1));
        assert_eq!(lists.z_order(), &[id(2), id(1)]);
        assert_eq!(lists.top(), Some(id(1)));
    }

    #[test]
    fn layer_membership_excludes_z_order() {
        let mut lists = StackingLists::default();
        lists.push_top(id(1));
        lists.insert_layer(Layer::Top, id(1));
        assert!(!lists.contains(id(1)));
        assert_eq!(lists.layer_of(id(1)), Some(Layer::Top));
        lists.insert_layer(Layer::Overlay, id(1));
        assert!(lists.layer(Layer::Top).is_empty());
        lists.push_top(id(1));
        assert_eq!(lists.layer_of(id(1)), None);
    }

    #[test]
    fn remove_everywhere_clears_all_lists() {
        let mut lists = StackingLists::default();
        lists.insert_layer(Layer::Background, id(4));
        lists.add_desktop(id(4));
        lists.add_desktop(id(4));
        assert_eq!(lists.desktop(), &[id(4)]);
        lists.remove_everywhere(id(4));
        assert!(!lists.references(id(4)));
    }

    #[test]
    fn push_bottom_inserts_first() {
        let mut lists = StackingLists::default();
        lists.push_top(id(1));
        lists.push_top(id(2));
        lists.push_bottom(id(2));
        assert_eq!(lists.z_order(), &[id(2), id(1)]);
    }
}
