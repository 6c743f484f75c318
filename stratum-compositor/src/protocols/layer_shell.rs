// stratum-compositor/src/protocols/layer_shell.rs

//! Layer-shell adapter.
//!
//! Requests land in the surface's pending properties and take effect on
//! commit. The initial commit negotiates a size and sends a configure; the
//! surface maps once that configure is acked and a buffer is attached.
//! Surfaces with an exclusive zone reserve a band on their output, which
//! shrinks the area available to everything else.

use crate::client::{ClientEvent, ClientId};
use crate::desktop::Desktop;
use crate::error::{CompositorError, CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::output::OutputId;
use crate::window::anchor::{anchored_position, exclusive_edge, negotiate_size};
use crate::window::{
    Anchor, Edge, Layer, LayerProperties, LayerState, Margins, RoleKind, SurfaceType, WindowId, WindowRole,
};
use stratum_core::{Rect, Size};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerShellRequest {
    GetLayerSurface {
        surface: WindowId,
        /// `None` lets the compositor pick.
        output: Option<OutputId>,
        layer: Layer,
        namespace: String,
    },
    SetSize {
        surface: WindowId,
        size: Size,
    },
    SetAnchor {
        surface: WindowId,
        anchor: Anchor,
    },
    SetExclusiveZone {
        surface: WindowId,
        zone: i32,
    },
    SetMargin {
        surface: WindowId,
        margins: Margins,
    },
    SetKeyboardInteractivity {
        surface: WindowId,
        interactive: bool,
    },
    SetLayer {
        surface: WindowId,
        layer: Layer,
    },
    AckConfigure {
        surface: WindowId,
        serial: u32,
    },
    Destroy {
        surface: WindowId,
    },
}

/// Geometry a layer surface gets from one arrangement pass.
struct Arrangement {
    frame: Rect,
    reservation: Option<(Edge, i32)>,
}

/// The area a layer surface is laid out in.
///
/// Surfaces that reserve space, or ask to ignore other reservations with
/// `-1`, use the whole output; the rest stay clear of reserved bands.
fn arrangement_area(desktop: &Desktop, output: OutputId, props: &LayerProperties) -> Option<Rect> {
    if props.layer == Layer::Background || (props.exclusive_zone <= 0 && props.exclusive_zone != -1) {
        desktop.outputs.available_geometry(output)
    } else {
        desktop.outputs.output_geometry(output)
    }
}

fn arrange(area: Rect, props: &LayerProperties) -> Result<Arrangement, ProtocolError> {
    if props.layer == Layer::Background {
        return Ok(Arrangement {
            frame: area,
            reservation: None,
        });
    }
    let size = negotiate_size(area, props.anchor, props.desired_size, props.margins)?;
    let origin = anchored_position(area, props.anchor, size, props.margins);
    let reservation = match exclusive_edge(props.anchor) {
        Some(edge) if props.exclusive_zone > 0 => Some((edge, props.exclusive_zone + props.margins.on(edge))),
        _ => None,
    };
    Ok(Arrangement {
        frame: Rect::from_parts(origin, size),
        reservation,
    })
}

impl Desktop {
    pub fn handle_layer_shell(&mut self, client: ClientId, request: LayerShellRequest) {
        let result = self.dispatch_layer_shell(client, request);
        self.report(client, result);
    }

    fn dispatch_layer_shell(&mut self, client: ClientId, request: LayerShellRequest) -> CompositorResult<()> {
        match request {
            LayerShellRequest::GetLayerSurface {
                surface,
                output,
                layer,
                namespace,
            } => self.get_layer_surface(client, surface, output, layer, namespace),
            LayerShellRequest::SetSize { surface, size } => {
                if size.width < 0 || size.height < 0 {
                    return Err(ProtocolError::new(
                        ProtocolErrorKind::InvalidSize,
                        format!("negative layer size {}x{}", size.width, size.height),
                    )
                    .into());
                }
                self.layer_pending_mut(client, surface)?.desired_size = size;
                Ok(())
            }
            LayerShellRequest::SetAnchor { surface, anchor } => {
                self.layer_pending_mut(client, surface)?.anchor = anchor;
                Ok(())
            }
            LayerShellRequest::SetExclusiveZone { surface, zone } => {
                self.layer_pending_mut(client, surface)?.exclusive_zone = zone.max(-1);
                Ok(())
            }
            LayerShellRequest::SetMargin { surface, margins } => {
                self.layer_pending_mut(client, surface)?.margins = margins;
                Ok(())
            }
            LayerShellRequest::SetKeyboardInteractivity { surface, interactive } => {
                self.layer_pending_mut(client, surface)?.keyboard_interactive = interactive;
                Ok(())
            }
            LayerShellRequest::SetLayer { surface, layer } => {
                self.layer_pending_mut(client, surface)?.layer = layer;
                Ok(())
            }
            LayerShellRequest::AckConfigure { surface, serial } => self.ack_layer_configure(client, surface, serial),
            LayerShellRequest::Destroy { surface } => {
                self.owned_with_role(client, surface, &[RoleKind::LayerSurface])?;
                self.destroy_window(surface);
                Ok(())
            }
        }
    }

    fn get_layer_surface(
        &mut self,
        client: ClientId,
        surface: WindowId,
        output: Option<OutputId>,
        layer: Layer,
        namespace: String,
    ) -> CompositorResult<()> {
        self.owned(client, surface)?;
        let output = output
            .filter(|o| self.outputs.get(*o).is_some())
            .or_else(|| self.outputs.nearest_output(self.pointer).map(|o| o.id));
        let Some(output) = output else {
            warn!(%client, window = %surface, "No output for layer surface, closing it");
            self.outbox.push(client, ClientEvent::Closed { window: surface });
            return Ok(());
        };

        info!(%client, window = %surface, %output, ?layer, namespace = %namespace, "Layer surface requested");
        let window = self.owned_mut(client, surface)?;
        window.bind_role(WindowRole::LayerSurface(Box::new(LayerState {
            namespace,
            output,
            current: LayerProperties::new(layer),
            pending: LayerProperties::new(layer),
            configure_serial: None,
            configured_size: Size::ZERO,
            acked: false,
        })))?;
        window.surface_type = SurfaceType::LayerShell;
        Ok(())
    }

    fn layer_pending_mut(&mut self, client: ClientId, surface: WindowId) -> CompositorResult<&mut LayerProperties> {
        self.owned_with_role(client, surface, &[RoleKind::LayerSurface])?;
        self.windows
            .get_mut(&surface)
            .and_then(|w| w.role.layer_state_mut())
            .map(|s| &mut s.pending)
            .ok_or(CompositorError::StaleWindow(surface))
    }

    fn ack_layer_configure(&mut self, client: ClientId, surface: WindowId, serial: u32) -> CompositorResult<()> {
        self.owned_with_role(client, surface, &[RoleKind::LayerSurface])?;
        if serial == 0 || serial > self.last_serial() {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidSerial,
                format!("serial {} was never sent", serial),
            )
            .into());
        }
        if let Some(state) = self.windows.get_mut(&surface).and_then(|w| w.role.layer_state_mut()) {
            if state.configure_serial.is_some_and(|sent| serial >= sent) {
                state.acked = true;
            }
        }
        Ok(())
    }

    /// Applies pending layer properties and maps or unmaps the surface.
    pub(crate) fn commit_layer_surface(&mut self, id: WindowId, buffer: Option<Size>) -> CompositorResult<()> {
        let window = self.windows.get_mut(&id).ok_or(CompositorError::StaleWindow(id))?;
        let initialized = window.initialized;
        let Some(state) = window.role.layer_state_mut() else {
            return Err(CompositorError::StaleWindow(id));
        };
        let layer_changed = state.pending.layer != state.current.layer;
        let pending = state.pending;
        let output = state.output;

        let area = arrangement_area(self, output, &pending).unwrap_or_default();
        arrange(area, &pending)?;

        if let Some(state) = self.windows.get_mut(&id).and_then(|w| w.role.layer_state_mut()) {
            state.current = pending;
        }
        if layer_changed && initialized {
            self.reset_layer_shell_layer(id, pending.layer);
        }
        self.arrange_layer_surface(id)?;

        match (buffer, initialized) {
            (None, true) => self.unmap_window(id),
            (None, false) => {}
            (Some(size), true) => {
                if let Some(window) = self.windows.get_mut(&id) {
                    window.content_size = size;
                }
                self.pipeline.mark_present(id);
            }
            (Some(size), false) => {
                let acked = self
                    .windows
                    .get(&id)
                    .and_then(|w| w.role.layer_state())
                    .is_some_and(|s| s.acked);
                if acked {
                    self.map_layer_surface(id, size);
                } else {
                    debug!(window = %id, "Layer surface committed a buffer before acking, not mapping");
                }
            }
        }
        Ok(())
    }

    fn map_layer_surface(&mut self, id: WindowId, size: Size) {
        let Some(window) = self.windows.get_mut(&id) else {
            return;
        };
        window.initialized = true;
        window.content_size = size;
        let Some(state) = window.role.layer_state() else {
            return;
        };
        let (layer, output, interactive) = (state.current.layer, state.output, state.current.keyboard_interactive);
        info!(window = %id, ?layer, "Layer surface mapped");

        if layer == Layer::Background {
            self.reset_layer_shell_layer(id, layer);
        } else {
            self.stacking.insert_layer(layer, id);
            self.rearrange_output(output);
        }
        self.pipeline.mark_present(id);
        if interactive {
            self.raise(id);
        }
    }

    /// Lays out one layer surface, updates its reservation and sends a
    /// configure when it has none yet or its size changed.
    fn arrange_layer_surface(&mut self, id: WindowId) -> CompositorResult<()> {
        let metrics = self.config.decoration.clone();
        let (props, output, initialized, configured) = {
            let window = self.windows.get(&id).ok_or(CompositorError::StaleWindow(id))?;
            let state = window.role.layer_state().ok_or(CompositorError::StaleWindow(id))?;
            (state.current, state.output, window.initialized, state.configure_serial.map(|_| state.configured_size))
        };

        // Own band must not shrink the area this surface is laid out in.
        let previous = self.outputs.release(id);
        let area = match arrangement_area(self, output, &props) {
            Some(area) => area,
            None => {
                if let Some(r) = previous {
                    self.outputs.reserve(id, r.output, r.edge, r.amount);
                }
                return Ok(());
            }
        };
        let arrangement = arrange(area, &props)?;
        if let (Some((edge, amount)), true) = (arrangement.reservation, initialized) {
            self.outputs.reserve(id, output, edge, amount);
        }

        let serial = (configured != Some(arrangement.frame.size)).then(|| self.next_serial());
        let Some(window) = self.windows.get_mut(&id) else {
            return Err(CompositorError::StaleWindow(id));
        };
        window.position = arrangement.frame.origin;
        window.content_size = arrangement.frame.size;
        window.update_views(&self.outputs, &metrics);
        if let Some(serial) = serial {
            let client = window.client;
            if let Some(state) = window.role.layer_state_mut() {
                state.configure_serial = Some(serial);
                state.configured_size = arrangement.frame.size;
            }
            self.outbox.push(
                client,
                ClientEvent::LayerConfigure {
                    window: id,
                    serial,
                    size: arrangement.frame.size,
                },
            );
        }
        self.pipeline.mark_present(id);
        Ok(())
    }

    /// Re-lays out every mapped layer surface on `output`, reserving surfaces first.
    pub(crate) fn rearrange_output(&mut self, output: OutputId) {
        let mut surfaces: Vec<(bool, WindowId)> = self
            .windows
            .values()
            .filter(|w| w.initialized)
            .filter_map(|w| {
                let state = w.role.layer_state()?;
                (state.output == output).then_some((state.current.exclusive_zone <= 0, w.id))
            })
            .collect();
        surfaces.sort();
        for (_, id) in surfaces {
            if let Err(err) = self.arrange_layer_surface(id) {
                warn!(window = %id, error = %err, "Layer surface no longer fits its output");
            }
        }
        debug!(%output, bands = ?self.outputs.reserved_bands(output), "Output rearranged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn panel(zone: i32) -> LayerProperties {
        LayerProperties {
            anchor: Anchor::TOP | Anchor::LEFT | Anchor::RIGHT,
            desired_size: Size::new(0, 40),
            exclusive_zone: zone,
            ..LayerProperties::new(Layer::Top)
        }
    }

    #[test]
    fn panel_spans_output_and_reserves_top() {
        let a = arrange(Rect::new(0, 0, 1920, 1080), &panel(40)).unwrap();
        assert_eq!(a.frame, Rect::new(0, 0, 1920, 40));
        assert_eq!(a.reservation, Some((Edge::Top, 40)));
    }

    #[test]
    fn margin_adds_to_reservation() {
        let mut props = panel(30);
        props.margins = Margins::new(5, 0, 0, 0);
        let a = arrange(Rect::new(0, 0, 1920, 1080), &props).unwrap();
        assert_eq!(a.frame.origin.y, 5);
        assert_eq!(a.reservation.map(|(_, amount)| amount), Some(35));
    }

    #[test]
    fn corner_anchor_reserves_nothing() {
        let mut props = panel(40);
        props.anchor = Anchor::TOP | Anchor::LEFT;
        props.desired_size = Size::new(100, 40);
        assert_eq!(arrange(Rect::new(0, 0, 1920, 1080), &props).unwrap().reservation, None);
    }

    #[test]
    fn background_fills_area() {
        let mut props = panel(40);
        props.layer = Layer::Background;
        let a = arrange(Rect::new(0, 41, 1920, 1039), &props).unwrap();
        assert_eq!(a.frame, Rect::new(0, 41, 1920, 1039));
        assert_eq!(a.reservation, None);
    }

    #[test]
    fn zero_width_without_horizontal_anchors_is_invalid() {
        let mut props = panel(0);
        props.anchor = Anchor::TOP;
        let err = arrange(Rect::new(0, 0, 1920, 1080), &props).err().unwrap();
        assert_eq!(err.kind, ProtocolErrorKind::InvalidSize);
    }
}
