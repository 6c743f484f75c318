// stratum-compositor/src/protocols/xdg_shell.rs

//! xdg-shell adapter: toplevels and popups.

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::error::{CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::{Anchor, Positioner, RoleKind, SurfaceType, ToplevelState, WindowId, WindowRole};
use stratum_core::Rect;
use tracing::{debug, info};

const TOPLEVEL: &[RoleKind] = &[RoleKind::XdgToplevel];
const ANY_XDG: &[RoleKind] = &[RoleKind::XdgToplevel, RoleKind::XdgPopup];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XdgShellRequest {
    GetToplevel { surface: WindowId },
    GetPopup { surface: WindowId, parent: WindowId, positioner: Positioner },
    SetParent { surface: WindowId, parent: Option<WindowId> },
    SetTitle { surface: WindowId, title: String },
    SetAppId { surface: WindowId, app_id: String },
    SetMaximized { surface: WindowId },
    UnsetMaximized { surface: WindowId },
    SetFullscreen { surface: WindowId },
    UnsetFullscreen { surface: WindowId },
    SetMinimized { surface: WindowId },
    Move { surface: WindowId },
    Resize { surface: WindowId, edges: Anchor },
    /// Visible content bounds inside the buffer.
    SetWindowGeometry { surface: WindowId, geometry: Rect },
    AckConfigure { surface: WindowId, serial: u32 },
    Destroy { surface: WindowId },
}

impl Desktop {
    pub fn handle_xdg_shell(&mut self, client: ClientId, request: XdgShellRequest) {
        let result = self.dispatch_xdg_shell(client, request);
        self.report(client, result);
    }

    fn dispatch_xdg_shell(&mut self, client: ClientId, request: XdgShellRequest) -> CompositorResult<()> {
        match request {
            XdgShellRequest::GetToplevel { surface } => {
                let window = self.owned_mut(client, surface)?;
                window.bind_role(WindowRole::XdgToplevel)?;
                window.surface_type = SurfaceType::TopLevel;
                info!(%client, window = %surface, "xdg toplevel created");
                Ok(())
            }
            XdgShellRequest::GetPopup {
                surface,
                parent,
                positioner,
            } => {
                if positioner.size.is_empty() {
                    return Err(ProtocolError::new(
                        ProtocolErrorKind::InvalidSize,
                        "popup positioner needs a non-empty size",
                    )
                    .into());
                }
                self.attach_popup(client, surface, parent, WindowRole::XdgPopup(positioner), positioner.offset)?;
                debug!(%client, window = %surface, %parent, "xdg popup created");
                Ok(())
            }
            XdgShellRequest::SetParent { surface, parent } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.set_toplevel_parent(client, surface, parent)
            }
            XdgShellRequest::SetTitle { surface, title } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.set_title(client, surface, title)
            }
            XdgShellRequest::SetAppId { surface, app_id } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.set_app_id(client, surface, app_id)
            }
            XdgShellRequest::SetMaximized { surface } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.request_state(surface, ToplevelState::Maximized)
            }
            XdgShellRequest::SetFullscreen { surface } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.request_state(surface, ToplevelState::Fullscreen)
            }
            XdgShellRequest::UnsetMaximized { surface } => {
                self.leave_state(client, surface, ToplevelState::Maximized)
            }
            XdgShellRequest::UnsetFullscreen { surface } => {
                self.leave_state(client, surface, ToplevelState::Fullscreen)
            }
            XdgShellRequest::SetMinimized { surface } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.minimize(surface);
                Ok(())
            }
            XdgShellRequest::Move { surface } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.start_move(surface);
                Ok(())
            }
            XdgShellRequest::Resize { surface, edges } => {
                self.owned_with_role(client, surface, TOPLEVEL)?;
                self.start_resize(surface, edges);
                Ok(())
            }
            XdgShellRequest::SetWindowGeometry { surface, geometry } => {
                if geometry.size.is_empty() {
                    return Err(ProtocolError::new(
                        ProtocolErrorKind::InvalidSize,
                        format!("window geometry {}x{} is empty", geometry.size.width, geometry.size.height),
                    )
                    .into());
                }
                self.owned_with_role(client, surface, ANY_XDG)?;
                if let Some(window) = self.windows.get_mut(&surface) {
                    window.content_size = geometry.size;
                }
                self.pipeline.mark_redecoration(surface);
                Ok(())
            }
            XdgShellRequest::AckConfigure { surface, serial } => {
                let kind = self.owned_with_role(client, surface, ANY_XDG)?.role.kind();
                if kind == RoleKind::XdgPopup {
                    if serial == 0 || serial > self.last_serial() {
                        return Err(ProtocolError::new(
                            ProtocolErrorKind::InvalidSerial,
                            format!("serial {} was never sent", serial),
                        )
                        .into());
                    }
                    return Ok(());
                }
                self.ack_toplevel_configure(surface, serial)
            }
            XdgShellRequest::Destroy { surface } => {
                self.owned_with_role(client, surface, ANY_XDG)?;
                self.destroy_window(surface);
                Ok(())
            }
        }
    }

    /// Returns to Normal only if `from` is the state being left.
    fn leave_state(&mut self, client: ClientId, surface: WindowId, from: ToplevelState) -> CompositorResult<()> {
        let window = self.owned_with_role(client, surface, TOPLEVEL)?;
        let machine = window.toplevel();
        let heading_to = machine.pending().map(|p| p.target).unwrap_or(machine.state());
        if heading_to != from {
            debug!(window = %surface, ?from, state = ?heading_to, "Not in the state being left, ignoring");
            return Ok(());
        }
        self.request_state(surface, ToplevelState::Normal)
    }
}
