// stratum-compositor/src/protocols/legacy_shell.rs

//! Legacy `wl_shell` adapter.
//!
//! A shell surface starts without a kind and does not map until the client
//! picks toplevel, transient or popup. Configures are not acked, so state
//! changes apply immediately.

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::error::{CompositorError, CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::{Anchor, LegacyKind, ParentLink, RoleKind, SurfaceType, ToplevelState, WindowId, WindowRole};
use stratum_core::Point;
use tracing::debug;

const LEGACY: &[RoleKind] = &[RoleKind::LegacyShell];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyShellRequest {
    GetShellSurface { surface: WindowId },
    SetToplevel { surface: WindowId },
    /// Dialog-style window placed at `offset` from the parent's frame origin.
    SetTransient { surface: WindowId, parent: WindowId, offset: Point },
    SetPopup { surface: WindowId, parent: WindowId, offset: Point },
    SetMaximized { surface: WindowId },
    SetFullscreen { surface: WindowId },
    SetTitle { surface: WindowId, title: String },
    SetClass { surface: WindowId, class: String },
    Move { surface: WindowId },
    Resize { surface: WindowId, edges: Anchor },
}

impl Desktop {
    pub fn handle_legacy_shell(&mut self, client: ClientId, request: LegacyShellRequest) {
        let result = self.dispatch_legacy_shell(client, request);
        self.report(client, result);
    }

    fn dispatch_legacy_shell(&mut self, client: ClientId, request: LegacyShellRequest) -> CompositorResult<()> {
        match request {
            LegacyShellRequest::GetShellSurface { surface } => {
                self.owned_mut(client, surface)?
                    .bind_role(WindowRole::LegacyShell(LegacyKind::Unset))?;
                debug!(%client, window = %surface, "Legacy shell surface created");
                Ok(())
            }
            LegacyShellRequest::SetToplevel { surface } => {
                self.set_legacy_kind(client, surface, LegacyKind::Toplevel)?;
                self.unlink_parent(surface);
                if let Some(window) = self.windows.get_mut(&surface) {
                    window.surface_type = SurfaceType::TopLevel;
                }
                Ok(())
            }
            LegacyShellRequest::SetTransient { surface, parent, offset } => {
                self.owned(client, parent)?;
                self.set_legacy_kind(client, surface, LegacyKind::Transient)?;
                self.unlink_parent(surface);
                if let Some(window) = self.windows.get_mut(&surface) {
                    window.surface_type = SurfaceType::TopLevel;
                }
                self.set_toplevel_parent(client, surface, Some(parent))?;
                let origin = self
                    .frame_rect(parent)
                    .map(|frame| frame.origin + offset)
                    .ok_or(CompositorError::StaleWindow(parent))?;
                if let Some(window) = self.windows.get_mut(&surface) {
                    window.position = origin;
                    window.placed = true;
                }
                Ok(())
            }
            LegacyShellRequest::SetPopup { surface, parent, offset } => {
                self.owned(client, parent)?;
                self.check_popup_parent(surface, parent)?;
                self.set_legacy_kind(client, surface, LegacyKind::Popup)?;
                self.link_parent(surface, ParentLink::Popup(parent));
                if let Some(window) = self.windows.get_mut(&surface) {
                    window.surface_type = SurfaceType::Popup;
                    window.relative_position = offset;
                }
                Ok(())
            }
            LegacyShellRequest::SetMaximized { surface } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.request_state(surface, ToplevelState::Maximized)
            }
            LegacyShellRequest::SetFullscreen { surface } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.request_state(surface, ToplevelState::Fullscreen)
            }
            LegacyShellRequest::SetTitle { surface, title } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.set_title(client, surface, title)
            }
            LegacyShellRequest::SetClass { surface, class } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.set_app_id(client, surface, class)
            }
            LegacyShellRequest::Move { surface } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.start_move(surface);
                Ok(())
            }
            LegacyShellRequest::Resize { surface, edges } => {
                self.owned_with_role(client, surface, LEGACY)?;
                self.start_resize(surface, edges);
                Ok(())
            }
        }
    }

    /// Switching between toplevel kinds is allowed; a mapped popup stays a popup.
    fn set_legacy_kind(&mut self, client: ClientId, surface: WindowId, kind: LegacyKind) -> CompositorResult<()> {
        self.owned_with_role(client, surface, LEGACY)?;
        let Some(window) = self.windows.get_mut(&surface) else {
            return Err(CompositorError::StaleWindow(surface));
        };
        let current = match window.role {
            WindowRole::LegacyShell(current) => current,
            _ => LegacyKind::Unset,
        };
        let popup_switch = (current == LegacyKind::Popup) != (kind == LegacyKind::Popup);
        if window.initialized && current != LegacyKind::Unset && popup_switch {
            return Err(ProtocolError::new(
                ProtocolErrorKind::Role,
                format!("mapped legacy surface {} cannot switch between popup and toplevel", surface),
            )
            .into());
        }
        window.role = WindowRole::LegacyShell(kind);
        debug!(window = %surface, ?kind, "Legacy shell kind set");
        Ok(())
    }
}
