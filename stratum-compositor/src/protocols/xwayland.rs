// stratum-compositor/src/protocols/xwayland.rs

//! Bridge for X11 windows hosted by XWayland.
//!
//! The X window manager side associates each X window with its surface and
//! forwards ICCCM state. Override-redirect windows (menus, tooltips) place
//! themselves and never take focus.

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::error::{CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::{RoleKind, WindowId, WindowRole, WmState, XwaylandState};
use stratum_core::Rect;
use tracing::{debug, info};

const X11: &[RoleKind] = &[RoleKind::XWaylandShell];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XwaylandRequest {
    Associate {
        surface: WindowId,
        x11_window: u32,
        override_redirect: bool,
    },
    SetWmState {
        surface: WindowId,
        state: WmState,
    },
    SetWorkspace {
        surface: WindowId,
        workspace: Option<u32>,
    },
    /// `ConfigureRequest` from the X client, in global coordinates.
    Configure {
        surface: WindowId,
        geometry: Rect,
    },
    SetTransientFor {
        surface: WindowId,
        parent: Option<WindowId>,
    },
    SetTitle {
        surface: WindowId,
        title: String,
    },
    SetClass {
        surface: WindowId,
        class: String,
    },
    Destroy {
        surface: WindowId,
    },
}

impl Desktop {
    pub fn handle_xwayland(&mut self, client: ClientId, request: XwaylandRequest) {
        let result = self.dispatch_xwayland(client, request);
        self.report(client, result);
    }

    fn dispatch_xwayland(&mut self, client: ClientId, request: XwaylandRequest) -> CompositorResult<()> {
        match request {
            XwaylandRequest::Associate {
                surface,
                x11_window,
                override_redirect,
            } => {
                let window = self.owned_mut(client, surface)?;
                window.bind_role(WindowRole::XWaylandShell(XwaylandState {
                    x11_window,
                    override_redirect,
                    wm_state: WmState::Withdrawn,
                    workspace: None,
                }))?;
                info!(%client, window = %surface, x11_window, override_redirect, "X11 window associated");
                Ok(())
            }
            XwaylandRequest::SetWmState { surface, state } => self.set_wm_state(client, surface, state),
            XwaylandRequest::SetWorkspace { surface, workspace } => {
                self.owned_with_role(client, surface, X11)?;
                if let Some(WindowRole::XWaylandShell(x)) = self.windows.get_mut(&surface).map(|w| &mut w.role) {
                    x.workspace = workspace;
                }
                Ok(())
            }
            XwaylandRequest::Configure { surface, geometry } => {
                if geometry.size.is_empty() {
                    return Err(ProtocolError::new(
                        ProtocolErrorKind::InvalidSize,
                        format!("configure size {}x{} is empty", geometry.size.width, geometry.size.height),
                    )
                    .into());
                }
                let window = self.owned_with_role(client, surface, X11)?;
                let override_redirect = window.role.is_override_redirect();
                let mapped = window.initialized;
                if override_redirect || !mapped {
                    let metrics = self.config.decoration.clone();
                    if let Some(window) = self.windows.get_mut(&surface) {
                        window.position = geometry.origin;
                        window.content_size = geometry.size;
                        window.placed = true;
                        window.update_views(&self.outputs, &metrics);
                    }
                    self.pipeline.mark_present(surface);
                } else {
                    self.move_window_to(surface, geometry.origin);
                    self.resize_window(surface, geometry.size);
                }
                Ok(())
            }
            XwaylandRequest::SetTransientFor { surface, parent } => {
                self.owned_with_role(client, surface, X11)?;
                self.set_toplevel_parent(client, surface, parent)
            }
            XwaylandRequest::SetTitle { surface, title } => {
                self.owned_with_role(client, surface, X11)?;
                self.set_title(client, surface, title)
            }
            XwaylandRequest::SetClass { surface, class } => {
                self.owned_with_role(client, surface, X11)?;
                self.set_app_id(client, surface, class)
            }
            XwaylandRequest::Destroy { surface } => {
                self.owned_with_role(client, surface, X11)?;
                self.destroy_window(surface);
                Ok(())
            }
        }
    }

    fn set_wm_state(&mut self, client: ClientId, surface: WindowId, state: WmState) -> CompositorResult<()> {
        let window = self.owned_with_role(client, surface, X11)?;
        let mapped = window.initialized;
        let has_content = !window.content_size.is_empty();
        if let Some(WindowRole::XWaylandShell(x)) = self.windows.get_mut(&surface).map(|w| &mut w.role) {
            x.wm_state = state;
        }
        debug!(window = %surface, ?state, "X11 WM_STATE changed");

        match state {
            WmState::Withdrawn => self.unmap_window(surface),
            WmState::Iconic => {
                if mapped {
                    self.minimize(surface);
                }
            }
            WmState::Normal => {
                if !mapped && has_content {
                    self.map_window(surface);
                } else if self.windows.get(&surface).is_some_and(|w| w.is_minimized()) {
                    self.raise(surface);
                }
            }
        }
        Ok(())
    }
}
