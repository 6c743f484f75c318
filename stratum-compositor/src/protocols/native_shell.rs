// stratum-compositor/src/protocols/native_shell.rs

//! The compositor's own window protocol, in two generations.
//!
//! Clients position and size their windows directly and toggle states through
//! a flag set. Generation A acks configures like xdg-shell; generation B does
//! not, so its transitions apply immediately.

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::error::{CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::{Anchor, NativeShellKind, RoleKind, SurfaceType, ToplevelState, WindowFlags, WindowId, WindowRole};
use stratum_core::{Point, Size};
use tracing::{debug, info};

const NATIVE: &[RoleKind] = &[RoleKind::NativeShellA, RoleKind::NativeShellB];

/// Flags a native client may set; the rest are compositor-owned.
const CLIENT_FLAGS: WindowFlags = WindowFlags::MINIMIZED
    .union(WindowFlags::MAXIMIZED)
    .union(WindowFlags::FULLSCREEN)
    .union(WindowFlags::SERVER_DECORATED);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeShellRequest {
    Create { surface: WindowId, kind: NativeShellKind },
    SetPosition { surface: WindowId, position: Point },
    SetSize { surface: WindowId, size: Size },
    Raise { surface: WindowId },
    Lower { surface: WindowId },
    Activate { surface: WindowId },
    SetTitle { surface: WindowId, title: String },
    SetFlags { surface: WindowId, flags: WindowFlags },
    StartMove { surface: WindowId },
    StartResize { surface: WindowId, edges: Anchor },
    AckConfigure { surface: WindowId, serial: u32 },
    Destroy { surface: WindowId },
}

impl Desktop {
    pub fn handle_native_shell(&mut self, client: ClientId, request: NativeShellRequest) {
        let result = self.dispatch_native_shell(client, request);
        self.report(client, result);
    }

    fn dispatch_native_shell(&mut self, client: ClientId, request: NativeShellRequest) -> CompositorResult<()> {
        match request {
            NativeShellRequest::Create { surface, kind } => {
                let role = match kind {
                    NativeShellKind::A => WindowRole::NativeShellA,
                    NativeShellKind::B => WindowRole::NativeShellB,
                };
                let window = self.owned_mut(client, surface)?;
                window.bind_role(role)?;
                window.surface_type = SurfaceType::TopLevel;
                info!(%client, window = %surface, ?kind, "Native shell window created");
                Ok(())
            }
            NativeShellRequest::SetPosition { surface, position } => {
                self.owned_with_role(client, surface, NATIVE)?;
                let mapped = self.windows.get(&surface).is_some_and(|w| w.initialized);
                if mapped {
                    self.move_window_to(surface, position);
                } else if let Some(window) = self.windows.get_mut(&surface) {
                    window.position = position;
                    window.placed = true;
                }
                Ok(())
            }
            NativeShellRequest::SetSize { surface, size } => {
                if size.is_empty() {
                    return Err(ProtocolError::new(
                        ProtocolErrorKind::InvalidSize,
                        format!("window size {}x{} is empty", size.width, size.height),
                    )
                    .into());
                }
                self.owned_with_role(client, surface, NATIVE)?;
                self.resize_window(surface, size);
                Ok(())
            }
            NativeShellRequest::Raise { surface } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.raise(surface);
                Ok(())
            }
            NativeShellRequest::Lower { surface } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.lower(surface);
                Ok(())
            }
            NativeShellRequest::Activate { surface } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.activate(surface);
                Ok(())
            }
            NativeShellRequest::SetTitle { surface, title } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.set_title(client, surface, title)
            }
            NativeShellRequest::SetFlags { surface, flags } => self.set_native_flags(client, surface, flags),
            NativeShellRequest::StartMove { surface } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.start_move(surface);
                Ok(())
            }
            NativeShellRequest::StartResize { surface, edges } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.start_resize(surface, edges);
                Ok(())
            }
            NativeShellRequest::AckConfigure { surface, serial } => {
                self.owned_with_role(client, surface, &[RoleKind::NativeShellA])?;
                self.ack_toplevel_configure(surface, serial)
            }
            NativeShellRequest::Destroy { surface } => {
                self.owned_with_role(client, surface, NATIVE)?;
                self.destroy_window(surface);
                Ok(())
            }
        }
    }

    fn set_native_flags(&mut self, client: ClientId, surface: WindowId, requested: WindowFlags) -> CompositorResult<()> {
        let window = self.owned_with_role(client, surface, NATIVE)?;
        let requested = requested & CLIENT_FLAGS;
        let current = window.flags;
        debug!(window = %surface, ?requested, ?current, "Native window flags requested");

        let decorated = requested.contains(WindowFlags::SERVER_DECORATED);
        if decorated != current.contains(WindowFlags::SERVER_DECORATED) {
            let metrics = self.config.decoration.clone();
            if let Some(window) = self.windows.get_mut(&surface) {
                window.flags.set(WindowFlags::SERVER_DECORATED, decorated);
                window.update_views(&self.outputs, &metrics);
            }
            self.pipeline.mark_redecoration(surface);
        }

        let target = if requested.contains(WindowFlags::FULLSCREEN) {
            ToplevelState::Fullscreen
        } else if requested.contains(WindowFlags::MAXIMIZED) {
            ToplevelState::Maximized
        } else {
            ToplevelState::Normal
        };
        let was_sized = current.intersects(WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN);
        if target != ToplevelState::Normal || was_sized {
            self.request_state(surface, target)?;
        }

        if requested.contains(WindowFlags::MINIMIZED) {
            self.minimize(surface);
        } else if current.contains(WindowFlags::MINIMIZED) {
            self.unminimize(surface);
        }
        Ok(())
    }
}
