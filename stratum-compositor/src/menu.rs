// stratum-compositor/src/menu.rs

//! Global menu registration.
//!
//! One client acts as menu server. Windows publish the bus name and object
//! path of their menu; when focus moves, the server is told which menu to show.

use crate::client::ClientId;
use crate::error::{ProtocolError, ProtocolErrorKind};
use crate::window::WindowId;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuAddress {
    pub service: String,
    pub object_path: String,
}

#[derive(Debug, Default)]
pub struct MenuServerRegistry {
    server: Option<ClientId>,
    menus: HashMap<WindowId, MenuAddress>,
}

impl MenuServerRegistry {
    pub fn register_server(&mut self, client: ClientId) -> Result<(), ProtocolError> {
        match self.server {
            Some(existing) if existing != client => Err(ProtocolError::new(
                ProtocolErrorKind::AlreadyRegistered,
                format!("menu server already provided by {}", existing),
            )),
            _ => {
                info!(%client, "Menu server registered");
                self.server = Some(client);
                Ok(())
            }
        }
    }

    pub fn server(&self) -> Option<ClientId> {
        self.server
    }

    pub fn set_menu(&mut self, window: WindowId, address: MenuAddress) {
        debug!(%window, service = %address.service, path = %address.object_path, "Window menu published");
        self.menus.insert(window, address);
    }

    /// Menu address for `window`; empty when it published none.
    pub fn address_for(&self, window: WindowId) -> MenuAddress {
        self.menus.get(&window).cloned().unwrap_or_default()
    }

    pub fn forget_window(&mut self, window: WindowId) {
        self.menus.remove(&window);
    }

    pub fn forget_client(&mut self, client: ClientId) {
        if self.server == Some(client) {
            info!(%client, "Menu server went away");
            self.server = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_server_is_rejected() {
        let mut registry = MenuServerRegistry::default();
        registry.register_server(ClientId::from_raw(1)).unwrap();
        registry.register_server(ClientId::from_raw(1)).unwrap();
        let err = registry.register_server(ClientId::from_raw(2)).unwrap_err();
        assert_eq!(err.kind, ProtocolErrorKind::AlreadyRegistered);
    }

    #[test]
    fn server_slot_frees_on_disconnect() {
        let mut registry = MenuServerRegistry::default();
        registry.register_server(ClientId::from_raw(1)).unwrap();
        registry.forget_client(ClientId::from_raw(1));
        assert!(registry.register_server(ClientId::from_raw(2)).is_ok());
    }

    #[test]
    fn unknown_window_has_empty_address() {
        let mut registry = MenuServerRegistry::default();
        let w = WindowId::from_raw(4);
        assert_eq!(registry.address_for(w), MenuAddress::default());
        registry.set_menu(
            w,
            MenuAddress {
                service: ":1.42".into(),
                object_path: "/MenuBar/1".into(),
            },
        );
        assert_eq!(registry.address_for(w).service, ":1.42");
        registry.forget_window(w);
        assert_eq!(registry.address_for(w), MenuAddress::default());
    }
}
