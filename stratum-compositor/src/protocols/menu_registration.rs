// stratum-compositor/src/protocols/menu_registration.rs

//! Private global-menu registration protocol.

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::menu::MenuAddress;
use crate::window::WindowId;

impl Desktop {
    /// Makes `client` the menu server. Only one client may hold the role.
    pub fn register_menu_server(&mut self, client: ClientId) {
        let result = self.menus.register_server(client).map_err(Into::into);
        if self.report(client, result).is_some() {
            if let Some(active) = self.active {
                self.notify_menu_server(active);
            }
        }
    }

    /// Publishes the menu of one of `client`'s windows.
    pub fn set_window_menu(&mut self, client: ClientId, surface: WindowId, service: String, object_path: String) {
        let result = self.owned(client, surface).map(|_| ());
        if self.report(client, result).is_none() {
            return;
        }
        self.menus.set_menu(surface, MenuAddress { service, object_path });
        if self.active == Some(surface) {
            self.notify_menu_server(surface);
        }
    }

    pub fn menu_server(&self) -> Option<ClientId> {
        self.menus.server()
    }
}
