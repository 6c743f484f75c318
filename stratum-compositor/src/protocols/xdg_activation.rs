// stratum-compositor/src/protocols/xdg_activation.rs

//! Activation-token adapter over [`crate::activation::ActivationArbiter`].

use crate::activation::{ActivationOutcome, TokenHandle};
use crate::client::{ClientEvent, ClientId};
use crate::desktop::Desktop;
use crate::error::{CompositorResult, ProtocolError, ProtocolErrorKind};
use crate::window::WindowId;
use tracing::{debug, info};

impl Desktop {
    pub fn get_activation_token(&mut self, client: ClientId) -> TokenHandle {
        self.activation.create_token(client)
    }

    pub fn set_activation_serial(&mut self, client: ClientId, token: TokenHandle, serial: u32) {
        let result = self.activation.set_serial(token, client, serial).map_err(Into::into);
        self.report(client, result);
    }

    pub fn set_activation_app_id(&mut self, client: ClientId, token: TokenHandle, app_id: String) {
        let result = self.activation.set_app_id(token, client, app_id).map_err(Into::into);
        self.report(client, result);
    }

    /// Binds the requesting surface. It must belong to the token's client.
    pub fn set_activation_surface(&mut self, client: ClientId, token: TokenHandle, surface: WindowId) {
        let owned = self.owned(client, surface).map(|_| ());
        if self.report(client, owned).is_none() {
            return;
        }
        let result = self.activation.set_surface(token, client, surface).map_err(Into::into);
        self.report(client, result);
    }

    /// Commits the token and sends its string to the client.
    pub fn commit_activation_token(&mut self, client: ClientId, token: TokenHandle) -> Option<String> {
        let result = self.activation.commit(token, client).map_err(Into::into);
        let string = self.report(client, result)?;
        self.outbox.push(
            client,
            ClientEvent::TokenDone {
                handle: token,
                token: string.clone(),
            },
        );
        Some(string)
    }

    pub fn destroy_activation_token(&mut self, client: ClientId, token: TokenHandle) {
        if self.activation.get(token).is_some_and(|t| t.client == client) {
            self.activation.destroy_token(token);
        }
    }

    /// Presents `token` on behalf of `surface`. A granted token raises it.
    pub fn activate_with_token(&mut self, client: ClientId, token: &str, surface: WindowId) {
        let result = self.try_activate_with_token(client, token, surface);
        self.report(client, result);
    }

    fn try_activate_with_token(&mut self, client: ClientId, token: &str, surface: WindowId) -> CompositorResult<()> {
        self.owned(client, surface)?;
        match self.activation.activate(token) {
            ActivationOutcome::Granted { requester, origin, .. } => {
                info!(%client, window = %surface, %requester, ?origin, "Activation granted");
                self.raise(surface);
                Ok(())
            }
            ActivationOutcome::AlreadyUsed => Err(ProtocolError::new(
                ProtocolErrorKind::AlreadyUsed,
                "activation token was already used",
            )
            .into()),
            ActivationOutcome::Unknown => {
                debug!(%client, window = %surface, "Activation with unknown token ignored");
                Ok(())
            }
        }
    }
}
