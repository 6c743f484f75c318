// stratum-compositor/src/client.rs

//! Client identity and the outbound event queue.
//!
//! Nothing in the window graph talks to a socket. Every client-visible effect
//! is queued here as a [`ClientEvent`] and drained by the transport after each
//! dispatch.

use crate::activation::TokenHandle;
use crate::error::ProtocolErrorKind;
use crate::window::{WindowFlags, WindowId};
use std::collections::HashMap;
use std::fmt;
use stratum_core::{Point, Size};
use tracing::debug;

/// A connected client, as identified by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub const fn from_raw(raw: u64) -> Self {
        ClientId(raw)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Toplevel configure. `size` is the content size; zero lets the client pick.
    Configure {
        window: WindowId,
        serial: u32,
        size: Size,
        states: WindowFlags,
    },
    PopupConfigure {
        window: WindowId,
        serial: u32,
        position: Point,
        size: Size,
    },
    LayerConfigure {
        window: WindowId,
        serial: u32,
        size: Size,
    },
    Activated {
        window: WindowId,
    },
    Deactivated {
        window: WindowId,
    },
    /// The compositor dismissed the surface (popup parent gone, layer surface without output).
    Closed {
        window: WindowId,
    },
    TokenDone {
        handle: TokenHandle,
        token: String,
    },
    ProtocolError {
        code: ProtocolErrorKind,
        message: String,
    },
    NoMemory,
    /// Sent to the menu server when focus moves.
    ActiveWindowChanged {
        service: String,
        object_path: String,
    },
}

/// FIFO of events waiting for the transport.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<(ClientId, ClientEvent)>,
}

impl Outbox {
    pub fn push(&mut self, client: ClientId, event: ClientEvent) {
        debug!(%client, ?event, "Queued client event");
        self.events.push((client, event));
    }

    pub fn drain(&mut self) -> Vec<(ClientId, ClientEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn pending(&self) -> &[(ClientId, ClientEvent)] {
        &self.events
    }

    /// Drops undelivered events for a client that went away.
    pub fn discard_client(&mut self, client: ClientId) {
        self.events.retain(|(c, _)| *c != client);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Connected,
    /// The transport saw the connection fail; teardown is still pending.
    Lost,
}

/// Tracks which clients are connected and which have been marked lost.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, Liveness>,
}

impl ClientRegistry {
    pub fn connect(&mut self, client: ClientId) {
        self.clients.insert(client, Liveness::Connected);
    }

    pub fn mark_lost(&mut self, client: ClientId) {
        if let Some(state) = self.clients.get_mut(&client) {
            *state = Liveness::Lost;
        }
    }

    pub fn is_lost(&self, client: ClientId) -> bool {
        matches!(self.clients.get(&client), Some(Liveness::Lost))
    }

    pub fn remove(&mut self, client: ClientId) {
        self.clients.remove(&client);
    }
}
