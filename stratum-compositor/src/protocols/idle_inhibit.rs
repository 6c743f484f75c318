// stratum-compositor/src/protocols/idle_inhibit.rs

use crate::client::ClientId;
use crate::desktop::Desktop;
use crate::window::WindowId;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InhibitorId(u64);

impl fmt::Display for InhibitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inhibitor-{}", self.0)
    }
}

/// An idle inhibitor bound to a surface. It dies with the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inhibitor {
    pub client: ClientId,
    pub surface: WindowId,
}

impl Desktop {
    /// Holds the idle timers while `surface` exists or until the inhibitor is destroyed.
    pub fn create_idle_inhibitor(&mut self, client: ClientId, surface: WindowId) -> Option<InhibitorId> {
        let result = self.owned(client, surface).map(|_| ());
        self.report(client, result)?;

        self.next_inhibitor_id += 1;
        let id = InhibitorId(self.next_inhibitor_id);
        self.inhibitors.insert(id, Inhibitor { client, surface });
        self.idle.inhibit();
        debug!(%client, window = %surface, inhibitor = %id, "Idle inhibitor created");
        Some(id)
    }

    pub fn destroy_idle_inhibitor(&mut self, client: ClientId, inhibitor: InhibitorId) {
        match self.inhibitors.get(&inhibitor) {
            Some(entry) if entry.client == client => self.release_inhibitor(inhibitor),
            Some(_) => debug!(%client, %inhibitor, "Inhibitor belongs to another client, ignoring"),
            None => debug!(%client, %inhibitor, "Unknown inhibitor, ignoring"),
        }
    }

    pub fn inhibitor_count(&self) -> usize {
        self.inhibitors.len()
    }
}
