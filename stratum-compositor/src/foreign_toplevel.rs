// stratum-compositor/src/foreign_toplevel.rs

//! The window-management export: one control object per managed toplevel and
//! the published z-order string.

use crate::interfaces::WindowManagementSink;
use crate::window::WindowId;
use std::collections::BTreeMap;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ForeignToplevelExport {
    controls: BTreeMap<WindowId, Uuid>,
    last_published: Option<String>,
}

impl ForeignToplevelExport {
    pub fn has_control(&self, window: WindowId) -> bool {
        self.controls.contains_key(&window)
    }

    pub fn add_control(
        &mut self,
        sink: &mut dyn WindowManagementSink,
        window: WindowId,
        uuid: Uuid,
        title: &str,
        app_id: &str,
    ) {
        if self.controls.insert(window, uuid).is_none() {
            debug!(%window, %uuid, "Created window-management control object");
            sink.window_added(uuid, title, app_id);
        }
    }

    /// Returns whether a control object existed.
    pub fn remove_control(&mut self, sink: &mut dyn WindowManagementSink, window: WindowId) -> bool {
        match self.controls.remove(&window) {
            Some(uuid) => {
                debug!(%window, %uuid, "Removed window-management control object");
                sink.window_removed(uuid);
                true
            }
            None => false,
        }
    }

    /// Publishes `order` if it differs from the last published string.
    pub fn publish(&mut self, sink: &mut dyn WindowManagementSink, order: String) {
        if self.last_published.as_deref() == Some(order.as_str()) {
            trace!("Z-order unchanged, not republishing");
            return;
        }
        sink.stacking_changed(&order);
        self.last_published = Some(order);
    }

    pub fn last_published(&self) -> Option<&str> {
        self.last_published.as_deref()
    }
}
