// stratum-compositor/src/grab.rs

//! Interactive move and resize.
//!
//! A grab records where the pointer and the window started; pointer motion
//! only stores the pointer location, and the window follows on the next tick.

use crate::client::ClientEvent;
use crate::desktop::Desktop;
use crate::window::{Anchor, WindowFlags, WindowId};
use stratum_core::{Point, Rect};
use tracing::{debug, info, warn};

/// Smallest frame an interactive resize produces.
const MIN_RESIZE_SIZE: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    Move {
        window: WindowId,
        pointer_start: Point,
        window_start: Point,
    },
    Resize {
        window: WindowId,
        /// Edges being dragged.
        edges: Anchor,
        pointer_start: Point,
        frame_start: Rect,
    },
}

impl Grab {
    pub fn window(&self) -> WindowId {
        match *self {
            Grab::Move { window, .. } | Grab::Resize { window, .. } => window,
        }
    }
}

/// Frame a resize grab produces after the pointer moved by `delta`.
fn resized_frame(start: Rect, edges: Anchor, delta: Point) -> Rect {
    let mut left = start.left();
    let mut top = start.top();
    let mut right = start.right();
    let mut bottom = start.bottom();
    if edges.contains(Anchor::LEFT) {
        left = (left + delta.x).min(right - MIN_RESIZE_SIZE);
    } else if edges.contains(Anchor::RIGHT) {
        right = (right + delta.x).max(left + MIN_RESIZE_SIZE);
    }
    if edges.contains(Anchor::TOP) {
        top = (top + delta.y).min(bottom - MIN_RESIZE_SIZE);
    } else if edges.contains(Anchor::BOTTOM) {
        bottom = (bottom + delta.y).max(top + MIN_RESIZE_SIZE);
    }
    Rect::new(left, top, right - left, bottom - top)
}

impl Desktop {
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn grab(&self) -> Option<Grab> {
        self.grab
    }

    /// Records the pointer location. Any running grab follows on the next tick.
    pub fn pointer_motion(&mut self, location: Point) {
        self.pointer = location;
        self.notify_activity();
    }

    /// Starts an interactive move of a mapped window.
    pub fn start_move(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            warn!(window = %id, "Move requested for unregistered window");
            return;
        };
        if !window.initialized || window.is_special() {
            debug!(window = %id, "Move requested for unmapped or special window, ignoring");
            return;
        }
        self.grab = Some(Grab::Move {
            window: id,
            pointer_start: self.pointer,
            window_start: window.position,
        });
        info!(window = %id, "Interactive move started");
    }

    /// Starts an interactive resize along `edges`.
    pub fn start_resize(&mut self, id: WindowId, edges: Anchor) {
        let Some(window) = self.windows.get_mut(&id) else {
            warn!(window = %id, "Resize requested for unregistered window");
            return;
        };
        if !window.initialized || window.is_special() || edges.is_empty() {
            debug!(window = %id, ?edges, "Resize request ignored");
            return;
        }
        window.flags |= WindowFlags::RESIZING;
        let frame_start = window.frame_rect(&self.config.decoration);
        self.grab = Some(Grab::Resize {
            window: id,
            edges,
            pointer_start: self.pointer,
            frame_start,
        });
        info!(window = %id, ?edges, "Interactive resize started");
    }

    /// Applies the grab to the pointer's current location.
    pub(crate) fn apply_grab(&mut self) {
        match self.grab {
            Some(Grab::Move {
                window,
                pointer_start,
                window_start,
            }) => {
                let target = window_start + (self.pointer - pointer_start);
                let current = self.windows.get(&window).map(|w| w.position);
                if current.is_some_and(|p| p != self.outputs.corrected_position(target)) {
                    self.move_window_to(window, target);
                }
            }
            Some(Grab::Resize {
                window,
                edges,
                pointer_start,
                frame_start,
            }) => {
                let metrics = self.config.decoration.clone();
                let frame = resized_frame(frame_start, edges, self.pointer - pointer_start);
                let Some(w) = self.windows.get_mut(&window) else {
                    return;
                };
                if w.frame_rect(&metrics) == frame {
                    return;
                }
                let size = w.content_size_for(frame.size, w.flags, &metrics);
                w.position = frame.origin;
                self.resize_window(window, size);
            }
            None => {}
        }
    }

    /// Ends the grab. A resize sends a final configure without the resizing state.
    pub fn end_grab(&mut self) {
        let Some(grab) = self.grab.take() else {
            return;
        };
        let id = grab.window();
        if let Grab::Resize { .. } = grab {
            let serial = self.next_serial();
            if let Some(window) = self.windows.get_mut(&id) {
                window.flags.remove(WindowFlags::RESIZING);
                let client = window.client;
                let size = window.content_size;
                let states = window.flags & (WindowFlags::MAXIMIZED | WindowFlags::FULLSCREEN | WindowFlags::ACTIVATED);
                self.outbox.push(client, ClientEvent::Configure { window: id, serial, size, states });
                self.pipeline.mark_redecoration(id);
            }
        }
        info!(window = %id, "Interactive grab ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Anchor::RIGHT, Point::new(50, 0), Rect::new(0, 0, 250, 100))]
    #[case(Anchor::LEFT, Point::new(50, 0), Rect::new(50, 0, 150, 100))]
    #[case(Anchor::BOTTOM | Anchor::RIGHT, Point::new(10, 20), Rect::new(0, 0, 210, 120))]
    #[case(Anchor::TOP, Point::new(0, 500), Rect::new(0, 68, 200, 32))]
    fn resize_follows_dragged_edges(#[case] edges: Anchor, #[case] delta: Point, #[case] expected: Rect) {
        assert_eq!(resized_frame(Rect::new(0, 0, 200, 100), edges, delta), expected);
    }

    #[test]
    fn grab_reports_its_window() {
        let grab = Grab::Move {
            window: WindowId::from_raw(4),
            pointer_start: Point::ZERO,
            window_start: Point::ZERO,
        };
        assert_eq!(grab.window(), WindowId::from_raw(4));
    }
}
