// stratum-compositor/src/output.rs

//! Outputs, exclusive-zone reservations and point correction.
//!
//! Layer surfaces anchored to a single edge may reserve a band along that
//! edge. The available geometry of an output is its geometry minus those
//! bands, and [`OutputAssigner::corrected_position`] keeps points (window
//! origins during placement and interactive moves) out of them.

use crate::window::{Edge, WindowId};
use std::collections::HashMap;
use std::fmt;
use stratum_core::{Point, Rect};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(u64);

impl OutputId {
    pub const fn from_raw(raw: u64) -> Self {
        OutputId(raw)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub id: OutputId,
    pub name: String,
    /// Position and size in global logical coordinates.
    pub geometry: Rect,
    pub scale: i32,
}

/// A band reserved along one output edge by a layer surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub output: OutputId,
    pub edge: Edge,
    pub amount: i32,
}

/// Total reserved thickness per edge of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReservedBands {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

#[derive(Debug, Default)]
pub struct OutputAssigner {
    outputs: Vec<Output>,
    next_id: u64,
    reservations: HashMap<WindowId, Reservation>,
}

impl OutputAssigner {
    pub fn add_output(&mut self, name: impl Into<String>, geometry: Rect, scale: i32) -> OutputId {
        self.next_id += 1;
        let id = OutputId(self.next_id);
        let name = name.into();
        info!(output = %id, %name, ?geometry, scale, "Output added");
        self.outputs.push(Output {
            id,
            name,
            geometry,
            scale: scale.max(1),
        });
        id
    }

    /// Removes an output and drops every reservation made against it.
    /// Returns the windows whose reservations were dropped.
    pub fn remove_output(&mut self, id: OutputId) -> Vec<WindowId> {
        let before = self.outputs.len();
        self.outputs.retain(|o| o.id != id);
        if self.outputs.len() == before {
            warn!(output = %id, "Attempted to remove unknown output");
            return Vec::new();
        }
        let mut released: Vec<WindowId> = self
            .reservations
            .iter()
            .filter(|(_, r)| r.output == id)
            .map(|(w, _)| *w)
            .collect();
        released.sort();
        for window in &released {
            self.reservations.remove(window);
        }
        info!(output = %id, released = released.len(), "Output removed");
        released
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub fn first(&self) -> Option<&Output> {
        self.outputs.first()
    }

    pub fn output_geometry(&self, id: OutputId) -> Option<Rect> {
        self.get(id).map(|o| o.geometry)
    }

    /// Records (or replaces) `window`'s reservation. A non-positive amount clears it.
    pub fn reserve(&mut self, window: WindowId, output: OutputId, edge: Edge, amount: i32) {
        if amount <= 0 {
            self.release(window);
            return;
        }
        if self.get(output).is_none() {
            warn!(%window, %output, "Reservation against unknown output ignored");
            return;
        }
        debug!(%window, %output, ?edge, amount, "Reserving output band");
        self.reservations.insert(window, Reservation { output, edge, amount });
    }

    pub fn release(&mut self, window: WindowId) -> Option<Reservation> {
        let released = self.reservations.remove(&window);
        if let Some(r) = &released {
            debug!(%window, output = %r.output, ?r.edge, "Released output band");
        }
        released
    }

    pub fn reservation(&self, window: WindowId) -> Option<&Reservation> {
        self.reservations.get(&window)
    }

    pub fn has_reservation(&self, window: WindowId) -> bool {
        self.reservations.contains_key(&window)
    }

    /// Per-edge sums of all reservations on `output`.
    pub fn reserved_bands(&self, output: OutputId) -> ReservedBands {
        self.reservations
            .values()
            .filter(|r| r.output == output)
            .fold(ReservedBands::default(), |mut bands, r| {
                match r.edge {
                    Edge::Top => bands.top += r.amount,
                    Edge::Bottom => bands.bottom += r.amount,
                    Edge::Left => bands.left += r.amount,
                    Edge::Right => bands.right += r.amount,
                }
                bands
            })
    }

    /// Output geometry minus the reserved bands.
    pub fn available_geometry(&self, output: OutputId) -> Option<Rect> {
        let geometry = self.output_geometry(output)?;
        let bands = self.reserved_bands(output);
        Some(Rect::new(
            geometry.left() + bands.left,
            geometry.top() + bands.top,
            geometry.size.width - bands.left - bands.right,
            geometry.size.height - bands.top - bands.bottom,
        ))
    }

    /// The output containing `point`, else the one closest to it.
    pub fn nearest_output(&self, point: Point) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|o| o.geometry.contains_point(point))
            .or_else(|| self.outputs.iter().min_by_key(|o| o.geometry.distance_squared_to(point)))
    }

    /// The output sharing the largest area with `rect`, else the one nearest its centre.
    pub fn output_for_rect(&self, rect: Rect) -> Option<&Output> {
        self.outputs
            .iter()
            .filter_map(|o| o.geometry.intersection(&rect).map(|i| (o, i.area())))
            .fold(None, |best: Option<(&Output, i64)>, (o, area)| match best {
                Some((_, best_area)) if best_area >= area => best,
                _ => Some((o, area)),
            })
            .map(|(o, _)| o)
            .or_else(|| self.nearest_output(rect.center()))
    }

    /// Moves `point` out of reserved bands and into the nearest output.
    ///
    /// A point inside an `N`-pixel band is pushed one pixel past it (a top
    /// band maps `y` in `[top, top + N]` to `top + N + 1`). Edges without a
    /// band only clamp. With no outputs the point is returned unchanged.
    pub fn corrected_position(&self, point: Point) -> Point {
        let Some(output) = self.nearest_output(point) else {
            return point;
        };
        let g = output.geometry;
        let bands = self.reserved_bands(output.id);

        let mut x = point.x.clamp(g.left(), (g.right() - 1).max(g.left()));
        let mut y = point.y.clamp(g.top(), (g.bottom() - 1).max(g.top()));

        if bands.top > 0 && y <= g.top() + bands.top {
            y = g.top() + bands.top + 1;
        }
        if bands.bottom > 0 && y >= g.bottom() - bands.bottom - 1 {
            y = g.bottom() - bands.bottom - 2;
        }
        if bands.left > 0 && x <= g.left() + bands.left {
            x = g.left() + bands.left + 1;
        }
        if bands.right > 0 && x >= g.right() - bands.right - 1 {
            x = g.right() - bands.right - 2;
        }
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_output() -> (OutputAssigner, OutputId) {
        let mut outputs = OutputAssigner::default();
        let id = outputs.add_output("eDP-1", Rect::new(0, 0, 1920, 1080), 1);
        (outputs, id)
    }

    #[test]
    fn available_geometry_subtracts_bands() {
        let (mut outputs, id) = single_output();
        outputs.reserve(WindowId::from_raw(1), id, Edge::Top, 40);
        outputs.reserve(WindowId::from_raw(2), id, Edge::Left, 64);
        assert_eq!(outputs.available_geometry(id), Some(Rect::new(64, 40, 1856, 1040)));
    }

    #[test]
    fn stacked_bands_accumulate() {
        let (mut outputs, id) = single_output();
        outputs.reserve(WindowId::from_raw(1), id, Edge::Bottom, 30);
        outputs.reserve(WindowId::from_raw(2), id, Edge::Bottom, 20);
        assert_eq!(outputs.reserved_bands(id).bottom, 50);
        outputs.release(WindowId::from_raw(1));
        assert_eq!(outputs.reserved_bands(id).bottom, 20);
    }

    #[test]
    fn zero_amount_clears_reservation() {
        let (mut outputs, id) = single_output();
        let w = WindowId::from_raw(1);
        outputs.reserve(w, id, Edge::Top, 40);
        outputs.reserve(w, id, Edge::Top, 0);
        assert!(!outputs.has_reservation(w));
    }

    #[test]
    fn top_band_pushes_one_past() {
        let (mut outputs, id) = single_output();
        outputs.reserve(WindowId::from_raw(1), id, Edge::Top, 40);
        for y in 0..=40 {
            assert_eq!(outputs.corrected_position(Point::new(500, y)).y, 41, "y = {y}");
        }
        assert_eq!(outputs.corrected_position(Point::new(500, 41)).y, 41);
        assert_eq!(outputs.corrected_position(Point::new(500, 300)).y, 300);
    }

    #[test]
    fn bottom_band_mirrors_top() {
        let (mut outputs, id) = single_output();
        outputs.reserve(WindowId::from_raw(1), id, Edge::Bottom, 40);
        assert_eq!(outputs.corrected_position(Point::new(10, 1079)).y, 1038);
        assert_eq!(outputs.corrected_position(Point::new(10, 1000)).y, 1000);
    }

    #[test]
    fn no_band_clamps_into_output() {
        let (outputs, _) = single_output();
        assert_eq!(outputs.corrected_position(Point::new(-50, 5000)), Point::new(0, 1079));
    }

    #[test]
    fn nearest_output_wins_outside_all() {
        let mut outputs = OutputAssigner::default();
        outputs.add_output("left", Rect::new(0, 0, 1000, 1000), 1);
        let right = outputs.add_output("right", Rect::new(2000, 0, 1000, 1000), 1);
        assert_eq!(outputs.nearest_output(Point::new(1900, 10)).map(|o| o.id), Some(right));
        assert_eq!(outputs.corrected_position(Point::new(1900, 10)), Point::new(2000, 10));
    }

    #[test]
    fn removing_output_drops_its_reservations() {
        let (mut outputs, id) = single_output();
        outputs.reserve(WindowId::from_raw(7), id, Edge::Top, 40);
        assert_eq!(outputs.remove_output(id), vec![WindowId::from_raw(7)]);
        assert!(outputs.is_empty());
        assert_eq!(outputs.corrected_position(Point::new(3, 4)), Point::new(3, 4));
    }

    #[test]
    fn output_for_rect_prefers_largest_overlap() {
        let mut outputs = OutputAssigner::default();
        let left = outputs.add_output("left", Rect::new(0, 0, 1000, 1000), 1);
        outputs.add_output("right", Rect::new(1000, 0, 1000, 1000), 1);
        assert_eq!(outputs.output_for_rect(Rect::new(800, 0, 300, 100)).map(|o| o.id), Some(left));
    }
}
