// stratum-compositor/src/window/anchor.rs

//! Edge-anchored placement shared by layer surfaces and popups.
//!
//! A surface is aligned inside an anchor rectangle: anchored edges are pinned
//! (plus margin), unanchored axes are centred. Size negotiation stretches a
//! zero dimension across two opposite anchored edges.

use super::types::{Anchor, Edge, Margins};
use crate::error::{ProtocolError, ProtocolErrorKind};
use stratum_core::{Point, Rect, Size};

/// Resolves a requested size against the anchor area.
///
/// A zero width needs both left and right anchors, a zero height both top and
/// bottom; anything else is an `invalid_size` protocol error.
pub fn negotiate_size(area: Rect, anchor: Anchor, requested: Size, margins: Margins) -> Result<Size, ProtocolError> {
    let mut size = requested;
    if size.width == 0 {
        if !anchor.contains(Anchor::LEFT | Anchor::RIGHT) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidSize,
                "width 0 requires both left and right anchors",
            ));
        }
        size.width = (area.size.width - margins.left - margins.right).max(0);
    }
    if size.height == 0 {
        if !anchor.contains(Anchor::TOP | Anchor::BOTTOM) {
            return Err(ProtocolError::new(
                ProtocolErrorKind::InvalidSize,
                "height 0 requires both top and bottom anchors",
            ));
        }
        size.height = (area.size.height - margins.top - margins.bottom).max(0);
    }
    Ok(size)
}

/// Top-left position of a `size`-sized surface aligned to `anchor` inside `area`.
pub fn anchored_position(area: Rect, anchor: Anchor, size: Size, margins: Margins) -> Point {
    let left = area.left() + margins.left;
    let right = area.right() - size.width - margins.right;
    let top = area.top() + margins.top;
    let bottom = area.bottom() - size.height - margins.bottom;
    let center_x = area.left() + (area.size.width - size.width) / 2;
    let center_y = area.top() + (area.size.height - size.height) / 2;

    const T: u32 = Anchor::TOP.bits();
    const B: u32 = Anchor::BOTTOM.bits();
    const L: u32 = Anchor::LEFT.bits();
    const R: u32 = Anchor::RIGHT.bits();

    match anchor.bits() {
        T => Point::new(center_x, top),
        B => Point::new(center_x, bottom),
        L => Point::new(left, center_y),
        R => Point::new(right, center_y),
        x if x == T | L => Point::new(left, top),
        x if x == T | R => Point::new(right, top),
        x if x == B | L => Point::new(left, bottom),
        x if x == B | R => Point::new(right, bottom),
        x if x == T | L | R => Point::new(left, top),
        x if x == B | L | R => Point::new(left, bottom),
        x if x == T | B | L | R => Point::new(left, top),
        0 => Point::new(center_x, center_y),
        _ => {
            let x = if anchor.contains(Anchor::LEFT) {
                left
            } else if anchor.contains(Anchor::RIGHT) {
                right
            } else {
                center_x
            };
            let y = if anchor.contains(Anchor::TOP) {
                top
            } else if anchor.contains(Anchor::BOTTOM) {
                bottom
            } else {
                center_y
            };
            Point::new(x, y)
        }
    }
}

/// The output edge an exclusive zone applies to, if any.
///
/// Only a single edge, or an edge plus both of its perpendicular neighbours,
/// identifies an edge unambiguously.
pub fn exclusive_edge(anchor: Anchor) -> Option<Edge> {
    let horizontal = Anchor::LEFT | Anchor::RIGHT;
    let vertical = Anchor::TOP | Anchor::BOTTOM;
    match anchor {
        a if a == Anchor::TOP || a == Anchor::TOP | horizontal => Some(Edge::Top),
        a if a == Anchor::BOTTOM || a == Anchor::BOTTOM | horizontal => Some(Edge::Bottom),
        a if a == Anchor::LEFT || a == Anchor::LEFT | vertical => Some(Edge::Left),
        a if a == Anchor::RIGHT || a == Anchor::RIGHT | vertical => Some(Edge::Right),
        _ => None,
    }
}
