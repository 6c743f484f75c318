//! Fundamental data types shared across the compositor.

pub mod geometry;

pub use geometry::{Point, Rect, Size};
