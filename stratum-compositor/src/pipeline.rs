// stratum-compositor/src/pipeline.rs

//! Per-window dirty marks, drained once per frame tick.

use crate::window::WindowId;
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameMarks: u8 {
        /// Title, activation or geometry changed; decorations must be redrawn.
        const NEEDS_REDECORATION = 1 << 0;
        const NEEDS_PRESENT      = 1 << 1;
    }
}

#[derive(Debug, Default)]
pub struct FramePipeline {
    marks: BTreeMap<WindowId, FrameMarks>,
}

impl FramePipeline {
    /// Redecoration always implies a present.
    pub fn mark_redecoration(&mut self, window: WindowId) {
        *self.marks.entry(window).or_default() |= FrameMarks::NEEDS_REDECORATION | FrameMarks::NEEDS_PRESENT;
    }

    pub fn mark_present(&mut self, window: WindowId) {
        *self.marks.entry(window).or_default() |= FrameMarks::NEEDS_PRESENT;
    }

    pub fn marks(&self, window: WindowId) -> FrameMarks {
        self.marks.get(&window).copied().unwrap_or_default()
    }

    pub fn forget(&mut self, window: WindowId) {
        self.marks.remove(&window);
    }

    pub fn is_idle(&self) -> bool {
        self.marks.is_empty()
    }

    /// Takes every mark, ordered by window id.
    pub fn drain(&mut self) -> Vec<(WindowId, FrameMarks)> {
        std::mem::take(&mut self.marks).into_iter().collect()
    }
}
