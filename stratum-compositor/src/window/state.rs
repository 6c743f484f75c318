// stratum-compositor/src/window/state.rs

//! Toplevel state machine.
//!
//! ```text
//! Created ──map──▶ Normal ◀──▶ Minimized
//!                    ▲ │
//!                    │ ├──▶ Maximized
//!                    │ └──▶ Fullscreen
//! ```
//!
//! Maximize, fullscreen and restore are two-phase: [`ToplevelMachine::begin`]
//! records a pending transition under a configure serial and
//! [`ToplevelMachine::ack`] finalizes it once the client acknowledges that
//! serial (or a newer one). Minimize applies immediately.

use std::time::Duration;
use stratum_core::Rect;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToplevelState {
    #[default]
    Created,
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// A transition waiting for its configure to be acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub serial: u32,
    pub target: ToplevelState,
    /// Frame rectangle the window takes once the transition finalizes.
    pub frame: Rect,
}

/// Why [`ToplevelMachine::begin`] refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRefusal {
    /// The window is not mapped yet.
    NotMapped,
    /// A geometry interpolation is running; the request is dropped.
    Animating,
    /// Already in (or heading to) the requested state.
    NoChange,
}

/// Linear frame interpolation advanced by frame ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub from: Rect,
    pub to: Rect,
    pub elapsed: Duration,
    pub duration: Duration,
}

impl Animation {
    pub fn new(from: Rect, to: Rect, duration: Duration) -> Self {
        Animation {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// The interpolated frame at the current elapsed time.
    pub fn current(&self) -> Rect {
        if self.is_finished() || self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let lerp = |a: i32, b: i32| a + ((b - a) as f64 * t).round() as i32;
        Rect::new(
            lerp(self.from.left(), self.to.left()),
            lerp(self.from.top(), self.to.top()),
            lerp(self.from.size.width, self.to.size.width),
            lerp(self.from.size.height, self.to.size.height),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToplevelMachine {
    state: ToplevelState,
    pending: Option<PendingTransition>,
    /// Frame captured when leaving Normal; restored on the way back.
    saved_frame: Option<Rect>,
    /// State to return to when unminimized.
    minimized_from: Option<ToplevelState>,
    animation: Option<Animation>,
}

impl ToplevelMachine {
    pub fn state(&self) -> ToplevelState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    pub fn saved_frame(&self) -> Option<Rect> {
        self.saved_frame
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn map(&mut self) {
        if self.state == ToplevelState::Created {
            self.state = ToplevelState::Normal;
        }
    }

    /// Target frame for leaving Maximized/Fullscreen, falling back to `current`.
    pub fn restore_frame(&self, current: Rect) -> Rect {
        self.saved_frame.unwrap_or(current)
    }

    /// Starts a transition to `target`. A newer request replaces a pending one.
    pub fn begin(
        &mut self,
        target: ToplevelState,
        current_frame: Rect,
        target_frame: Rect,
        serial: u32,
    ) -> Result<PendingTransition, TransitionRefusal> {
        if self.state == ToplevelState::Created {
            return Err(TransitionRefusal::NotMapped);
        }
        if self.animation.is_some() {
            return Err(TransitionRefusal::Animating);
        }
        let heading_to = self.pending.map(|p| p.target).unwrap_or(self.state);
        if heading_to == target {
            return Err(TransitionRefusal::NoChange);
        }
        if self.state == ToplevelState::Normal && target != ToplevelState::Normal {
            self.saved_frame = Some(current_frame);
        }
        let transition = PendingTransition {
            serial,
            target,
            frame: target_frame,
        };
        if let Some(previous) = self.pending.replace(transition) {
            debug!(old_serial = previous.serial, new_serial = serial, "Pending transition superseded");
        }
        Ok(transition)
    }

    /// Finalizes the pending transition if `serial` covers it.
    pub fn ack(&mut self, serial: u32) -> Option<PendingTransition> {
        match self.pending {
            Some(pending) if serial >= pending.serial => {
                self.pending = None;
                self.state = pending.target;
                if pending.target == ToplevelState::Normal {
                    self.saved_frame = None;
                }
                Some(pending)
            }
            Some(pending) => {
                trace!(serial, pending = pending.serial, "Ignoring stale ack");
                None
            }
            None => None,
        }
    }

    /// Applies a transition without waiting for an ack.
    pub fn apply_immediately(
        &mut self,
        target: ToplevelState,
        current_frame: Rect,
        target_frame: Rect,
    ) -> Result<PendingTransition, TransitionRefusal> {
        let transition = self.begin(target, current_frame, target_frame, 0)?;
        self.ack(transition.serial);
        Ok(transition)
    }

    pub fn minimize(&mut self) -> bool {
        match self.state {
            ToplevelState::Created | ToplevelState::Minimized => false,
            previous => {
                self.minimized_from = Some(previous);
                self.state = ToplevelState::Minimized;
                true
            }
        }
    }

    pub fn unminimize(&mut self) -> bool {
        if self.state != ToplevelState::Minimized {
            return false;
        }
        self.state = self.minimized_from.take().unwrap_or(ToplevelState::Normal);
        true
    }

    pub fn start_animation(&mut self, animation: Animation) {
        self.animation = Some(animation);
    }

    /// Advances the running animation. Returns the frame to present, if any.
    pub fn tick(&mut self, dt: Duration) -> Option<Rect> {
        let animation = self.animation.as_mut()?;
        animation.elapsed += dt;
        let frame = animation.current();
        if animation.is_finished() {
            self.animation = None;
        }
        Some(frame)
    }
}
