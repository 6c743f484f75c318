// stratum-compositor/src/idle.rs

//! Idle and power state machine.
//!
//! Two independent timeouts measured from the last activity: the display
//! blanks after the first, the system sleeps after the second. Inhibitors
//! freeze both. Time only moves through [`IdlePowerController::advance`].

use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    #[default]
    Active,
    DisplayAsleep,
    SystemAsleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleTransition {
    DisplaySleep,
    SystemSleep,
    Wake,
}

#[derive(Debug, Default)]
pub struct IdlePowerController {
    state: PowerState,
    idle_for: Duration,
    display_timeout: Option<Duration>,
    system_timeout: Option<Duration>,
    inhibitors: usize,
}

impl IdlePowerController {
    pub fn new(display_timeout: Option<Duration>, system_timeout: Option<Duration>) -> Self {
        IdlePowerController {
            display_timeout,
            system_timeout,
            ..Default::default()
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn idle_for(&self) -> Duration {
        self.idle_for
    }

    pub fn inhibitor_count(&self) -> usize {
        self.inhibitors
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibitors > 0
    }

    pub fn set_timeouts(&mut self, display_timeout: Option<Duration>, system_timeout: Option<Duration>) {
        debug!(?display_timeout, ?system_timeout, "Idle timeouts updated");
        self.display_timeout = display_timeout;
        self.system_timeout = system_timeout;
    }

    /// The display timeout in effect; a timeout not shorter than the system one is disabled.
    pub fn effective_display_timeout(&self) -> Option<Duration> {
        match (self.display_timeout, self.system_timeout) {
            (Some(display), Some(system)) if display >= system => None,
            (display, _) => display,
        }
    }

    pub fn inhibit(&mut self) {
        self.inhibitors += 1;
        debug!(count = self.inhibitors, "Idle inhibitor added");
    }

    /// Releases one inhibitor. Reaching zero rearms the timers from Active.
    pub fn uninhibit(&mut self) -> Option<IdleTransition> {
        if self.inhibitors == 0 {
            return None;
        }
        self.inhibitors -= 1;
        debug!(count = self.inhibitors, "Idle inhibitor removed");
        if self.inhibitors == 0 {
            return self.rearm();
        }
        None
    }

    /// Input activity or an explicit wake: back to Active with a fresh timer.
    pub fn wake(&mut self) -> Option<IdleTransition> {
        self.rearm()
    }

    fn rearm(&mut self) -> Option<IdleTransition> {
        self.idle_for = Duration::ZERO;
        if self.state == PowerState::Active {
            return None;
        }
        info!(from = ?self.state, "Waking up");
        self.state = PowerState::Active;
        Some(IdleTransition::Wake)
    }

    /// Advances virtual time; returns the transitions that fired, in order.
    pub fn advance(&mut self, dt: Duration) -> Vec<IdleTransition> {
        let mut fired = Vec::new();
        if self.is_inhibited() {
            return fired;
        }
        self.idle_for += dt;

        if self.state == PowerState::Active {
            if let Some(timeout) = self.effective_display_timeout() {
                if self.idle_for >= timeout {
                    info!(idle_for = ?self.idle_for, "Display going to sleep");
                    self.state = PowerState::DisplayAsleep;
                    fired.push(IdleTransition::DisplaySleep);
                }
            }
        }
        if self.state != PowerState::SystemAsleep {
            if let Some(timeout) = self.system_timeout {
                if self.idle_for >= timeout {
                    info!(idle_for = ?self.idle_for, "System going to sleep");
                    self.state = PowerState::SystemAsleep;
                    fired.push(IdleTransition::SystemSleep);
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn display_then_system() {
        let mut idle = IdlePowerController::new(Some(secs(10)), Some(secs(30)));
        assert!(idle.advance(secs(9)).is_empty());
        assert_eq!(idle.advance(secs(1)), vec![IdleTransition::DisplaySleep]);
        assert!(idle.advance(secs(10)).is_empty());
        assert_eq!(idle.advance(secs(10)), vec![IdleTransition::SystemSleep]);
        assert_eq!(idle.state(), PowerState::SystemAsleep);
        assert!(idle.advance(secs(100)).is_empty());
    }

    #[test]
    fn one_long_step_fires_both_in_order() {
        let mut idle = IdlePowerController::new(Some(secs(10)), Some(secs(30)));
        assert_eq!(
            idle.advance(secs(60)),
            vec![IdleTransition::DisplaySleep, IdleTransition::SystemSleep]
        );
    }

    #[test]
    fn display_path_disabled_when_not_shorter() {
        let mut idle = IdlePowerController::new(Some(secs(30)), Some(secs(30)));
        assert_eq!(idle.effective_display_timeout(), None);
        assert_eq!(idle.advance(secs(30)), vec![IdleTransition::SystemSleep]);
    }

    #[test]
    fn inhibitor_freezes_timers() {
        let mut idle = IdlePowerController::new(Some(secs(10)), Some(secs(30)));
        idle.advance(secs(5));
        idle.inhibit();
        assert!(idle.advance(secs(100)).is_empty());
        assert_eq!(idle.state(), PowerState::Active);
        assert_eq!(idle.uninhibit(), None);
        assert_eq!(idle.idle_for(), Duration::ZERO);
        assert!(idle.advance(secs(9)).is_empty());
        assert_eq!(idle.advance(secs(1)), vec![IdleTransition::DisplaySleep]);
    }

    #[test]
    fn nested_inhibitors_need_all_released() {
        let mut idle = IdlePowerController::new(Some(secs(10)), None);
        idle.inhibit();
        idle.inhibit();
        idle.uninhibit();
        assert!(idle.advance(secs(20)).is_empty());
        idle.uninhibit();
        assert_eq!(idle.advance(secs(10)), vec![IdleTransition::DisplaySleep]);
    }

    #[test]
    fn wake_returns_to_active() {
        let mut idle = IdlePowerController::new(Some(secs(10)), None);
        idle.advance(secs(10));
        assert_eq!(idle.wake(), Some(IdleTransition::Wake));
        assert_eq!(idle.state(), PowerState::Active);
        assert_eq!(idle.wake(), None);
    }

    #[test]
    fn new_timeouts_apply_to_the_running_timer() {
        let mut idle = IdlePowerController::new(Some(secs(300)), Some(secs(900)));
        idle.advance(secs(20));
        idle.set_timeouts(Some(secs(30)), None);
        assert_eq!(idle.effective_display_timeout(), Some(secs(30)));
        assert_eq!(idle.advance(secs(10)), vec![IdleTransition::DisplaySleep]);
        assert!(idle.advance(secs(1000)).is_empty());
    }

    #[test]
    fn uninhibit_without_inhibitor_is_ignored() {
        let mut idle = IdlePowerController::default();
        assert_eq!(idle.uninhibit(), None);
        assert_eq!(idle.inhibitor_count(), 0);
    }
}
