mod common;

use common::{fixture, fixture_with, map_toplevel, test_config, ALICE, BOB};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::time::Duration;
use stratum_compositor::PowerState;
use stratum_core::{Point, Size};

const SEC: Duration = Duration::from_secs(1);

#[test]
fn display_then_system_sleep_on_schedule() {
    let mut f = fixture();
    f.desktop.advance_idle(299 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::Active);
    f.desktop.advance_idle(SEC);
    assert_eq!(f.desktop.power_state(), PowerState::DisplayAsleep);
    f.desktop.advance_idle(600 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::SystemAsleep);
    assert_eq!(f.journal.borrow().power, vec!["display_sleep", "system_sleep"]);
}

#[test]
fn one_long_step_fires_both_in_order() {
    let mut f = fixture();
    f.desktop.advance_idle(3600 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::SystemAsleep);
    assert_eq!(f.journal.borrow().power, vec!["display_sleep", "system_sleep"]);
}

#[test]
fn activity_wakes_and_restarts_the_timer() {
    let mut f = fixture();
    f.desktop.advance_idle(300 * SEC);
    f.desktop.pointer_motion(Point::new(10, 10));
    assert_eq!(f.desktop.power_state(), PowerState::Active);
    assert_eq!(f.journal.borrow().power, vec!["display_sleep", "wake"]);

    f.desktop.advance_idle(299 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::Active);
}

#[test]
fn activity_while_active_sends_nothing() {
    let mut f = fixture();
    f.desktop.advance_idle(100 * SEC);
    f.desktop.notify_activity();
    assert!(f.journal.borrow().power.is_empty());
    assert_eq!(f.desktop.idle().idle_for(), Duration::ZERO);
}

#[test]
fn inhibitor_blocks_sleep() {
    let mut f = fixture();
    let window = map_toplevel(&mut f.desktop, ALICE, Size::new(640, 360));
    f.desktop.create_idle_inhibitor(ALICE, window).unwrap();
    f.desktop.advance_idle(10_000 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::Active);
    assert!(f.journal.borrow().power.is_empty());
}

#[test]
fn timer_restarts_from_zero_after_uninhibit() {
    let mut f = fixture();
    let window = map_toplevel(&mut f.desktop, ALICE, Size::new(640, 360));
    f.desktop.advance_idle(200 * SEC);
    let inhibitor = f.desktop.create_idle_inhibitor(ALICE, window).unwrap();
    f.desktop.advance_idle(1000 * SEC);
    f.desktop.destroy_idle_inhibitor(ALICE, inhibitor);

    f.desktop.advance_idle(299 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::Active);
    f.desktop.advance_idle(SEC);
    assert_eq!(f.journal.borrow().power, vec!["display_sleep"]);
}

#[test]
fn nested_inhibitors_need_all_released() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(640, 360));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(640, 360));
    let first = f.desktop.create_idle_inhibitor(ALICE, a).unwrap();
    f.desktop.create_idle_inhibitor(BOB, b).unwrap();
    assert_eq!(f.desktop.idle().inhibitor_count(), 2);

    f.desktop.destroy_idle_inhibitor(ALICE, first);
    f.desktop.advance_idle(400 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::Active);
}

#[test]
fn destroying_the_surface_releases_its_inhibitor() {
    let mut f = fixture();
    let window = map_toplevel(&mut f.desktop, ALICE, Size::new(640, 360));
    f.desktop.create_idle_inhibitor(ALICE, window).unwrap();
    f.desktop.destroy_surface(ALICE, window);

    assert_eq!(f.desktop.inhibitor_count(), 0);
    assert!(!f.desktop.idle().is_inhibited());
    f.desktop.advance_idle(300 * SEC);
    assert_eq!(f.desktop.power_state(), PowerState::DisplayAsleep);
}

#[test]
fn foreign_inhibitor_destroy_is_ignored() {
    let mut f = fixture();
    let window = map_toplevel(&mut f.desktop, ALICE, Size::new(640, 360));
    let inhibitor = f.desktop.create_idle_inhibitor(ALICE, window).unwrap();
    f.desktop.destroy_idle_inhibitor(BOB, inhibitor);
    assert_eq!(f.desktop.inhibitor_count(), 1);
    assert!(f.desktop.idle().is_inhibited());
}

#[rstest]
#[case::display_disabled(0, 900, PowerState::SystemAsleep, vec!["system_sleep"])]
#[case::system_disabled(300, 0, PowerState::DisplayAsleep, vec!["display_sleep"])]
#[case::display_not_shorter(900, 600, PowerState::SystemAsleep, vec!["system_sleep"])]
#[case::both_disabled(0, 0, PowerState::Active, vec![])]
fn timeout_configurations(
    #[case] display: u64,
    #[case] system: u64,
    #[case] expected: PowerState,
    #[case] transitions: Vec<&'static str>,
) {
    let mut config = test_config();
    config.idle.display_timeout_secs = display;
    config.idle.system_timeout_secs = system;
    let mut f = fixture_with(config);
    f.desktop.advance_idle(1000 * SEC);
    assert_eq!(f.desktop.power_state(), expected);
    assert_eq!(f.journal.borrow().power, transitions);
}

#[test]
fn tick_drives_idle_time() {
    let mut f = fixture();
    for _ in 0..300 {
        f.desktop.tick(SEC);
    }
    assert_eq!(f.desktop.power_state(), PowerState::DisplayAsleep);
}
