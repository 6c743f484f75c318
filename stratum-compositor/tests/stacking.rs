mod common;

use common::{fixture, map_toplevel, ALICE, BOB};
use pretty_assertions::assert_eq;
use rstest::rstest;
use stratum_compositor::protocols::xdg_shell::XdgShellRequest;
use stratum_compositor::window::{Anchor, Layer, Positioner};
use stratum_compositor::{ClientEvent, SurfaceCommit, WindowFlags, WindowId, MAX_RAISE_NEXT_RESTARTS};
use stratum_core::{Point, Rect, Size};

#[test]
fn raise_puts_window_last_and_activated() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    assert_eq!(f.desktop.z_order(), &[a, b]);

    f.desktop.raise(a);
    assert_eq!(f.desktop.z_order().last(), Some(&a));
    assert_eq!(f.desktop.active_window(), Some(a));
    assert!(f.desktop.window(a).unwrap().is_activated());
    assert!(!f.desktop.window(b).unwrap().is_activated());
    assert_eq!(f.desktop.z_order().len(), 2);
}

#[test]
fn raise_sends_activated_and_deactivated() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    f.desktop.take_events();

    f.desktop.raise(a);
    let events = f.desktop.take_events();
    assert!(events.contains(&(BOB, ClientEvent::Deactivated { window: b })));
    assert!(events.contains(&(ALICE, ClientEvent::Activated { window: a })));
}

#[test]
fn raising_the_active_top_window_changes_nothing() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.take_events();
    f.desktop.raise(a);
    assert!(f.desktop.take_events().is_empty());
}

#[test]
fn cursor_surfaces_are_never_raised() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let cursor = f.desktop.create_surface(BOB).unwrap();
    f.desktop.set_cursor_surface(BOB, cursor);

    let before = f.desktop.z_order().to_vec();
    f.desktop.raise(cursor);
    assert_eq!(f.desktop.z_order(), before.as_slice());
    assert_eq!(f.desktop.active_window(), Some(a));
    assert!(!f.desktop.window(cursor).unwrap().is_activated());
}

#[test]
fn destroy_leaves_no_references() {
    let mut f = fixture();
    let parent = map_toplevel(&mut f.desktop, ALICE, Size::new(400, 300));
    let dialog = map_toplevel(&mut f.desktop, ALICE, Size::new(200, 100));
    f.desktop.handle_xdg_shell(
        ALICE,
        XdgShellRequest::SetParent {
            surface: dialog,
            parent: Some(parent),
        },
    );
    let popup = f.desktop.create_surface(ALICE).unwrap();
    f.desktop.handle_xdg_shell(
        ALICE,
        XdgShellRequest::GetPopup {
            surface: popup,
            parent,
            positioner: Positioner {
                size: Size::new(100, 50),
                anchor_rect: Rect::new(0, 0, 400, 20),
                anchor: Anchor::BOTTOM | Anchor::LEFT,
                offset: Point::ZERO,
            },
        },
    );
    f.desktop.commit(ALICE, popup, SurfaceCommit::with_buffer(Size::new(100, 50)));
    f.desktop.take_events();

    f.desktop.destroy_window(parent);

    assert!(!f.desktop.is_registered(parent));
    assert!(!f.desktop.is_registered(popup));
    assert!(!f.desktop.stacking().references(parent));
    assert!(!f.desktop.stacking().references(popup));
    for window in f.desktop.windows() {
        assert!(!window.children().contains(&parent));
        assert_ne!(window.parent().map(|p| p.id()), Some(parent));
    }
    assert_eq!(f.desktop.window(dialog).unwrap().parent(), None);
    assert!(f
        .desktop
        .take_events()
        .contains(&(ALICE, ClientEvent::Closed { window: popup })));
}

#[test]
fn destroying_the_active_window_activates_the_next() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    assert_eq!(f.desktop.active_window(), Some(b));

    f.desktop.destroy_window(b);
    assert_eq!(f.desktop.active_window(), Some(a));
    assert!(f.desktop.window(a).unwrap().is_activated());
}

#[test]
fn raise_next_in_line_with_nothing_left_is_a_no_op() {
    let mut f = fixture();
    f.desktop.raise_next_in_line();
    assert_eq!(f.desktop.active_window(), None);
    assert!(f.desktop.take_events().is_empty());
}

#[test]
fn raise_next_in_line_falls_back_to_desktop_surface() {
    let mut f = fixture();
    let wallpaper = f.desktop.create_surface(BOB).unwrap();
    f.desktop.handle_layer_shell(
        BOB,
        stratum_compositor::protocols::layer_shell::LayerShellRequest::GetLayerSurface {
            surface: wallpaper,
            output: Some(f.output),
            layer: Layer::Bottom,
            namespace: "wallpaper".into(),
        },
    );
    f.desktop.reset_layer_shell_layer(wallpaper, Layer::Background);
    assert_eq!(f.desktop.desktop_windows(), &[wallpaper]);

    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.destroy_window(a);
    assert!(f.desktop.z_order().is_empty());
    assert_eq!(f.desktop.active_window(), Some(wallpaper));
}

#[test]
fn minimized_windows_are_skipped_for_focus() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let c = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.handle_xdg_shell(ALICE, XdgShellRequest::SetMinimized { surface: b });
    f.desktop.destroy_window(c);
    assert_eq!(f.desktop.active_window(), Some(a));

    f.desktop.raise(b);
    assert!(!f.desktop.window(b).unwrap().flags().contains(WindowFlags::MINIMIZED));
    assert_eq!(f.desktop.z_order().last(), Some(&b));
}

#[test]
fn transient_child_follows_parent_to_top() {
    let mut f = fixture();
    let parent = map_toplevel(&mut f.desktop, ALICE, Size::new(400, 300));
    let dialog = map_toplevel(&mut f.desktop, ALICE, Size::new(200, 100));
    f.desktop.handle_xdg_shell(
        ALICE,
        XdgShellRequest::SetParent {
            surface: dialog,
            parent: Some(parent),
        },
    );
    let other = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    assert_eq!(f.desktop.z_order().last(), Some(&other));

    f.desktop.raise(parent);
    assert_eq!(f.desktop.z_order(), &[other, parent, dialog]);
    assert_eq!(f.desktop.active_window(), Some(dialog));
}

#[test]
fn parent_cycles_are_rejected() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.handle_xdg_shell(ALICE, XdgShellRequest::SetParent { surface: b, parent: Some(a) });
    f.desktop.take_events();

    f.desktop.handle_xdg_shell(ALICE, XdgShellRequest::SetParent { surface: a, parent: Some(b) });
    let events = f.desktop.take_events();
    assert!(matches!(
        events.as_slice(),
        [(_, ClientEvent::ProtocolError { code: stratum_compositor::ProtocolErrorKind::InvalidParent, .. })]
    ));
    assert_eq!(f.desktop.window(a).unwrap().parent(), None);
}

#[test]
fn lower_moves_to_bottom_and_hands_off_focus() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    f.desktop.lower(b);
    assert_eq!(f.desktop.z_order(), &[b, a]);
    assert_eq!(f.desktop.active_window(), Some(a));
}

#[test]
fn lost_client_is_torn_down_on_activation() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    f.desktop.mark_client_lost(ALICE);

    f.desktop.destroy_window(b);
    assert!(!f.desktop.is_registered(a));
    assert_eq!(f.desktop.active_window(), None);
    assert!(f.desktop.z_order().is_empty());
}

#[rstest]
#[case::within_the_cap(MAX_RAISE_NEXT_RESTARTS, true)]
#[case::beyond_the_cap(MAX_RAISE_NEXT_RESTARTS + 4, false)]
fn successor_scan_restarts_are_bounded(#[case] lost_windows: usize, #[case] healthy_focused: bool) {
    let mut f = fixture();
    let healthy = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let lost: Vec<WindowId> = (0..lost_windows)
        .map(|_| map_toplevel(&mut f.desktop, BOB, Size::new(300, 200)))
        .collect();
    let top = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.mark_client_lost(BOB);

    f.desktop.destroy_window(top);

    let survivors = lost.iter().filter(|w| f.desktop.is_registered(**w)).count();
    if healthy_focused {
        assert_eq!(f.desktop.active_window(), Some(healthy));
        assert_eq!(survivors, 0);
    } else {
        assert_eq!(f.desktop.active_window(), None);
        assert_eq!(survivors, lost_windows - (MAX_RAISE_NEXT_RESTARTS + 1));
        assert!(f.desktop.is_registered(healthy));
    }
}

#[test]
fn client_disconnect_removes_everything_it_owned() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let a2 = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    f.desktop.raise(a2);
    f.desktop.create_idle_inhibitor(ALICE, a).unwrap();
    let token = f.desktop.get_activation_token(ALICE);
    f.desktop.commit_activation_token(ALICE, token).unwrap();

    f.desktop.client_disconnected(ALICE);

    assert!(!f.desktop.is_registered(a));
    assert!(!f.desktop.is_registered(a2));
    assert_eq!(f.desktop.z_order(), &[b]);
    assert_eq!(f.desktop.active_window(), Some(b));
    assert_eq!(f.desktop.inhibitor_count(), 0);
    assert!(!f.desktop.idle().is_inhibited());
    assert!(f.desktop.pending_events().iter().all(|(client, _)| *client != ALICE));
}

#[test]
fn published_stacking_lists_uuids_bottom_to_top() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    let b = map_toplevel(&mut f.desktop, BOB, Size::new(300, 200));
    let ua = f.desktop.window(a).unwrap().uuid();
    let ub = f.desktop.window(b).unwrap().uuid();
    assert_eq!(f.desktop.published_stacking(), Some(format!("{},{}", ua, ub).as_str()));

    f.desktop.raise(a);
    assert_eq!(f.desktop.published_stacking(), Some(format!("{},{}", ub, ua).as_str()));
    let journal = f.journal.borrow();
    assert_eq!(journal.added, vec![ua, ub]);
    assert_eq!(journal.stacking.last().map(String::as_str), f.desktop.published_stacking());
}

#[test]
fn foreign_window_requests_are_protocol_errors() {
    let mut f = fixture();
    let a = map_toplevel(&mut f.desktop, ALICE, Size::new(300, 200));
    f.desktop.take_events();
    f.desktop.handle_xdg_shell(BOB, XdgShellRequest::SetMaximized { surface: a });
    let events = f.desktop.take_events();
    assert!(matches!(
        events.as_slice(),
        [(client, ClientEvent::ProtocolError { code: stratum_compositor::ProtocolErrorKind::InvalidObject, .. })]
            if *client == BOB
    ));
}
