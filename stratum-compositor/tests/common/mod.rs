#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use stratum_compositor::interfaces::{DecorationRenderer, DecorationRequest, PowerBackend, WindowManagementSink};
use stratum_compositor::protocols::xdg_shell::XdgShellRequest;
use stratum_compositor::{ClientId, Collaborators, Desktop, OutputId, SurfaceCommit, WindowId};
use stratum_core::{CoreConfig, Rect, Size};
use uuid::Uuid;

pub const ALICE: ClientId = ClientId::from_raw(1);
pub const BOB: ClientId = ClientId::from_raw(2);

/// Everything the collaborators were asked to do, in order.
#[derive(Debug, Default)]
pub struct Journal {
    pub redecorated: Vec<WindowId>,
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    pub stacking: Vec<String>,
    pub power: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct Recorder(pub Rc<RefCell<Journal>>);

impl DecorationRenderer for Recorder {
    fn redecorate(&mut self, request: &DecorationRequest) {
        self.0.borrow_mut().redecorated.push(request.window);
    }
}

impl WindowManagementSink for Recorder {
    fn window_added(&mut self, window: Uuid, _title: &str, _app_id: &str) {
        self.0.borrow_mut().added.push(window);
    }

    fn window_removed(&mut self, window: Uuid) {
        self.0.borrow_mut().removed.push(window);
    }

    fn stacking_changed(&mut self, order: &str) {
        self.0.borrow_mut().stacking.push(order.to_string());
    }
}

impl PowerBackend for Recorder {
    fn display_sleep(&mut self) {
        self.0.borrow_mut().power.push("display_sleep");
    }

    fn system_sleep(&mut self) {
        self.0.borrow_mut().power.push("system_sleep");
    }

    fn wake(&mut self) {
        self.0.borrow_mut().power.push("wake");
    }
}

pub struct Fixture {
    pub desktop: Desktop,
    pub output: OutputId,
    pub journal: Rc<RefCell<Journal>>,
}

/// Config without animations so state changes land in one step.
pub fn test_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.animation.enabled = false;
    config
}

pub fn fixture() -> Fixture {
    fixture_with(test_config())
}

pub fn fixture_with(config: CoreConfig) -> Fixture {
    let recorder = Recorder::default();
    let journal = recorder.0.clone();
    let collaborators = Collaborators {
        decorations: Box::new(recorder.clone()),
        window_management: Box::new(recorder.clone()),
        power: Box::new(recorder),
    };
    let mut desktop = Desktop::new(config, collaborators);
    let output = desktop.add_output("eDP-1", Rect::new(0, 0, 1920, 1080), 1);
    desktop.connect_client(ALICE);
    desktop.connect_client(BOB);
    Fixture {
        desktop,
        output,
        journal,
    }
}

/// Creates and maps an xdg toplevel of `size`.
pub fn map_toplevel(desktop: &mut Desktop, client: ClientId, size: Size) -> WindowId {
    let surface = desktop.create_surface(client).expect("surface");
    desktop.handle_xdg_shell(client, XdgShellRequest::GetToplevel { surface });
    desktop.commit(client, surface, SurfaceCommit::empty());
    desktop.commit(client, surface, SurfaceCommit::with_buffer(size));
    surface
}

/// Serial of the newest configure queued for `window`.
pub fn last_configure_serial(desktop: &Desktop, window: WindowId) -> Option<u32> {
    use stratum_compositor::ClientEvent;
    desktop.pending_events().iter().rev().find_map(|(_, event)| match event {
        ClientEvent::Configure { window: w, serial, .. } if *w == window => Some(*serial),
        ClientEvent::LayerConfigure { window: w, serial, .. } if *w == window => Some(*serial),
        _ => None,
    })
}
