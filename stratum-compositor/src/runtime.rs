// stratum-compositor/src/runtime.rs

//! Event loop wiring.
//!
//! [`CompositorRuntime`] owns a `calloop` loop whose shared data is the
//! [`Desktop`]. A repeating timer drives [`Desktop::tick`] with the real time
//! elapsed between firings; transports register their own sources through
//! [`CompositorRuntime::handle`].

use crate::desktop::Desktop;
use crate::error::{CompositorError, CompositorResult};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopHandle, LoopSignal, RegistrationToken};
use std::time::{Duration, Instant};
use stratum_core::ConfigProvider;
use tracing::{debug, info, trace};

pub struct CompositorRuntime {
    event_loop: EventLoop<'static, Desktop>,
    frame_timer: RegistrationToken,
}

impl std::fmt::Debug for CompositorRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositorRuntime")
            .field("frame_timer", &self.frame_timer)
            .finish_non_exhaustive()
    }
}

impl CompositorRuntime {
    /// Creates the loop and schedules a frame tick every `tick`.
    pub fn new(tick: Duration) -> CompositorResult<Self> {
        let event_loop: EventLoop<'static, Desktop> =
            EventLoop::try_new().map_err(|e| CompositorError::EventLoop(e.to_string()))?;

        let mut last = Instant::now();
        let frame_timer = event_loop
            .handle()
            .insert_source(Timer::from_duration(tick), move |deadline, _, desktop: &mut Desktop| {
                let dt = deadline.saturating_duration_since(last);
                last = deadline;
                let report = desktop.tick(dt);
                trace!(
                    ?dt,
                    redecorated = report.redecorated.len(),
                    presented = report.presented.len(),
                    "Frame tick"
                );
                TimeoutAction::ToDuration(tick)
            })
            .map_err(|e| CompositorError::EventLoop(e.error.to_string()))?;

        info!(?tick, "Compositor runtime created");
        Ok(CompositorRuntime {
            event_loop,
            frame_timer,
        })
    }

    pub fn handle(&self) -> LoopHandle<'static, Desktop> {
        self.event_loop.handle()
    }

    /// Signal that stops [`Self::run`] from another source callback or thread.
    pub fn signal(&self) -> LoopSignal {
        self.event_loop.get_signal()
    }

    /// Polls `provider` every `interval` and applies configuration changes.
    pub fn watch_config<P>(&self, provider: P, interval: Duration) -> CompositorResult<RegistrationToken>
    where
        P: ConfigProvider + 'static,
    {
        self.event_loop
            .handle()
            .insert_source(Timer::from_duration(interval), move |_, _, desktop: &mut Desktop| {
                desktop.sync_config(&provider);
                TimeoutAction::ToDuration(interval)
            })
            .map_err(|e| CompositorError::EventLoop(e.error.to_string()))
    }

    /// Runs one dispatch round, waiting at most `timeout` for an event.
    pub fn dispatch(&mut self, timeout: Option<Duration>, desktop: &mut Desktop) -> CompositorResult<()> {
        self.event_loop
            .dispatch(timeout, desktop)
            .map_err(|e| CompositorError::EventLoop(e.to_string()))
    }

    /// Dispatches until [`Self::signal`] is stopped.
    pub fn run(&mut self, desktop: &mut Desktop) -> CompositorResult<()> {
        info!("Entering compositor event loop");
        self.event_loop
            .run(None::<Duration>, desktop, |_| {})
            .map_err(|e| CompositorError::EventLoop(e.to_string()))?;
        debug!("Compositor event loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientId;
    use crate::desktop::SurfaceCommit;
    use crate::interfaces::Collaborators;
    use crate::protocols::xdg_shell::XdgShellRequest;
    use pretty_assertions::assert_eq;
    use stratum_core::{CoreConfig, Rect, Size, StaticConfigProvider};

    #[test]
    fn frame_timer_drains_pipeline() {
        let mut desktop = Desktop::new(CoreConfig::default(), Collaborators::default());
        desktop.add_output("test-0", Rect::new(0, 0, 800, 600), 1);
        let client = ClientId::from_raw(1);
        desktop.connect_client(client);
        let surface = desktop.create_surface(client).unwrap();
        desktop.handle_xdg_shell(client, XdgShellRequest::GetToplevel { surface });
        desktop.commit(client, surface, SurfaceCommit::with_buffer(Size::new(200, 100)));
        assert!(!desktop.pipeline().is_idle());

        let mut runtime = CompositorRuntime::new(Duration::from_millis(1)).unwrap();
        for _ in 0..50 {
            runtime.dispatch(Some(Duration::from_millis(20)), &mut desktop).unwrap();
            if desktop.pipeline().is_idle() {
                break;
            }
        }
        assert!(desktop.pipeline().is_idle());
    }

    #[test]
    fn config_watch_applies_provider() {
        let mut desktop = Desktop::new(CoreConfig::default(), Collaborators::default());
        let mut config = CoreConfig::default();
        config.limits.max_windows = 3;
        let provider = StaticConfigProvider::with_config(config);

        let mut runtime = CompositorRuntime::new(Duration::from_secs(60)).unwrap();
        runtime.watch_config(provider, Duration::from_millis(1)).unwrap();
        for _ in 0..50 {
            runtime.dispatch(Some(Duration::from_millis(20)), &mut desktop).unwrap();
            if desktop.config().limits.max_windows == 3 {
                break;
            }
        }
        assert_eq!(desktop.config().limits.max_windows, 3);
    }
}
