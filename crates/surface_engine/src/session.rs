//! Session facade and the run loop that drives it
//!
//! A session is constructed once per embedding application. Callers take
//! any proxies they need first, then hand the thread to [`Session::run`],
//! which owns the window registry and every renderer binding until the loop
//! terminates. No code after `run()` in the calling thread executes while
//! the loop is running; all interaction goes through the proxy channel.

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::time::Instant;

use crate::backend::RenderBackend;
use crate::command::Command;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::proxy::SessionProxy;
use crate::registry::WindowRegistry;
use crate::timing::TickTimer;

/// Observer invoked when the run loop terminates on a fatal error
pub type TerminationObserver = Box<dyn FnOnce(&SessionError) + Send>;

/// One engine session
///
/// Uninitialized until [`run`](Self::run) is called, Running while the loop
/// holds the thread, Terminated when `run` returns. The registry is created
/// when the loop starts and destroyed when it exits.
pub struct Session {
    config: SessionConfig,
    backend: Box<dyn RenderBackend>,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    on_terminate: Option<TerminationObserver>,
}

impl Session {
    /// Construct a session; the run loop does not start yet
    pub fn new(config: SessionConfig, backend: Box<dyn RenderBackend>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            config,
            backend,
            tx,
            rx,
            on_terminate: None,
        }
    }

    /// A cloneable proxy into the run loop
    ///
    /// Must be taken before [`run`](Self::run): `run` consumes the session,
    /// so no direct calls are possible afterwards.
    pub fn proxy(&self) -> SessionProxy {
        SessionProxy::new(self.tx.clone(), self.config.reply_timeout())
    }

    /// Register an observer for fatal termination
    ///
    /// Called with the fatal error before `run` returns it. Without an
    /// observer the error is still returned from `run`, which is terminal
    /// for the calling thread's control flow anyway.
    pub fn on_terminate(&mut self, observer: impl FnOnce(&SessionError) + Send + 'static) {
        self.on_terminate = Some(Box::new(observer));
    }

    /// Run the loop, blocking the calling thread until termination
    ///
    /// Each tick drains queued commands under the fairness cap, applies them
    /// to the registry, renders every active window, then parks until the
    /// next tick deadline or the next command. Returns `Ok(())` on an
    /// orderly stop (shutdown command or tick limit) and the fatal error
    /// otherwise.
    pub fn run(self) -> Result<(), SessionError> {
        let Self {
            config,
            mut backend,
            tx,
            rx,
            on_terminate,
        } = self;
        // From here on only proxies keep the channel open.
        drop(tx);

        let mut registry = WindowRegistry::new(config.max_windows);
        let mut pending: VecDeque<Command> = VecDeque::new();
        let mut timer = TickTimer::new();
        let interval = config.tick_interval();
        info!("session loop running at {} Hz", config.tick_hz);

        let result = loop {
            timer.update();

            // Drain commands, bounded per tick so rendering is never starved.
            let mut shutdown = false;
            let mut applied = 0;
            while applied < config.max_commands_per_tick && !shutdown {
                let command = match pending.pop_front() {
                    Some(command) => command,
                    None => match rx.try_recv() {
                        Ok(command) => command,
                        Err(_) => break,
                    },
                };
                shutdown = apply_command(&mut registry, command);
                applied += 1;
            }
            if shutdown {
                info!("shutdown requested after {} ticks", timer.ticks());
                break Ok(());
            }

            // Render every active window; per-window failures stay per-window.
            if let Err(fatal) = render_active(&mut registry, backend.as_mut()) {
                error!("terminating session loop: {fatal}");
                break Err(fatal);
            }

            if config.log_tick_stats && timer.ticks() % u64::from(config.tick_hz.max(1)) == 0 {
                debug!(
                    "tick {}: {} windows, {:.1} ticks/s average",
                    timer.ticks(),
                    registry.len(),
                    timer.average_rate()
                );
            }

            if let Some(max_ticks) = config.max_ticks {
                if timer.ticks() >= max_ticks {
                    info!("tick limit {max_ticks} reached");
                    break Ok(());
                }
            }

            // Park until the next tick or the next command, whichever first.
            let wait = timer
                .next_deadline(interval)
                .saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(command) => pending.push_back(command),
                Err(RecvTimeoutError::Timeout) => {}
                // Every proxy is gone; keep ticking on the timer alone.
                Err(RecvTimeoutError::Disconnected) => std::thread::sleep(wait),
            }
        };

        // Dropping the receiver is what makes later sends fail ChannelClosed.
        drop(rx);
        if let Err(fatal) = &result {
            if let Some(observer) = on_terminate {
                observer(fatal);
            }
        }
        info!("session loop terminated");
        result
    }
}

/// Apply one command to the registry; returns true on a stop request
fn apply_command(registry: &mut WindowRegistry, command: Command) -> bool {
    match command {
        Command::CreateWindow { surface, reply } => {
            let result = registry.create(surface);
            // A dropped receiver means the caller cancelled its wait; the
            // reply is discarded by design.
            let _ = reply.send(result);
        }
        Command::DeleteWindow(handle) => {
            if let Err(err) = registry.remove(handle) {
                warn!("delete_window: {err}");
            }
        }
        Command::UpdateProperty { target, key, value } => {
            if let Err(err) = registry.update_property(target, &key, value) {
                warn!("update_property {key:?}: {err}");
            }
        }
        Command::Event(payload) => registry.dispatch_event(&payload),
        Command::Shutdown => return true,
    }
    false
}

/// Render one tick's worth of frames
///
/// Bindings are created lazily once a surface reports an extent, and
/// reconfigured in place when the extent changes. Only a fatal platform
/// error propagates out of here.
fn render_active(
    registry: &mut WindowRegistry,
    backend: &mut dyn RenderBackend,
) -> Result<(), SessionError> {
    for (handle, window) in registry.iter_mut() {
        let Some(extent) = backend.surface_extent(&window.surface) else {
            // Surface not ready; the binding stays lazy until it is.
            continue;
        };

        if window.binding.is_none() {
            match backend.create_binding(&window.surface, extent) {
                Ok(binding) => {
                    debug!("binding created for window {handle:?} at {extent}");
                    window.binding = Some(binding);
                    window.extent = Some(extent);
                }
                Err(fatal @ SessionError::FatalPlatformError(_)) => return Err(fatal),
                Err(err) => {
                    error!("binding for window {handle:?} failed: {err}");
                    continue;
                }
            }
        } else if window.extent != Some(extent) {
            if let Some(binding) = window.binding.as_mut() {
                match binding.reconfigure(extent) {
                    Ok(()) => {
                        debug!("window {handle:?} reconfigured to {extent}");
                        window.extent = Some(extent);
                    }
                    Err(fatal @ SessionError::FatalPlatformError(_)) => return Err(fatal),
                    Err(err) => {
                        error!("reconfigure for window {handle:?} failed: {err}");
                        continue;
                    }
                }
            }
        }

        if let Some(binding) = window.binding.as_mut() {
            if let Err(err) = binding.render(&window.props) {
                match err {
                    fatal @ SessionError::FatalPlatformError(_) => return Err(fatal),
                    // The window stays registered; the caller decides
                    // whether to delete it.
                    err => error!("render failed for window {handle:?}: {err}"),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{EventPayload, PropertyTarget};
    use crate::headless::{HeadlessBackend, HeadlessControl};
    use crate::logging;
    use crate::properties::PropertyValue;
    use crate::surface::{SurfaceExtent, SurfaceRef};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    fn test_config() -> SessionConfig {
        SessionConfig {
            tick_hz: 200,
            reply_timeout_ms: 2000,
            ..SessionConfig::default()
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn start_session(
        config: SessionConfig,
    ) -> (
        SessionProxy,
        HeadlessControl,
        thread::JoinHandle<Result<(), SessionError>>,
    ) {
        logging::init_for_tests();
        let (backend, control) = HeadlessBackend::new();
        let session = Session::new(config, Box::new(backend));
        let proxy = session.proxy();
        let join = thread::spawn(move || session.run());
        (proxy, control, join)
    }

    #[test]
    fn run_blocks_caller_until_shutdown() {
        logging::init_for_tests();
        let (backend, _control) = HeadlessBackend::new();
        let session = Session::new(test_config(), Box::new(backend));
        let proxy = session.proxy();

        let resumed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&resumed);
        let join = thread::spawn(move || {
            let result = session.run();
            // Nothing before this line runs until the loop terminates.
            flag.store(true, Ordering::SeqCst);
            result
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!resumed.load(Ordering::SeqCst));

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
        assert!(resumed.load(Ordering::SeqCst));
    }

    #[test]
    fn tick_limit_terminates_the_loop() {
        logging::init_for_tests();
        let (backend, _control) = HeadlessBackend::new();
        let config = SessionConfig {
            max_ticks: Some(3),
            ..test_config()
        };
        let session = Session::new(config, Box::new(backend));
        let _proxy = session.proxy();

        // Runs on this thread: returning at all proves the limit fired.
        session.run().unwrap();
    }

    #[test]
    fn two_window_property_scenario() {
        let (proxy, control, join) = start_session(test_config());
        let canvas1 = SurfaceRef::new("canvas1");
        let canvas2 = SurfaceRef::new("canvas2");
        control.set_extent(&canvas1, SurfaceExtent::new(640, 480));
        control.set_extent(&canvas2, SurfaceExtent::new(640, 480));

        let w1 = proxy.create_window(canvas1.clone()).unwrap();
        let w2 = proxy.create_window(canvas2.clone()).unwrap();
        assert_ne!(w1, w2);

        proxy
            .update_property(PropertyTarget::Window(w1), "red", PropertyValue::Int(128))
            .unwrap();

        assert!(wait_until(Duration::from_secs(2), || {
            control
                .frames_for(&canvas1)
                .iter()
                .any(|f| f.properties.get("red") == Some(&PropertyValue::Int(128)))
        }));
        // canvas2 never saw the update.
        assert!(control
            .frames_for(&canvas2)
            .iter()
            .all(|f| f.properties.get("red").is_none()));

        // Deleting w1 stops its frames while w2 keeps rendering.
        proxy.delete_window(w1).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            let count = control.frame_count_for(&canvas1);
            thread::sleep(Duration::from_millis(50));
            count == control.frame_count_for(&canvas1)
        }));

        // Updates against the dead handle are rejected by the loop (logged)
        // and must not disturb w2.
        proxy
            .update_property(PropertyTarget::Window(w1), "red", PropertyValue::Int(7))
            .unwrap();
        let before = control.frame_count_for(&canvas2);
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas2) > before
        }));

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn rapid_updates_apply_in_send_order() {
        let (proxy, control, join) = start_session(test_config());
        let canvas = SurfaceRef::new("canvas1");
        control.set_extent(&canvas, SurfaceExtent::new(64, 64));

        let w = proxy.create_window(canvas.clone()).unwrap();
        for value in 1..=5 {
            proxy
                .update_property(PropertyTarget::Window(w), "red", PropertyValue::Int(value))
                .unwrap();
        }

        // Last writer wins: the stream settles on 5, never regresses.
        assert!(wait_until(Duration::from_secs(2), || {
            control
                .frames_for(&canvas)
                .last()
                .and_then(|f| f.properties.get("red").cloned())
                == Some(PropertyValue::Int(5))
        }));

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn concurrent_creates_get_distinct_handles() {
        let (proxy, control, join) = start_session(test_config());
        let canvas1 = SurfaceRef::new("canvas1");
        let canvas2 = SurfaceRef::new("canvas2");
        control.set_extent(&canvas1, SurfaceExtent::new(64, 64));
        control.set_extent(&canvas2, SurfaceExtent::new(64, 64));

        let p1 = proxy.clone();
        let p2 = proxy.clone();
        let s1 = canvas1.clone();
        let s2 = canvas2.clone();
        let t1 = thread::spawn(move || p1.create_window(s1).unwrap());
        let t2 = thread::spawn(move || p2.create_window(s2).unwrap());
        let w1 = t1.join().unwrap();
        let w2 = t2.join().unwrap();
        assert_ne!(w1, w2);

        // Both windows are live regardless of interleaving.
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas1) > 0 && control.frame_count_for(&canvas2) > 0
        }));

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn sends_after_termination_fail_channel_closed() {
        let (proxy, _control, join) = start_session(test_config());
        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();

        assert!(matches!(
            proxy.create_window(SurfaceRef::new("canvas1")),
            Err(SessionError::ChannelClosed)
        ));
        assert!(matches!(
            proxy.update_property(PropertyTarget::Broadcast, "red", PropertyValue::Int(1)),
            Err(SessionError::ChannelClosed)
        ));
    }

    #[test]
    fn create_window_at_capacity_reports_resource_exhaustion() {
        let config = SessionConfig {
            max_windows: 1,
            ..test_config()
        };
        let (proxy, control, join) = start_session(config);
        let canvas1 = SurfaceRef::new("canvas1");
        control.set_extent(&canvas1, SurfaceExtent::new(64, 64));

        let w1 = proxy.create_window(canvas1).unwrap();
        // The registry cap comes back through the reply slot, synchronously.
        let err = proxy.create_window(SurfaceRef::new("canvas2")).unwrap_err();
        assert!(matches!(err, SessionError::ResourceExhausted(_)));

        // Deleting the survivor frees the slot for a later create.
        proxy.delete_window(w1).unwrap();
        assert!(proxy.create_window(SurfaceRef::new("canvas2")).is_ok());

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn create_reply_wait_is_bounded() {
        logging::init_for_tests();
        let (backend, _control) = HeadlessBackend::new();
        // Session constructed but never run: no one answers the reply slot.
        let session = Session::new(test_config(), Box::new(backend));
        let proxy = session.proxy();

        let err = proxy
            .create_window_timeout(SurfaceRef::new("canvas1"), Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, SessionError::ReplyTimeout));
    }

    #[test]
    fn renderer_failure_keeps_window_registered_and_loop_alive() {
        let (proxy, control, join) = start_session(test_config());
        let canvas1 = SurfaceRef::new("canvas1");
        let canvas2 = SurfaceRef::new("canvas2");
        control.set_extent(&canvas1, SurfaceExtent::new(64, 64));
        control.set_extent(&canvas2, SurfaceExtent::new(64, 64));
        control.fail_renders_for(&canvas1);

        let _w1 = proxy.create_window(canvas1.clone()).unwrap();
        let _w2 = proxy.create_window(canvas2.clone()).unwrap();

        // The failing window produces nothing; the loop and the healthy
        // window are unaffected.
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas2) > 3
        }));
        assert_eq!(control.frame_count_for(&canvas1), 0);

        // The window stayed registered: clearing the fault resumes frames
        // without a new create.
        control.clear_render_failure(&canvas1);
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas1) > 0
        }));

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn fatal_error_terminates_loop_and_fires_observer() {
        logging::init_for_tests();
        let (backend, control) = HeadlessBackend::new();
        let mut session = Session::new(test_config(), Box::new(backend));
        let proxy = session.proxy();

        let observed: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        session.on_terminate(move |err| {
            *sink.lock().unwrap() = Some(err.to_string());
        });
        let join = thread::spawn(move || session.run());

        let canvas = SurfaceRef::new("canvas1");
        control.set_extent(&canvas, SurfaceExtent::new(64, 64));
        let _w = proxy.create_window(canvas.clone()).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas) > 0
        }));

        control.trigger_fatal();
        let result = join.join().unwrap();
        assert!(matches!(result, Err(SessionError::FatalPlatformError(_))));
        assert!(observed
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|msg| msg.contains("fatal platform error")));
    }

    #[test]
    fn binding_waits_for_surface_readiness_and_tracks_resizes() {
        let (proxy, control, join) = start_session(test_config());
        let canvas = SurfaceRef::new("canvas1");

        // No extent yet: the window exists but never renders.
        let _w = proxy.create_window(canvas.clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(control.frame_count_for(&canvas), 0);

        // Surface becomes ready: the binding is created lazily and frames
        // start at the reported extent.
        let small = SurfaceExtent::new(100, 100);
        control.set_extent(&canvas, small);
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas) > 0
        }));
        assert_eq!(control.frames_for(&canvas)[0].extent, small);

        // Resize reconfigures in place rather than recreating.
        let large = SurfaceExtent::new(300, 200);
        control.set_extent(&canvas, large);
        assert!(wait_until(Duration::from_secs(2), || {
            control.frames_for(&canvas).last().map(|f| f.extent) == Some(large)
        }));
        assert_eq!(control.reconfigures_for(&canvas), vec![large]);

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }

    #[test]
    fn events_fan_out_to_every_active_window() {
        let (proxy, control, join) = start_session(test_config());
        let canvas1 = SurfaceRef::new("canvas1");
        let canvas2 = SurfaceRef::new("canvas2");
        control.set_extent(&canvas1, SurfaceExtent::new(64, 64));
        control.set_extent(&canvas2, SurfaceExtent::new(64, 64));

        let _w1 = proxy.create_window(canvas1.clone()).unwrap();
        let _w2 = proxy.create_window(canvas2.clone()).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            control.frame_count_for(&canvas1) > 0 && control.frame_count_for(&canvas2) > 0
        }));

        proxy
            .send_event(EventPayload::Custom("ping".to_string()))
            .unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            !control.events_for(&canvas1).is_empty() && !control.events_for(&canvas2).is_empty()
        }));
        assert_eq!(
            control.events_for(&canvas1)[0],
            EventPayload::Custom("ping".to_string())
        );

        proxy.shutdown().unwrap();
        join.join().unwrap().unwrap();
    }
}
