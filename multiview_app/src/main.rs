//! Multi-view demo shell
//!
//! Reproduces the embedding flow the engine is built for: construct the
//! session, take a proxy, surrender the main thread to `run()`, and drive
//! every window operation from a separate control thread. Two named canvas
//! surfaces stand in for independently mounted views; the control thread
//! ramps a "red" property on one of them, resizes the other, then tears
//! both down and stops the session.

use log::{error, info};
use std::thread;
use std::time::Duration;
use surface_engine::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    surface_engine::logging::init();

    // Optional session config file: `multiview_demo session.toml` (or .ron).
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load_from_file(path)?,
        None => SessionConfig::default(),
    };

    let (backend, control) = HeadlessBackend::new();
    // The platform side: both canvases are laid out and ready.
    control.set_extent(&SurfaceRef::new("canvas1"), SurfaceExtent::new(1280, 720));
    control.set_extent(&SurfaceRef::new("canvas2"), SurfaceExtent::new(640, 480));

    let session = Session::new(config, Box::new(backend));
    // The proxy must exist before run(): nothing after run() executes
    // until the session terminates.
    let proxy = session.proxy();

    thread::spawn(move || {
        if let Err(err) = drive(&proxy, &control) {
            error!("control thread failed: {err}");
            let _ = proxy.shutdown();
        }
    });

    session.run()?;
    Ok(())
}

/// Everything a host would do with a live session, end to end
fn drive(proxy: &SessionProxy, control: &HeadlessControl) -> Result<(), SessionError> {
    let canvas1 = SurfaceRef::new("canvas1");
    let canvas2 = SurfaceRef::new("canvas2");

    let w1 = proxy.create_window(canvas1.clone())?;
    let w2 = proxy.create_window(canvas2.clone())?;
    info!("windows created: {w1:?} on {canvas1}, {w2:?} on {canvas2}");

    // Ramp the red channel on the first view, like a host-side slider.
    for red in (0..=255).step_by(51) {
        proxy.update_property(PropertyTarget::Window(w1), "red", PropertyValue::Int(red))?;
        thread::sleep(Duration::from_millis(100));
    }

    // The second view gets resized mid-session; its binding reconfigures
    // in place.
    control.set_extent(&canvas2, SurfaceExtent::new(800, 600));
    proxy.send_event(EventPayload::PointerMoved { x: 10.0, y: 20.0 })?;
    thread::sleep(Duration::from_millis(200));

    info!(
        "rendered {} frames on {canvas1}, {} on {canvas2}",
        control.frame_count_for(&canvas1),
        control.frame_count_for(&canvas2)
    );

    proxy.delete_window(w1)?;
    proxy.delete_window(w2)?;
    thread::sleep(Duration::from_millis(100));
    proxy.shutdown()
}
