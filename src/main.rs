// src/main.rs
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use eframe::egui;
use tracing::{debug, info, warn};

use pose_mouse::app::{FatalSlot, PoseMouseApp};
use pose_mouse::config::Config;
use pose_mouse::controller::{ControlContext, PhaseSequencer};
use pose_mouse::pointer::EnigoPointer;
use pose_mouse::pose_model::MoveNetEstimator;
use pose_mouse::runner::{run_until_cancelled, CancelToken, StopRequest};
use pose_mouse::video::{self, CameraSource};

type LiveSequencer = PhaseSequencer<CameraSource, MoveNetEstimator, EnigoPointer>;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Ok(p) = std::env::current_exe() {
        debug!("Running from: {}", p.display());
    }

    video::log_available_cameras();

    let config = Config::load()?;
    info!("Active configuration: {}", serde_json::to_string(&config)?);

    let ctx = build_context(&config)?;
    let sequencer = PhaseSequencer::new(ctx, &config);

    if config.headless {
        run_headless(sequencer)
    } else {
        run_windowed(sequencer)
    }
}

fn build_context(config: &Config) -> Result<ControlContext<CameraSource, MoveNetEstimator, EnigoPointer>> {
    let pointer = EnigoPointer::new().context("Pointer sink unavailable")?;
    let pose = MoveNetEstimator::new(&config.model).context("Pose model unavailable")?;
    let frames = CameraSource::open(&config.camera).context("Camera unavailable")?;
    Ok(ControlContext { frames, pose, pointer })
}

fn run_headless(mut sequencer: LiveSequencer) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start signal runtime")?;
    let cancel = CancelToken::new();

    let watcher = cancel.clone();
    runtime.spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match watcher.request_stop() {
                StopRequest::Graceful => info!("Interrupt received, stopping; press Ctrl-C again to force exit"),
                StopRequest::Forced => {
                    // The loop may be stuck inside a camera or inference call
                    warn!("Second interrupt, exiting immediately");
                    std::process::exit(130);
                }
            }
        }
    });

    // The camera handle is not Send, so the loop stays on this thread
    let summary = run_until_cancelled(&mut sequencer, &cancel, |tick| {
        if !tick.commands.is_empty() {
            debug!("Pointer commands: {:?}", tick.commands);
        }
    })?;
    info!("Headless run finished: {:?}", summary);
    Ok(())
}

fn run_windowed(sequencer: LiveSequencer) -> Result<()> {
    let fatal: FatalSlot = Arc::default();
    let slot = Arc::clone(&fatal);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("OpenPoseMouse")
            .with_inner_size([800.0, 640.0])
            .with_min_inner_size([400.0, 320.0]),
        centered: true,
        ..Default::default()
    };

    eframe::run_native(
        "OpenPoseMouse",
        options,
        Box::new(move |_cc| Box::new(PoseMouseApp::new(sequencer, slot))),
    )
    .map_err(|e| anyhow!("Error running window: {e}"))?;

    let failure = fatal.lock().ok().and_then(|mut slot| slot.take());
    if let Some(message) = failure {
        bail!("Control loop failed: {message}");
    }
    Ok(())
}
