// src/runner.rs - Blocking control loop with cooperative cancellation
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use crate::controller::{PhaseKind, PhaseSequencer, Tick};
use crate::error::ControlResult;
use crate::pointer::PointerSink;
use crate::tracking::PoseSource;
use crate::video::FrameSource;

const COUNTDOWN_POLL: Duration = Duration::from_millis(50);

/// What a stop request amounts to, given whether one was already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    Graceful,
    Forced,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancels the token. A repeat request while the first is still pending is `Forced`.
    pub fn request_stop(&self) -> StopRequest {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            StopRequest::Forced
        } else {
            StopRequest::Graceful
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub commands: u64,
}

/// Ticks the sequencer until `cancel` fires or a collaborator fails.
///
/// Countdown ticks do not touch the camera, so the loop naps between them
/// instead of spinning.
pub fn run_until_cancelled<F, P, S>(
    sequencer: &mut PhaseSequencer<F, P, S>,
    cancel: &CancelToken,
    mut on_tick: impl FnMut(&Tick),
) -> ControlResult<RunSummary>
where
    F: FrameSource,
    P: PoseSource,
    S: PointerSink,
{
    let mut summary = RunSummary::default();

    while !cancel.is_cancelled() {
        let tick = sequencer.tick(Instant::now())?;
        summary.ticks += 1;
        summary.commands += tick.commands.len() as u64;
        on_tick(&tick);

        if tick.phase == PhaseKind::Countdown {
            let nap = sequencer
                .countdown_remaining(Instant::now())
                .map_or(COUNTDOWN_POLL, |left| left.min(COUNTDOWN_POLL));
            std::thread::sleep(nap);
        }
    }

    info!(
        "Control loop cancelled after {} ticks and {} pointer commands",
        summary.ticks, summary.commands
    );
    Ok(summary)
}
