// src/controller.rs - Calibration, countdown and active pointer control
use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ControlResult;
use crate::gesture::{ButtonAction, GestureDebouncer};
use crate::geometry::{CoordinateMapper, Zone};
use crate::overlay::{Overlay, GREEN, RED, WHITE};
use crate::pointer::{PointerCommand, PointerSink};
use crate::tracking::{draw_crosshair, Detection, KeypointKind, PoseSource};
use crate::video::FrameSource;

/// The collaborators a run needs, built once at startup.
pub struct ControlContext<F, P, S> {
    pub frames: F,
    pub pose: P,
    pub pointer: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    CalibrationWait,
    Countdown,
    ActiveControl,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    CalibrationWait,
    Countdown { started: Instant, announced: Option<u32> },
    ActiveControl,
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::CalibrationWait => PhaseKind::CalibrationWait,
            Phase::Countdown { .. } => PhaseKind::Countdown,
            Phase::ActiveControl => PhaseKind::ActiveControl,
        }
    }
}

/// One processed iteration: what to show and what was sent to the pointer.
pub struct Tick {
    pub phase: PhaseKind,
    pub frame: RgbImage,
    pub overlay: Overlay,
    pub commands: Vec<PointerCommand>,
    pub person_detected: bool,
}

#[derive(Debug, Clone, Copy)]
struct Hands {
    left: KeypointKind,
    right: KeypointKind,
}

pub struct PhaseSequencer<F, P, S> {
    ctx: ControlContext<F, P, S>,
    phase: Phase,
    calibration_left: Zone,
    calibration_right: Zone,
    down_zone: Zone,
    click_zone: Zone,
    hands: Hands,
    mapper: CoordinateMapper,
    gestures: GestureDebouncer,
    countdown_steps: u32,
    countdown_step: Duration,
    release_on_tracking_lost: bool,
    button_held: bool,
    frame_size: (u32, u32),
}

impl<F, P, S> PhaseSequencer<F, P, S>
where
    F: FrameSource,
    P: PoseSource,
    S: PointerSink,
{
    pub fn new(ctx: ControlContext<F, P, S>, config: &Config) -> Self {
        let zones = &config.zones;
        Self {
            ctx,
            phase: Phase::CalibrationWait,
            calibration_left: zones.calibration_left,
            calibration_right: zones.calibration_right,
            down_zone: zones.mouse_down,
            click_zone: zones.mouse_click,
            hands: Hands {
                left: config.left_hand,
                right: config.right_hand,
            },
            mapper: CoordinateMapper::new(zones.pointing, config.clamp_to_screen),
            gestures: GestureDebouncer::new(zones.mouse_down, zones.mouse_click, config.click_cooldown()),
            countdown_steps: config.countdown_steps,
            countdown_step: config.countdown_step(),
            release_on_tracking_lost: config.release_on_tracking_lost,
            button_held: false,
            frame_size: (config.camera.width, config.camera.height),
        }
    }

    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn last_click(&self) -> Option<Instant> {
        self.gestures.last_click()
    }

    pub fn context(&self) -> &ControlContext<F, P, S> {
        &self.ctx
    }

    /// Time left before the countdown hands over to active control.
    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::Countdown { started, .. } => {
                let total = self.countdown_step.checked_mul(self.countdown_steps).unwrap_or(Duration::MAX);
                Some(total.saturating_sub(now.saturating_duration_since(started)))
            }
            _ => None,
        }
    }

    /// Runs one iteration of whichever phase is current.
    pub fn tick(&mut self, now: Instant) -> ControlResult<Tick> {
        match self.phase {
            Phase::CalibrationWait => self.calibration_tick(now),
            Phase::Countdown { started, announced } => {
                let elapsed = now.saturating_duration_since(started);
                let step = (elapsed.as_secs_f64() / self.countdown_step.as_secs_f64()).floor() as u64;
                if step >= self.countdown_steps as u64 {
                    info!("Countdown finished, pointer control is live");
                    self.phase = Phase::ActiveControl;
                    return self.active_tick(now);
                }

                let remaining = self.countdown_steps - step as u32;
                if announced != Some(remaining) {
                    info!("{}...", remaining);
                    self.phase = Phase::Countdown {
                        started,
                        announced: Some(remaining),
                    };
                }
                Ok(self.countdown_frame(remaining))
            }
            Phase::ActiveControl => self.active_tick(now),
        }
    }

    fn calibration_tick(&mut self, now: Instant) -> ControlResult<Tick> {
        let frame = self.ctx.frames.next_frame()?;
        self.frame_size = frame.dimensions();
        let output = self.ctx.pose.infer(&frame)?;

        let mut overlay = Overlay::new();
        overlay
            .labelled_zone(self.calibration_left, "Left Hand", RED)
            .labelled_zone(self.calibration_right, "Right Hand", RED);

        if self.is_calibrated(&output.detection) {
            info!("Person detected, turning mouse on...");
            self.phase = Phase::Countdown {
                started: now,
                announced: None,
            };
        }

        Ok(Tick {
            phase: PhaseKind::CalibrationWait,
            frame: output.annotated,
            overlay,
            commands: Vec::new(),
            person_detected: !output.detection.is_empty(),
        })
    }

    fn is_calibrated(&self, detection: &Detection) -> bool {
        let Some(pose) = detection.primary() else {
            return false;
        };
        match (pose.get(self.hands.left), pose.get(self.hands.right)) {
            (Some(left), Some(right)) => {
                self.calibration_left.contains(&left.position) && self.calibration_right.contains(&right.position)
            }
            _ => false,
        }
    }

    fn countdown_frame(&self, remaining: u32) -> Tick {
        let (width, height) = self.frame_size;
        let mut overlay = Overlay::new();
        overlay.text(self.calibration_left.top_left(), format!("{remaining}..."), WHITE);

        Tick {
            phase: PhaseKind::Countdown,
            frame: RgbImage::new(width, height),
            overlay,
            commands: Vec::new(),
            person_detected: false,
        }
    }

    fn active_tick(&mut self, now: Instant) -> ControlResult<Tick> {
        let frame = self.ctx.frames.next_frame()?;
        self.frame_size = frame.dimensions();
        let output = self.ctx.pose.infer(&frame)?;
        let mut annotated = output.annotated;

        let mut overlay = Overlay::new();
        overlay
            .labelled_zone(self.down_zone, "Mouse Down", RED)
            .labelled_zone(self.click_zone, "Mouse Click", RED)
            .zone(*self.mapper.domain(), GREEN);

        let mut commands = Vec::new();
        let Some(pose) = output.detection.primary() else {
            if self.release_on_tracking_lost && self.button_held {
                warn!("Tracking lost while the button was held, releasing");
                self.ctx.pointer.mouse_up()?;
                self.button_held = false;
                commands.push(PointerCommand::Up);
            }
            return Ok(Tick {
                phase: PhaseKind::ActiveControl,
                frame: annotated,
                overlay,
                commands,
                person_detected: false,
            });
        };

        if let Some(right) = pose.get(self.hands.right) {
            draw_crosshair(&mut annotated, &right.position);
            if self.mapper.domain().contains(&right.position) {
                let screen = self.ctx.pointer.screen_size()?;
                let target = self.mapper.map(&right.position, screen);
                debug!(
                    "Mouse coords: frame ({:.1}, {:.1}) -> screen ({:.1}, {:.1}) on {}x{}",
                    right.position.x, right.position.y, target.x, target.y, screen.width, screen.height
                );
                self.ctx.pointer.move_to(target)?;
                let (x, y) = target.rounded();
                commands.push(PointerCommand::MoveTo(x, y));
            }
        }

        if let Some(left) = pose.get(self.hands.left) {
            draw_crosshair(&mut annotated, &left.position);
            match self.gestures.evaluate(&left.position, now) {
                ButtonAction::Down => {
                    if !self.button_held {
                        info!("MouseDown");
                    }
                    self.ctx.pointer.mouse_down()?;
                    self.button_held = true;
                    commands.push(PointerCommand::Down);
                }
                ButtonAction::Click => {
                    info!("Clicked");
                    self.ctx.pointer.click()?;
                    self.button_held = false;
                    commands.push(PointerCommand::Click);
                }
                ButtonAction::Up => {
                    self.ctx.pointer.mouse_up()?;
                    self.button_held = false;
                    commands.push(PointerCommand::Up);
                }
                ButtonAction::Suppressed => {}
            }
        }

        Ok(Tick {
            phase: PhaseKind::ActiveControl,
            frame: annotated,
            overlay,
            commands,
            person_detected: true,
        })
    }
}
