use std::collections::VecDeque;
use std::time::{Duration, Instant};

use image::RgbImage;

use pose_mouse::config::Config;
use pose_mouse::controller::{ControlContext, PhaseKind, PhaseSequencer};
use pose_mouse::error::{ControlError, ControlResult};
use pose_mouse::geometry::{FramePoint, ScreenPoint, ScreenSize};
use pose_mouse::pointer::{PointerCommand, PointerSink};
use pose_mouse::runner::{run_until_cancelled, CancelToken};
use pose_mouse::tracking::{Detection, Keypoint, KeypointKind, Pose, PoseOutput, PoseSource};
use pose_mouse::video::FrameSource;

struct BlankFrames {
    served: usize,
}

impl FrameSource for BlankFrames {
    fn next_frame(&mut self) -> ControlResult<RgbImage> {
        self.served += 1;
        Ok(RgbImage::new(640, 480))
    }
}

/// Replays detections in order, then reports nobody.
struct ScriptedPose {
    script: VecDeque<ControlResult<Detection>>,
}

impl PoseSource for ScriptedPose {
    fn infer(&mut self, frame: &RgbImage) -> ControlResult<PoseOutput> {
        let detection = self.script.pop_front().unwrap_or_else(|| Ok(Detection::empty()))?;
        Ok(PoseOutput {
            detection,
            annotated: frame.clone(),
        })
    }
}

#[derive(Default)]
struct RecordingPointer {
    commands: Vec<PointerCommand>,
}

impl PointerSink for RecordingPointer {
    fn move_to(&mut self, point: ScreenPoint) -> ControlResult<()> {
        let (x, y) = point.rounded();
        self.commands.push(PointerCommand::MoveTo(x, y));
        Ok(())
    }

    fn mouse_down(&mut self) -> ControlResult<()> {
        self.commands.push(PointerCommand::Down);
        Ok(())
    }

    fn mouse_up(&mut self) -> ControlResult<()> {
        self.commands.push(PointerCommand::Up);
        Ok(())
    }

    fn click(&mut self) -> ControlResult<()> {
        self.commands.push(PointerCommand::Click);
        Ok(())
    }

    fn screen_size(&self) -> ControlResult<ScreenSize> {
        Ok(ScreenSize { width: 1920, height: 1080 })
    }
}

type TestSequencer = PhaseSequencer<BlankFrames, ScriptedPose, RecordingPointer>;

const BOTH_CALIBRATED: ((f64, f64), (f64, f64)) = ((100.0, 100.0), (590.0, 100.0));
const POINTING_CENTER: (f64, f64) = (320.0, 240.0);
const IDLE_LEFT: (f64, f64) = (400.0, 300.0);
const CLICK_LEFT: (f64, f64) = (100.0, 300.0);
const DOWN_LEFT: (f64, f64) = (100.0, 100.0);

/// A person whose operator-left and operator-right hands sit at the given points.
fn person(config: &Config, left: (f64, f64), right: (f64, f64)) -> Detection {
    let keypoint = |kind, (x, y): (f64, f64)| Keypoint {
        kind,
        position: FramePoint::new(x, y),
        confidence: 0.9,
    };
    Detection::from_people(vec![Pose::new(vec![
        keypoint(config.left_hand, left),
        keypoint(config.right_hand, right),
        keypoint(KeypointKind::Nose, (320.0, 60.0)),
    ])])
}

fn sequencer(config: &Config, script: Vec<ControlResult<Detection>>) -> TestSequencer {
    let ctx = ControlContext {
        frames: BlankFrames { served: 0 },
        pose: ScriptedPose { script: script.into() },
        pointer: RecordingPointer::default(),
    };
    PhaseSequencer::new(ctx, config)
}

fn instant_start() -> Config {
    Config {
        countdown_steps: 0,
        ..Config::default()
    }
}

/// Calibration script prefix followed by the given active-control detections.
fn active_script(config: &Config, active: Vec<Detection>) -> Vec<ControlResult<Detection>> {
    let (left, right) = BOTH_CALIBRATED;
    std::iter::once(person(config, left, right)).chain(active).map(Ok).collect()
}

fn commands(sequencer: &TestSequencer) -> &[PointerCommand] {
    &sequencer.context().pointer.commands
}

#[test]
fn calibration_needs_both_hands_on_the_same_frame() {
    let config = Config::default();
    let script = vec![
        Ok(person(&config, (100.0, 100.0), (300.0, 300.0))),
        Ok(person(&config, (300.0, 300.0), (590.0, 100.0))),
        Ok(Detection::empty()),
        Ok(person(&config, (100.0, 100.0), (590.0, 100.0))),
    ];
    let mut seq = sequencer(&config, script);
    let t0 = Instant::now();

    for i in 0..3 {
        let tick = seq.tick(t0 + Duration::from_millis(i * 33)).unwrap();
        assert_eq!(tick.phase, PhaseKind::CalibrationWait);
        assert_eq!(seq.phase(), PhaseKind::CalibrationWait);
        let labels: Vec<_> = tick.overlay.labels().collect();
        assert_eq!(labels, vec!["Left Hand", "Right Hand"]);
    }

    seq.tick(t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(seq.phase(), PhaseKind::Countdown);
    assert!(commands(&seq).is_empty());
}

#[test]
fn calibration_zone_edges_do_not_count() {
    let config = Config::default();
    let script = vec![Ok(person(&config, (50.0, 50.0), (590.0, 100.0)))];
    let mut seq = sequencer(&config, script);
    seq.tick(Instant::now()).unwrap();
    assert_eq!(seq.phase(), PhaseKind::CalibrationWait);
}

#[test]
fn countdown_steps_down_without_reading_frames() {
    let config = Config::default();
    let mut seq = sequencer(&config, active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]));
    let t0 = Instant::now();

    seq.tick(t0).unwrap();
    assert_eq!(seq.context().frames.served, 1);

    let first = seq.tick(t0 + Duration::from_millis(500)).unwrap();
    assert_eq!(first.phase, PhaseKind::Countdown);
    assert_eq!(first.overlay.labels().collect::<Vec<_>>(), vec!["5..."]);
    assert_eq!(first.frame.dimensions(), (640, 480));

    let last = seq.tick(t0 + Duration::from_millis(4500)).unwrap();
    assert_eq!(last.overlay.labels().collect::<Vec<_>>(), vec!["1..."]);
    assert_eq!(seq.context().frames.served, 1);
    assert!(commands(&seq).is_empty());

    let live = seq.tick(t0 + Duration::from_secs(5)).unwrap();
    assert_eq!(live.phase, PhaseKind::ActiveControl);
    assert_eq!(seq.context().frames.served, 2);
    assert_eq!(live.commands, vec![PointerCommand::MoveTo(960, 540), PointerCommand::Up]);
}

#[test]
fn right_hand_moves_pointer_and_left_hand_releases() {
    let config = instant_start();
    let mut seq = sequencer(&config, active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]));
    let t0 = Instant::now();
    seq.tick(t0).unwrap();

    let tick = seq.tick(t0 + Duration::from_millis(33)).unwrap();
    assert_eq!(tick.phase, PhaseKind::ActiveControl);
    assert_eq!(commands(&seq), &[PointerCommand::MoveTo(960, 540), PointerCommand::Up]);
    assert_eq!(
        tick.overlay.labels().collect::<Vec<_>>(),
        vec!["Mouse Down", "Mouse Click"]
    );
}

#[test]
fn gestures_apply_even_when_right_hand_leaves_pointing_zone() {
    let config = instant_start();
    let mut seq = sequencer(&config, active_script(&config, vec![person(&config, DOWN_LEFT, (620.0, 460.0))]));
    let t0 = Instant::now();
    seq.tick(t0).unwrap();
    seq.tick(t0 + Duration::from_millis(33)).unwrap();

    assert_eq!(commands(&seq), &[PointerCommand::Down]);
}

#[test]
fn clicks_respect_cooldown_end_to_end() {
    let config = instant_start();
    let clicking = person(&config, CLICK_LEFT, POINTING_CENTER);
    let mut seq = sequencer(&config, active_script(&config, vec![clicking.clone(), clicking.clone(), clicking]));
    let t0 = Instant::now();
    seq.tick(t0).unwrap();

    let t1 = t0 + Duration::from_secs(1);
    let first = seq.tick(t1).unwrap();
    assert!(first.commands.contains(&PointerCommand::Click));
    assert_eq!(seq.last_click(), Some(t1));

    let early = seq.tick(t1 + Duration::from_millis(1900)).unwrap();
    assert_eq!(early.commands, vec![PointerCommand::MoveTo(960, 540)]);
    assert_eq!(seq.last_click(), Some(t1));

    let late = t1 + Duration::from_millis(2100);
    let second = seq.tick(late).unwrap();
    assert!(second.commands.contains(&PointerCommand::Click));
    assert_eq!(seq.last_click(), Some(late));
}

#[test]
fn empty_detection_sends_nothing_and_keeps_cooldown() {
    let config = instant_start();
    let mut seq = sequencer(
        &config,
        active_script(&config, vec![person(&config, CLICK_LEFT, POINTING_CENTER), Detection::empty()]),
    );
    let t0 = Instant::now();
    seq.tick(t0).unwrap();
    seq.tick(t0 + Duration::from_millis(33)).unwrap();
    let sent = commands(&seq).len();
    let cooldown = seq.last_click();

    let tick = seq.tick(t0 + Duration::from_millis(66)).unwrap();
    assert!(!tick.person_detected);
    assert!(tick.commands.is_empty());
    assert_eq!(commands(&seq).len(), sent);
    assert_eq!(seq.last_click(), cooldown);
}

#[test]
fn held_button_survives_tracking_loss_by_default() {
    let config = instant_start();
    let mut seq = sequencer(
        &config,
        active_script(&config, vec![person(&config, DOWN_LEFT, POINTING_CENTER), Detection::empty()]),
    );
    let t0 = Instant::now();
    seq.tick(t0).unwrap();
    seq.tick(t0 + Duration::from_millis(33)).unwrap();
    seq.tick(t0 + Duration::from_millis(66)).unwrap();

    assert_eq!(commands(&seq).last(), Some(&PointerCommand::Down));
}

#[test]
fn tracking_loss_can_release_the_button_once() {
    let config = Config {
        release_on_tracking_lost: true,
        ..instant_start()
    };
    let mut seq = sequencer(
        &config,
        active_script(
            &config,
            vec![person(&config, DOWN_LEFT, POINTING_CENTER), Detection::empty(), Detection::empty()],
        ),
    );
    let t0 = Instant::now();
    seq.tick(t0).unwrap();
    seq.tick(t0 + Duration::from_millis(33)).unwrap();

    let lost = seq.tick(t0 + Duration::from_millis(66)).unwrap();
    assert_eq!(lost.commands, vec![PointerCommand::Up]);

    let still_lost = seq.tick(t0 + Duration::from_millis(99)).unwrap();
    assert!(still_lost.commands.is_empty());
}

#[test]
fn inference_failure_is_fatal() {
    let config = Config::default();
    let script = vec![Err(ControlError::Inference("model crashed".to_string()))];
    let mut seq = sequencer(&config, script);

    let err = seq.tick(Instant::now()).err().expect("tick should fail");
    assert!(matches!(err, ControlError::Inference(_)));
}

#[test]
fn runner_stops_when_cancelled() {
    let config = instant_start();
    let mut seq = sequencer(&config, active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]));
    let cancel = CancelToken::new();

    let mut phases = Vec::new();
    let summary = run_until_cancelled(&mut seq, &cancel, |tick| {
        phases.push(tick.phase);
        if phases.len() == 3 {
            cancel.cancel();
        }
    })
    .unwrap();

    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.commands, 2);
    assert_eq!(
        phases,
        vec![PhaseKind::CalibrationWait, PhaseKind::ActiveControl, PhaseKind::ActiveControl]
    );
}

#[test]
fn runner_returns_collaborator_errors() {
    let config = Config::default();
    let mut seq = sequencer(&config, vec![Err(ControlError::Inference("boom".to_string()))]);
    let cancel = CancelToken::new();

    let result = run_until_cancelled(&mut seq, &cancel, |_| {});
    assert!(matches!(result, Err(ControlError::Inference(_))));
}

/// Serves a fixed number of frames, then reports the camera as gone.
struct DyingCamera {
    frames_left: usize,
}

impl FrameSource for DyingCamera {
    fn next_frame(&mut self) -> ControlResult<RgbImage> {
        if self.frames_left == 0 {
            return Err(ControlError::DeviceUnavailable("camera unplugged".to_string()));
        }
        self.frames_left -= 1;
        Ok(RgbImage::new(640, 480))
    }
}

/// Accepts button commands but refuses every move.
struct RefusingPointer;

impl PointerSink for RefusingPointer {
    fn move_to(&mut self, _point: ScreenPoint) -> ControlResult<()> {
        Err(ControlError::PointerSink("move rejected".to_string()))
    }

    fn mouse_down(&mut self) -> ControlResult<()> {
        Ok(())
    }

    fn mouse_up(&mut self) -> ControlResult<()> {
        Ok(())
    }

    fn click(&mut self) -> ControlResult<()> {
        Ok(())
    }

    fn screen_size(&self) -> ControlResult<ScreenSize> {
        Ok(ScreenSize { width: 1920, height: 1080 })
    }
}

fn with_context<F: FrameSource, S: PointerSink>(
    config: &Config,
    frames: F,
    pointer: S,
    script: Vec<ControlResult<Detection>>,
) -> PhaseSequencer<F, ScriptedPose, S> {
    let ctx = ControlContext {
        frames,
        pose: ScriptedPose { script: script.into() },
        pointer,
    };
    PhaseSequencer::new(ctx, config)
}

#[test]
fn pointer_failure_is_fatal() {
    let config = instant_start();
    let script = active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]);
    let mut seq = with_context(&config, BlankFrames { served: 0 }, RefusingPointer, script);
    let t0 = Instant::now();
    seq.tick(t0).unwrap();

    let err = seq.tick(t0 + Duration::from_millis(33)).err().expect("move should fail");
    assert!(matches!(err, ControlError::PointerSink(_)));
    assert_eq!(seq.phase(), PhaseKind::ActiveControl);
}

#[test]
fn runner_returns_pointer_failures() {
    let config = instant_start();
    let script = active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]);
    let mut seq = with_context(&config, BlankFrames { served: 0 }, RefusingPointer, script);
    let cancel = CancelToken::new();

    let mut ticks = 0;
    let result = run_until_cancelled(&mut seq, &cancel, |_| ticks += 1);
    assert!(matches!(result, Err(ControlError::PointerSink(_))));
    assert_eq!(ticks, 1);
}

#[test]
fn missing_camera_is_fatal_during_calibration() {
    let config = Config::default();
    let mut seq = with_context(&config, DyingCamera { frames_left: 0 }, RecordingPointer::default(), Vec::new());

    let err = seq.tick(Instant::now()).err().expect("frame read should fail");
    assert!(matches!(err, ControlError::DeviceUnavailable(_)));
    assert_eq!(seq.phase(), PhaseKind::CalibrationWait);
}

#[test]
fn runner_returns_camera_loss_during_active_control() {
    let config = instant_start();
    let script = active_script(&config, vec![person(&config, IDLE_LEFT, POINTING_CENTER)]);
    let mut seq = with_context(&config, DyingCamera { frames_left: 2 }, RecordingPointer::default(), script);
    let cancel = CancelToken::new();

    let mut phases = Vec::new();
    let result = run_until_cancelled(&mut seq, &cancel, |tick| phases.push(tick.phase));
    assert!(matches!(result, Err(ControlError::DeviceUnavailable(_))));
    assert_eq!(phases, vec![PhaseKind::CalibrationWait, PhaseKind::ActiveControl]);
    assert_eq!(
        seq.context().pointer.commands,
        vec![PointerCommand::MoveTo(960, 540), PointerCommand::Up]
    );
}

#[test]
fn oversized_countdown_does_not_panic() {
    let config = Config {
        countdown_steps: u32::MAX,
        countdown_step_secs: 1e15,
        ..Config::default()
    };
    let mut seq = sequencer(&config, active_script(&config, Vec::new()));
    let t0 = Instant::now();
    seq.tick(t0).unwrap();

    assert_eq!(seq.countdown_remaining(t0), Some(Duration::MAX));
    let tick = seq.tick(t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(tick.phase, PhaseKind::Countdown);
}
