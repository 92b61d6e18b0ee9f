// src/tracking.rs - Pose keypoints and the pose source seam
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::ControlResult;
use crate::geometry::FramePoint;

/// COCO-17 body landmarks, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

pub const KEYPOINT_COUNT: usize = 17;

impl KeypointKind {
    pub const ALL: [KeypointKind; KEYPOINT_COUNT] = [
        KeypointKind::Nose,
        KeypointKind::LeftEye,
        KeypointKind::RightEye,
        KeypointKind::LeftEar,
        KeypointKind::RightEar,
        KeypointKind::LeftShoulder,
        KeypointKind::RightShoulder,
        KeypointKind::LeftElbow,
        KeypointKind::RightElbow,
        KeypointKind::LeftWrist,
        KeypointKind::RightWrist,
        KeypointKind::LeftHip,
        KeypointKind::RightHip,
        KeypointKind::LeftKnee,
        KeypointKind::RightKnee,
        KeypointKind::LeftAnkle,
        KeypointKind::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub kind: KeypointKind,
    pub position: FramePoint,
    pub confidence: f32,
}

/// One person's keypoints for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn get(&self, kind: KeypointKind) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.kind == kind)
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn mean_confidence(&self) -> f32 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        self.keypoints.iter().map(|kp| kp.confidence).sum::<f32>() / self.keypoints.len() as f32
    }
}

/// Result of one inference call. Callers only ever read the first person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    people: Vec<Pose>,
}

impl Detection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_people(people: Vec<Pose>) -> Self {
        Self { people }
    }

    pub fn primary(&self) -> Option<&Pose> {
        self.people.first()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Inference output: the detection plus a display copy of the input frame.
pub struct PoseOutput {
    pub detection: Detection,
    pub annotated: RgbImage,
}

pub trait PoseSource {
    fn infer(&mut self, frame: &RgbImage) -> ControlResult<PoseOutput>;
}

const MARKER_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
const MARKER_RADIUS: i64 = 3;

/// Paints a small square on every keypoint of `pose`.
pub fn mark_keypoints(image: &mut RgbImage, pose: &Pose) {
    for kp in pose.keypoints() {
        let cx = kp.position.x.round() as i64;
        let cy = kp.position.y.round() as i64;
        for y in (cy - MARKER_RADIUS)..=(cy + MARKER_RADIUS) {
            for x in (cx - MARKER_RADIUS)..=(cx + MARKER_RADIUS) {
                put_pixel_checked(image, x, y, MARKER_COLOR);
            }
        }
    }
}

/// Blacks out the full row and column through `point`.
pub fn draw_crosshair(image: &mut RgbImage, point: &FramePoint) {
    let (width, height) = image.dimensions();
    let px = point.x as i64;
    let py = point.y as i64;

    if (0..height as i64).contains(&py) {
        for x in 0..width {
            image.put_pixel(x, py as u32, Rgb([0, 0, 0]));
        }
    }
    if (0..width as i64).contains(&px) {
        for y in 0..height {
            image.put_pixel(px as u32, y, Rgb([0, 0, 0]));
        }
    }
}

fn put_pixel_checked(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}
