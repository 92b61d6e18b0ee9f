// src/pose_model.rs - MoveNet single-pose inference through ONNX Runtime
use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::config::ModelConfig;
use crate::error::{ControlError, ControlResult};
use crate::geometry::FramePoint;
use crate::tracking::{mark_keypoints, Detection, Keypoint, KeypointKind, Pose, PoseOutput, PoseSource, KEYPOINT_COUNT};

const INPUT_SIZE: u32 = 192;

pub struct MoveNetEstimator {
    session: Session,
    input_name: String,
    output_name: String,
    min_pose_confidence: f32,
}

impl MoveNetEstimator {
    pub fn new(config: &ModelConfig) -> ControlResult<Self> {
        Self::load(&config.path, config)
            .map_err(|e| ControlError::Inference(format!("{e:#}")))
    }

    fn load(path: &Path, config: &ModelConfig) -> Result<Self> {
        info!("Loading pose model from {}", path.display());
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX model {}", path.display()))?;

        Ok(Self {
            session,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            min_pose_confidence: config.min_pose_confidence,
        })
    }

    fn run(&mut self, frame: &RgbImage) -> Result<Pose> {
        let input_tensor = Tensor::from_array(preprocess(frame))?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .context("Inference failed")?;
        let output: ndarray::ArrayViewD<f32> = outputs[self.output_name.as_str()]
            .try_extract_array()
            .context("Failed to extract output")?;

        let (width, height) = (frame.width() as f64, frame.height() as f64);
        let mut keypoints = Vec::with_capacity(KEYPOINT_COUNT);
        for kind in KeypointKind::ALL {
            let i = kind.index();
            // MoveNet emits normalised (y, x, score) triples
            let y = output[[0, 0, i, 0]] as f64;
            let x = output[[0, 0, i, 1]] as f64;
            let confidence = output[[0, 0, i, 2]];
            keypoints.push(Keypoint {
                kind,
                position: FramePoint::new(x * width, y * height),
                confidence,
            });
        }
        Ok(Pose::new(keypoints))
    }
}

impl PoseSource for MoveNetEstimator {
    fn infer(&mut self, frame: &RgbImage) -> ControlResult<PoseOutput> {
        let pose = self
            .run(frame)
            .map_err(|e| ControlError::Inference(format!("{e:#}")))?;

        let mut annotated = frame.clone();
        // The single-pose head always answers; a low average score means nobody is there
        let detection = if pose.mean_confidence() >= self.min_pose_confidence {
            mark_keypoints(&mut annotated, &pose);
            Detection::from_people(vec![pose])
        } else {
            Detection::empty()
        };

        Ok(PoseOutput { detection, annotated })
    }
}

/// NHWC float tensor of raw 0-255 RGB values at the model's input size.
fn preprocess(frame: &RgbImage) -> Array4<f32> {
    let resized = imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let side = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32;
        }
    }
    tensor
}
