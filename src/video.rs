// src/video.rs - Live camera frames, mirrored for the operator
use image::{imageops, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::error::{ControlError, ControlResult};

pub trait FrameSource {
    /// Blocks until the next frame is available. Frames come back mirrored horizontally.
    fn next_frame(&mut self) -> ControlResult<RgbImage>;
}

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(config: &CameraConfig) -> ControlResult<Self> {
        info!("Opening camera index {}", config.index);

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        // Closest match rather than exact; machine-vision cameras rarely offer MJPEG
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(config.index), requested)
            .map_err(|e| ControlError::DeviceUnavailable(format!("camera {}: {e}", config.index)))?;
        camera
            .open_stream()
            .map_err(|e| ControlError::DeviceUnavailable(format!("cannot start stream: {e}")))?;

        let resolution = camera.resolution();
        info!(
            "Camera streaming at {}x{} @ {} fps",
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        );
        if resolution.width() != config.width || resolution.height() != config.height {
            warn!(
                "Camera resolution differs from the configured {}x{}; zones are in frame pixels",
                config.width, config.height
            );
        }

        Ok(Self { camera })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> ControlResult<RgbImage> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| ControlError::DeviceUnavailable(format!("failed to capture frame: {e}")))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| ControlError::DeviceUnavailable(format!("failed to decode frame: {e}")))?;
        Ok(imageops::flip_horizontal(&decoded))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera stream: {}", e);
        } else {
            debug!("Camera stream stopped");
        }
    }
}

/// Logs every camera the native backend can see.
pub fn log_available_cameras() {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => {
            info!("Found {} camera(s)", cameras.len());
            for (i, camera) in cameras.iter().enumerate() {
                info!("  [{}] {}", i, camera.human_name());
            }
        }
        Err(e) => warn!("Failed to query cameras: {}", e),
    }
}
