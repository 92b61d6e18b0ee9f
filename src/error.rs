// src/error.rs
use thiserror::Error;

/// Failures that end a control run. An empty detection is not one of them.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("pose inference failed: {0}")]
    Inference(String),

    #[error("pointer command rejected: {0}")]
    PointerSink(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type ControlResult<T> = std::result::Result<T, ControlError>;
