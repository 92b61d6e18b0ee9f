// src/geometry.rs - Zone membership and camera-to-screen mapping
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Position in camera-frame pixel space.
pub type FramePoint = Point2<f64>;

/// Axis-aligned rectangle in camera-frame pixels, top-left to bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Zone {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn top_left(&self) -> FramePoint {
        FramePoint::new(self.left, self.top)
    }

    /// Strict containment: a point lying on any edge is outside.
    pub fn contains(&self, point: &FramePoint) -> bool {
        point.x > self.left && point.x < self.right && point.y > self.top && point.y < self.bottom
    }
}

/// Absolute position on the active display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Display resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Linear map from the pointing zone onto the whole screen.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    domain: Zone,
    clamp: bool,
}

impl CoordinateMapper {
    pub fn new(domain: Zone, clamp: bool) -> Self {
        Self { domain, clamp }
    }

    pub fn domain(&self) -> &Zone {
        &self.domain
    }

    pub fn map(&self, point: &FramePoint, screen: ScreenSize) -> ScreenPoint {
        let mut rel_x = (point.x - self.domain.left) / self.domain.width();
        let mut rel_y = (point.y - self.domain.top) / self.domain.height();

        if self.clamp {
            rel_x = rel_x.clamp(0.0, 1.0);
            rel_y = rel_y.clamp(0.0, 1.0);
        }

        ScreenPoint {
            x: rel_x * screen.width as f64,
            y: rel_y * screen.height as f64,
        }
    }
}
