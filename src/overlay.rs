// src/overlay.rs - Shapes drawn over the camera frame
use crate::geometry::{FramePoint, Zone};

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    Zone { zone: Zone, color: [u8; 3] },
    Text { at: FramePoint, text: String, color: [u8; 3] },
}

/// Everything painted on top of a frame, in frame pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    shapes: Vec<OverlayShape>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&mut self, zone: Zone, color: [u8; 3]) -> &mut Self {
        self.shapes.push(OverlayShape::Zone { zone, color });
        self
    }

    /// Zone outline with a black caption at its top-left corner.
    pub fn labelled_zone(&mut self, zone: Zone, label: &str, color: [u8; 3]) -> &mut Self {
        self.zone(zone, color);
        self.text(zone.top_left(), label, BLACK)
    }

    pub fn text(&mut self, at: FramePoint, text: impl Into<String>, color: [u8; 3]) -> &mut Self {
        self.shapes.push(OverlayShape::Text {
            at,
            text: text.into(),
            color,
        });
        self
    }

    pub fn shapes(&self) -> &[OverlayShape] {
        &self.shapes
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().filter_map(|shape| match shape {
            OverlayShape::Text { text, .. } => Some(text.as_str()),
            OverlayShape::Zone { .. } => None,
        })
    }
}
