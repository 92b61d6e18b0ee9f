// src/ui.rs - Frame texture and overlay painting
use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};
use image::RgbImage;

use crate::overlay::{Overlay, OverlayShape};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color32,
    pub error: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(20, 20, 25),
            error: Color32::from_rgb(244, 67, 54),
            success: Color32::from_rgb(76, 175, 80),
            warning: Color32::from_rgb(255, 152, 0),
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

/// Camera frame shown at its aspect ratio, with the overlay painted on top.
pub struct VideoWidget {
    texture: Option<egui::TextureHandle>,
    frame_size: Vec2,
}

impl VideoWidget {
    pub fn new() -> Self {
        Self {
            texture: None,
            frame_size: Vec2::new(640.0, 480.0),
        }
    }

    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &RgbImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());
        self.frame_size = Vec2::new(size[0] as f32, size[1] as f32);

        match self.texture.as_mut() {
            Some(texture) => texture.set(color_image, Default::default()),
            None => {
                self.texture = Some(ctx.load_texture("video_frame", color_image, Default::default()));
            }
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, overlay: &Overlay) {
        let available = ui.available_size();
        let scale = (available.x / self.frame_size.x).min(available.y / self.frame_size.y).max(0.1);
        let (rect, _response) = ui.allocate_exact_size(self.frame_size * scale, egui::Sense::hover());
        let painter = ui.painter_at(rect);

        match &self.texture {
            Some(texture) => {
                painter.image(
                    texture.id(),
                    rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
            }
            None => {
                painter.rect_filled(rect, egui::Rounding::same(4.0), Color32::from_rgb(50, 50, 55));
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No Video Signal",
                    egui::FontId::proportional(16.0),
                    Color32::from_rgb(150, 150, 155),
                );
            }
        }

        paint_overlay(&painter, rect, scale, overlay);
    }
}

impl Default for VideoWidget {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_overlay(painter: &egui::Painter, rect: Rect, scale: f32, overlay: &Overlay) {
    let to_screen = |x: f64, y: f64| Pos2::new(rect.left() + x as f32 * scale, rect.top() + y as f32 * scale);

    for shape in overlay.shapes() {
        match shape {
            OverlayShape::Zone { zone, color } => {
                let [r, g, b] = *color;
                painter.rect_stroke(
                    Rect::from_min_max(to_screen(zone.left, zone.top), to_screen(zone.right, zone.bottom)),
                    egui::Rounding::ZERO,
                    Stroke::new(2.0, Color32::from_rgb(r, g, b)),
                );
            }
            OverlayShape::Text { at, text, color } => {
                let [r, g, b] = *color;
                // Anchored at the baseline's left end, like a caption sitting on the zone edge
                painter.text(
                    to_screen(at.x, at.y),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(22.0 * scale),
                    Color32::from_rgb(r, g, b),
                );
            }
        }
    }
}
