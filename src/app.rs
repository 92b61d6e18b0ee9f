// src/app.rs
use std::sync::{Arc, Mutex};
use std::time::Instant;

use eframe::egui;
use tracing::error;

use crate::controller::{PhaseKind, PhaseSequencer};
use crate::overlay::Overlay;
use crate::pointer::{PointerCommand, PointerSink};
use crate::tracking::PoseSource;
use crate::ui::{Theme, VideoWidget};
use crate::video::FrameSource;

/// Slot the window writes a fatal error into so `main` can exit non-zero.
pub type FatalSlot = Arc<Mutex<Option<String>>>;

pub struct PoseMouseApp<F, P, S> {
    sequencer: PhaseSequencer<F, P, S>,
    video: VideoWidget,
    overlay: Overlay,
    theme: Theme,
    phase: PhaseKind,
    person_detected: bool,
    last_commands: Vec<PointerCommand>,
    fatal: Option<String>,
    fatal_slot: FatalSlot,
}

impl<F, P, S> PoseMouseApp<F, P, S>
where
    F: FrameSource,
    P: PoseSource,
    S: PointerSink,
{
    pub fn new(sequencer: PhaseSequencer<F, P, S>, fatal_slot: FatalSlot) -> Self {
        let phase = sequencer.phase();
        Self {
            sequencer,
            video: VideoWidget::new(),
            overlay: Overlay::new(),
            theme: Theme::default(),
            phase,
            person_detected: false,
            last_commands: Vec::new(),
            fatal: None,
            fatal_slot,
        }
    }

    fn step(&mut self, ctx: &egui::Context) {
        if self.fatal.is_some() {
            return;
        }

        match self.sequencer.tick(Instant::now()) {
            Ok(tick) => {
                self.video.update_frame(ctx, &tick.frame);
                self.overlay = tick.overlay;
                self.phase = tick.phase;
                self.person_detected = tick.person_detected;
                self.last_commands = tick.commands;
            }
            Err(e) => {
                error!("Control loop stopped: {}", e);
                let message = e.to_string();
                if let Ok(mut slot) = self.fatal_slot.lock() {
                    *slot = Some(message.clone());
                }
                self.fatal = Some(message);
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn render_status(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let phase = match self.phase {
                    PhaseKind::CalibrationWait => "Calibration: place both hands in the boxes",
                    PhaseKind::Countdown => "Get ready",
                    PhaseKind::ActiveControl => "Mouse control active",
                };
                ui.heading(phase);
                ui.separator();

                if let Some(fatal) = &self.fatal {
                    ui.colored_label(self.theme.error, fatal);
                } else if self.phase != PhaseKind::Countdown {
                    let (color, text) = if self.person_detected {
                        (self.theme.success, "Person tracked")
                    } else {
                        (self.theme.warning, "No person")
                    };
                    ui.colored_label(color, text);
                }

                if !self.last_commands.is_empty() {
                    ui.separator();
                    ui.colored_label(self.theme.text_secondary, format!("{:?}", self.last_commands));
                }
            });
        });
    }
}

impl<F, P, S> eframe::App for PoseMouseApp<F, P, S>
where
    F: FrameSource,
    P: PoseSource,
    S: PointerSink,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.step(ctx);
        self.render_status(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.background))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| self.video.show(ui, &self.overlay));
            });

        // Keep ticking: every repaint processes exactly one camera frame
        ctx.request_repaint();
    }
}
