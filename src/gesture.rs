// src/gesture.rs - Left-hand button zones with click cooldown
use std::time::{Duration, Instant};

use crate::geometry::{FramePoint, Zone};

/// What the left hand asks of the mouse button this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Down,
    Click,
    Up,
    /// In the click zone but still cooling down: send nothing.
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct GestureDebouncer {
    down_zone: Zone,
    click_zone: Zone,
    cooldown: Duration,
    last_click: Option<Instant>,
}

impl GestureDebouncer {
    pub fn new(down_zone: Zone, click_zone: Zone, cooldown: Duration) -> Self {
        Self {
            down_zone,
            click_zone,
            cooldown,
            last_click: None,
        }
    }

    pub fn last_click(&self) -> Option<Instant> {
        self.last_click
    }

    /// Mouse-down zone wins over the click zone when both contain the point.
    pub fn evaluate(&mut self, hand: &FramePoint, now: Instant) -> ButtonAction {
        if self.down_zone.contains(hand) {
            return ButtonAction::Down;
        }

        if self.click_zone.contains(hand) {
            let ready = match self.last_click {
                None => true,
                Some(last) => now.saturating_duration_since(last) >= self.cooldown,
            };
            if ready {
                self.last_click = Some(now);
                return ButtonAction::Click;
            }
            return ButtonAction::Suppressed;
        }

        ButtonAction::Up
    }
}
