// src/pointer.rs - Pointer sink seam and the enigo backend
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use tracing::info;

use crate::error::{ControlError, ControlResult};
use crate::geometry::{ScreenPoint, ScreenSize};

/// Commands sent to a sink during one tick, kept for the status line and logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerCommand {
    MoveTo(i32, i32),
    Down,
    Up,
    Click,
}

pub trait PointerSink {
    fn move_to(&mut self, point: ScreenPoint) -> ControlResult<()>;
    fn mouse_down(&mut self) -> ControlResult<()>;
    fn mouse_up(&mut self) -> ControlResult<()>;
    fn click(&mut self) -> ControlResult<()>;
    fn screen_size(&self) -> ControlResult<ScreenSize>;
}

/// System pointer driven through enigo. It has no corner-abort failsafe to turn off.
pub struct EnigoPointer {
    enigo: Enigo,
}

impl EnigoPointer {
    pub fn new() -> ControlResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ControlError::PointerSink(format!("cannot connect to input system: {e}")))?;
        info!("Pointer sink connected");
        Ok(Self { enigo })
    }

    fn left_button(&mut self, direction: Direction) -> ControlResult<()> {
        self.enigo
            .button(Button::Left, direction)
            .map_err(|e| ControlError::PointerSink(format!("{direction:?} rejected: {e}")))
    }
}

impl PointerSink for EnigoPointer {
    fn move_to(&mut self, point: ScreenPoint) -> ControlResult<()> {
        let (x, y) = point.rounded();
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| ControlError::PointerSink(format!("move to ({x}, {y}) rejected: {e}")))
    }

    fn mouse_down(&mut self) -> ControlResult<()> {
        self.left_button(Direction::Press)
    }

    fn mouse_up(&mut self) -> ControlResult<()> {
        self.left_button(Direction::Release)
    }

    fn click(&mut self) -> ControlResult<()> {
        self.left_button(Direction::Click)
    }

    fn screen_size(&self) -> ControlResult<ScreenSize> {
        let (width, height) = self
            .enigo
            .main_display()
            .map_err(|e| ControlError::PointerSink(format!("display size unavailable: {e}")))?;
        Ok(ScreenSize {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        })
    }
}
