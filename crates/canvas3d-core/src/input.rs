//! Pointer input model.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state, sampled per event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// Pointer events in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    DoubleClick {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    /// Wheel motion in notch units, positive away from the user.
    Wheel { delta: f64 },
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u64 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Turns a stream of presses into single and double clicks.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point, MouseButton)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press and report whether it completes a double-click.
    pub fn register_press(&mut self, position: Point, button: MouseButton, now: Instant) -> bool {
        if let Some((time, last_position, last_button)) = self.last_click {
            let elapsed = now.saturating_duration_since(time);
            if last_button == button
                && elapsed < Duration::from_millis(DOUBLE_CLICK_TIME_MS)
                && (position - last_position).hypot() < DOUBLE_CLICK_DISTANCE
            {
                // A third click starts a new sequence.
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, position, button));
        false
    }
}
