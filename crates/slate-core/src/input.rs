//! Input state management for mouse/touch/keyboard events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
    /// Pointer capture was lost; the active gesture must be discarded.
    Cancel,
}

/// Keyboard event type. Keys use DOM-style names ("a", "Delete", "ArrowLeft").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Maximum pointer travel between the two presses of a double-click.
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks the current input state across events.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    /// Currently pressed mouse buttons.
    pressed_buttons: HashSet<MouseButton>,
    /// Current modifier keys state.
    pub modifiers: Modifiers,
    /// Currently pressed keys.
    pressed_keys: HashSet<String>,
    /// Start position of the current press, in screen coordinates.
    pub drag_start: Option<Point>,
    double_click_window: Duration,
    /// Last click time for double-click detection.
    last_click_time: Option<Instant>,
    /// Last click position for double-click detection.
    last_click_position: Option<Point>,
    /// Whether the latest press completed a double-click.
    double_click_detected: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

impl InputState {
    /// Create a new input state with the given double-click window.
    pub fn new(double_click_window: Duration) -> Self {
        Self {
            pointer_position: Point::ZERO,
            previous_pointer_position: Point::ZERO,
            pressed_buttons: HashSet::new(),
            modifiers: Modifiers::default(),
            pressed_keys: HashSet::new(),
            drag_start: None,
            double_click_window,
            last_click_time: None,
            last_click_position: None,
            double_click_detected: false,
        }
    }

    /// Process a pointer event observed at `now`.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent, now: Instant) {
        self.previous_pointer_position = self.pointer_position;
        match *event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.insert(button);
                self.double_click_detected = false;

                if button == MouseButton::Left {
                    self.register_click(position, now);
                }
                if self.drag_start.is_none() {
                    self.drag_start = Some(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.remove(&button);
                if self.pressed_buttons.is_empty() {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } | PointerEvent::Scroll { position, .. } => {
                self.pointer_position = position;
            }
            PointerEvent::Cancel => {
                self.pressed_buttons.clear();
                self.drag_start = None;
            }
        }
    }

    fn register_click(&mut self, position: Point, now: Instant) {
        let is_double = match (self.last_click_time, self.last_click_position) {
            (Some(last_time), Some(last_pos)) => {
                now.saturating_duration_since(last_time) <= self.double_click_window
                    && position.distance(last_pos) < DOUBLE_CLICK_DISTANCE
            }
            _ => false,
        };
        if is_double {
            self.double_click_detected = true;
            // Reset to prevent triple-click being detected as another double-click
            self.last_click_time = None;
            self.last_click_position = None;
        } else {
            self.last_click_time = Some(now);
            self.last_click_position = Some(position);
        }
    }

    /// Forget the pending first click.
    pub fn reset_click_tracking(&mut self) {
        self.last_click_time = None;
        self.last_click_position = None;
        self.double_click_detected = false;
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                self.pressed_keys.insert(key.clone());
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(key);
            }
        }
    }

    /// Update modifier keys state.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn shift(&self) -> bool {
        self.modifiers.shift
    }

    /// Check if a button is currently pressed.
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Check if a key is currently pressed.
    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Whether the latest press completed a double-click.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Get the pointer movement delta since the previous event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Get the drag delta from start position, if a button is held.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }
}
