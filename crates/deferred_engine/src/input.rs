//! Input events and state tracking
//!
//! The windowing layer translates its native events into [`InputEvent`]s
//! and feeds them to the engine, which forwards them to the active screen
//! and folds them into [`InputState`].

use std::collections::HashSet;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum KeyCode {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Space, Enter, Escape, Tab, Backspace,
    Left, Right, Up, Down,
    LeftShift, LeftControl,
    F1, F2, F3, F4,
    /// Any key without a mapping
    Unknown,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Window and device events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Framebuffer was resized
    Resized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// Window close requested
    CloseRequested,
    /// Key was pressed or released
    Key {
        /// The key
        key: KeyCode,
        /// Pressed (true) or released (false)
        pressed: bool,
    },
    /// Mouse button was pressed or released
    MouseButton {
        /// The button
        button: MouseButton,
        /// Pressed (true) or released (false)
        pressed: bool,
    },
    /// Cursor moved
    MouseMoved {
        /// X in window pixels
        x: f64,
        /// Y in window pixels
        y: f64,
    },
    /// Mouse wheel scrolled
    Scroll {
        /// Vertical scroll amount
        delta: f32,
    },
}

/// Currently held keys and buttons plus cursor position
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: (f64, f64),
    scroll: f32,
}

impl InputState {
    /// Nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { key, pressed: true } => {
                if self.keys_down.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            InputEvent::Key { key, pressed: false } => {
                self.keys_down.remove(&key);
            }
            InputEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.buttons_down.insert(button);
                } else {
                    self.buttons_down.remove(&button);
                }
            }
            InputEvent::MouseMoved { x, y } => self.mouse_position = (x, y),
            InputEvent::Scroll { delta } => self.scroll += delta,
            InputEvent::Resized { .. } | InputEvent::CloseRequested => {}
        }
    }

    /// Key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Key went down since the last [`InputState::end_frame`]
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Mouse button is held
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Last cursor position
    pub fn mouse_position(&self) -> (f64, f64) {
        self.mouse_position
    }

    /// Scroll accumulated this frame
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Reset per-frame edges
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.scroll = 0.0;
    }
}
