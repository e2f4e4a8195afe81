//! Window-independent input snapshot, filled by the display each tick.

use std::collections::HashSet;

use glint_math::Vec2;

/// Keys the renderer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    S,
    A,
    D,
    R,
    F,
    /// Save the current image
    P,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Input state as seen by the camera controller.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    cursor: Vec2,
    buttons: HashSet<MouseButton>,
    /// Scroll accumulated since the last [`InputState::end_frame`]
    scroll: f32,
    keys: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer position in physical pixels.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn set_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    /// Clear per-tick deltas. Held buttons and keys persist.
    pub fn end_frame(&mut self) {
        self.scroll = 0.0;
    }
}
