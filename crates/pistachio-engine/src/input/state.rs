use std::collections::HashSet;

use crate::events::Event;

use super::types::{Key, MouseButton};

/// Polled input state of the application window.
///
/// Fed with every event before layers see it, so a layer's `on_update`
/// observes the state after all events of the frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,
    /// Cursor position in physical pixels, origin top-left.
    mouse_position: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: &Event) {
        match *event {
            Event::KeyPressed { key, .. } => {
                self.keys_down.insert(key);
            }
            Event::KeyReleased { key } => {
                self.keys_down.remove(&key);
            }
            Event::MouseButtonPressed { button } => {
                self.buttons_down.insert(button);
            }
            Event::MouseButtonReleased { button } => {
                self.buttons_down.remove(&button);
            }
            Event::MouseMoved { x, y } => self.mouse_position = (x, y),
            Event::WindowResize { .. } | Event::WindowClose | Event::MouseScrolled { .. } => {}
        }
    }

    /// Forgets held keys and buttons, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_down.clear();
        self.buttons_down.clear();
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    pub fn mouse_x(&self) -> f32 {
        self.mouse_position.0
    }

    pub fn mouse_y(&self) -> f32 {
        self.mouse_position.1
    }
}
