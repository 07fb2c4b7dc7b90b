use std::fmt;

use bitflags::bitflags;

use crate::input::{Key, MouseButton};

bitflags! {
    /// Coarse classification used to filter events.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct EventCategory: u8 {
        const APPLICATION  = 1 << 0;
        const INPUT        = 1 << 1;
        const KEYBOARD     = 1 << 2;
        const MOUSE        = 1 << 3;
        const MOUSE_BUTTON = 1 << 4;
    }
}

/// Discriminant of an [`Event`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    WindowClose,
    WindowResize,
    KeyPressed,
    KeyReleased,
    MouseButtonPressed,
    MouseButtonReleased,
    MouseMoved,
    MouseScrolled,
}

/// Window and input events, delivered synchronously.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// New framebuffer size in physical pixels; 0x0 means minimized.
    WindowResize { width: u32, height: u32 },
    WindowClose,
    /// `repeat_count` is 0 for the initial press and 1 for auto-repeat.
    KeyPressed { key: Key, repeat_count: u32 },
    KeyReleased { key: Key },
    MouseButtonPressed { button: MouseButton },
    MouseButtonReleased { button: MouseButton },
    MouseMoved { x: f32, y: f32 },
    MouseScrolled { x_offset: f32, y_offset: f32 },
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::WindowResize { .. } => EventType::WindowResize,
            Event::WindowClose => EventType::WindowClose,
            Event::KeyPressed { .. } => EventType::KeyPressed,
            Event::KeyReleased { .. } => EventType::KeyReleased,
            Event::MouseButtonPressed { .. } => EventType::MouseButtonPressed,
            Event::MouseButtonReleased { .. } => EventType::MouseButtonReleased,
            Event::MouseMoved { .. } => EventType::MouseMoved,
            Event::MouseScrolled { .. } => EventType::MouseScrolled,
        }
    }

    pub fn categories(&self) -> EventCategory {
        match self {
            Event::WindowResize { .. } | Event::WindowClose => EventCategory::APPLICATION,
            Event::KeyPressed { .. } | Event::KeyReleased { .. } => {
                EventCategory::INPUT | EventCategory::KEYBOARD
            }
            Event::MouseButtonPressed { .. } | Event::MouseButtonReleased { .. } => {
                EventCategory::INPUT | EventCategory::MOUSE | EventCategory::MOUSE_BUTTON
            }
            Event::MouseMoved { .. } | Event::MouseScrolled { .. } => {
                EventCategory::INPUT | EventCategory::MOUSE
            }
        }
    }

    pub fn is_in_category(&self, category: EventCategory) -> bool {
        self.categories().intersects(category)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::WindowResize { width, height } => write!(f, "WindowResizeEvent: {width}, {height}"),
            Event::WindowClose => f.write_str("WindowCloseEvent"),
            Event::KeyPressed { key, repeat_count } => {
                write!(f, "KeyPressedEvent: {key} ({repeat_count} repeats)")
            }
            Event::KeyReleased { key } => write!(f, "KeyReleasedEvent: {key}"),
            Event::MouseButtonPressed { button } => write!(f, "MouseButtonPressedEvent: {button:?}"),
            Event::MouseButtonReleased { button } => {
                write!(f, "MouseButtonReleasedEvent: {button:?}")
            }
            Event::MouseMoved { x, y } => write!(f, "MouseMovedEvent: {x}, {y}"),
            Event::MouseScrolled { x_offset, y_offset } => {
                write!(f, "MouseScrolledEvent: {x_offset}, {y_offset}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_events_are_keyboard_input() {
        let ev = Event::KeyPressed {
            key: Key::A,
            repeat_count: 0,
        };
        assert_eq!(ev.event_type(), EventType::KeyPressed);
        assert!(ev.is_in_category(EventCategory::INPUT));
        assert!(ev.is_in_category(EventCategory::KEYBOARD));
        assert!(!ev.is_in_category(EventCategory::MOUSE));
        assert!(!ev.is_in_category(EventCategory::APPLICATION));
    }

    #[test]
    fn mouse_button_events_carry_three_categories() {
        let ev = Event::MouseButtonPressed {
            button: MouseButton::Left,
        };
        assert_eq!(
            ev.categories(),
            EventCategory::INPUT | EventCategory::MOUSE | EventCategory::MOUSE_BUTTON
        );

        let moved = Event::MouseMoved { x: 1.0, y: 2.0 };
        assert!(moved.is_in_category(EventCategory::MOUSE));
        assert!(!moved.is_in_category(EventCategory::MOUSE_BUTTON));
    }

    #[test]
    fn window_events_are_application_only() {
        for ev in [Event::WindowClose, Event::WindowResize { width: 1, height: 1 }] {
            assert_eq!(ev.categories(), EventCategory::APPLICATION);
            assert!(!ev.is_in_category(EventCategory::INPUT));
        }
    }

    #[test]
    fn display_names_the_event_and_payload() {
        assert_eq!(
            Event::WindowResize {
                width: 1280,
                height: 720
            }
            .to_string(),
            "WindowResizeEvent: 1280, 720"
        );
        assert_eq!(
            Event::KeyPressed {
                key: Key::Space,
                repeat_count: 1
            }
            .to_string(),
            "KeyPressedEvent: Space (1 repeats)"
        );
        assert_eq!(
            Event::MouseScrolled {
                x_offset: 0.0,
                y_offset: -1.5
            }
            .to_string(),
            "MouseScrolledEvent: 0, -1.5"
        );
    }
}
