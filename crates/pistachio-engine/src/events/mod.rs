//! Engine events.
//!
//! The window runtime translates platform events into [`Event`]s and hands
//! them to the application, which offers each one to its layers.

mod event;

pub use event::{Event, EventCategory, EventType};
