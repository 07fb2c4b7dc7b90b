//! winit runtime that drives an [`Application`](crate::app::Application).
//!
//! Owns the event loop and the main window, translates window events into
//! engine [`Event`](crate::events::Event)s and redraws continuously.

mod runtime;
mod translate;

pub(crate) use runtime::run;
