//! Pistachio engine crate.
//!
//! A renderer abstraction over wgpu (or an offscreen recorder), with the
//! window, event, input and layer plumbing needed to drive it.

pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod input;
pub mod logging;
pub mod renderer;
pub mod time;
mod window;

pub use app::{run, run_headless, Application, FrameCtx, Layer};
pub use config::{EngineConfig, WindowProps};
pub use error::RenderError;
