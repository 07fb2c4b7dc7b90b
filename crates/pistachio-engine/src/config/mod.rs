//! Engine configuration.
//!
//! Plain structs with defaults. `EngineConfig::from_env` layers a few
//! `PISTACHIO_*` overrides on top.

mod engine;

pub use engine::{EngineConfig, WindowProps, DEFAULT_HEADLESS_FRAMES};
