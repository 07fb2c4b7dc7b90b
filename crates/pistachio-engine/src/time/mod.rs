//! Frame timing.
//!
//! One [`FrameClock`] per render loop; `tick()` once per frame yields the
//! [`Timestep`] handed to layers.

mod frame_clock;
mod timestep;

pub use frame_clock::{FrameClock, FrameTime};
pub use timestep::Timestep;
