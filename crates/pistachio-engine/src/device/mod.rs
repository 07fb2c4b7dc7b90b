//! GPU device and surface management for windowed rendering.
//!
//! Creates the wgpu instance, adapter, device and queue, configures the
//! window surface and hands out per-frame encoders.

mod gpu;
mod init;
mod surface;

pub use gpu::Gpu;
pub use init::GpuInit;
pub use surface::{GpuFrame, SurfaceErrorAction};
