//! In-memory backend.
//!
//! Records every backend command instead of talking to a GPU. Used for tests,
//! CI runs and anywhere a window is not available.

mod backend;
mod context;
mod device;
mod resources;

pub use backend::HeadlessBackend;
pub use context::HeadlessContext;
pub use device::{DrawCall, HeadlessDevice, RecordedCommand, ResourceId};
pub use resources::{
    HeadlessIndexBuffer, HeadlessShader, HeadlessTexture2D, HeadlessVertexArray,
    HeadlessVertexBuffer,
};
