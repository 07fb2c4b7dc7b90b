//! Input identifiers and polled input state.
//!
//! The API does not expose winit types; the window runtime maps platform
//! codes onto [`Key`] and [`MouseButton`].

mod state;
mod types;

pub use state::InputState;
pub use types::{Key, MouseButton};
