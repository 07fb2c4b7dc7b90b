use std::fmt;
use std::str::FromStr;

use glam::Vec4;

use crate::error::RenderError;

use super::vertex_array::VertexArray;

/// Graphics backend selector.
///
/// Set once when the [`Renderer`](super::Renderer) is constructed. Every
/// resource factory dispatches on it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RendererApi {
    /// No backend. Resource creation fails with `UnsupportedApi`.
    #[default]
    None,
    /// In-memory backend that records commands instead of drawing.
    Headless,
    /// wgpu over the platform's native API.
    Wgpu,
}

impl RendererApi {
    pub fn as_str(self) -> &'static str {
        match self {
            RendererApi::None => "none",
            RendererApi::Headless => "headless",
            RendererApi::Wgpu => "wgpu",
        }
    }
}

impl fmt::Display for RendererApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererApi {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RendererApi::None),
            "headless" | "null" => Ok(RendererApi::Headless),
            "wgpu" => Ok(RendererApi::Wgpu),
            _ => Err(RenderError::UnknownApi(s.to_string())),
        }
    }
}

/// Low-level command surface implemented once per backend.
///
/// [`RenderCommand`](super::RenderCommand) forwards to exactly one instance.
pub trait RendererBackend {
    /// One-time pipeline state setup (blending, depth).
    fn init(&mut self) -> Result<(), RenderError>;

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn set_clear_color(&mut self, color: Vec4);

    /// Clears color and depth of the current target.
    fn clear(&mut self);

    /// Draws the index buffer of `vertex_array` with the currently bound
    /// shader, vertex array and textures.
    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError>;
}
