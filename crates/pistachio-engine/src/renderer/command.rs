use glam::Vec4;

use crate::error::RenderError;

use super::api::RendererBackend;
use super::vertex_array::VertexArray;

/// Stateless façade over the active backend.
///
/// Keeps client code and [`Renderer`](super::Renderer) free of backend types.
pub struct RenderCommand {
    backend: Box<dyn RendererBackend>,
}

impl RenderCommand {
    pub fn new(backend: Box<dyn RendererBackend>) -> Self {
        Self { backend }
    }

    #[inline]
    pub fn init(&mut self) -> Result<(), RenderError> {
        self.backend.init()
    }

    #[inline]
    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.backend.set_viewport(x, y, width, height);
    }

    #[inline]
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.backend.set_clear_color(color);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.backend.clear();
    }

    #[inline]
    pub fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        self.backend.draw_indexed(vertex_array)
    }
}
