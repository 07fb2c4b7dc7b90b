use glam::Vec4;

use crate::error::RenderError;
use crate::renderer::api::RendererBackend;
use crate::renderer::vertex_array::VertexArray;

use super::device::{DrawCall, HeadlessDevice, RecordedCommand};

/// Backend that records commands into a [`HeadlessDevice`].
pub struct HeadlessBackend {
    device: HeadlessDevice,
}

impl HeadlessBackend {
    pub fn new(device: HeadlessDevice) -> Self {
        Self { device }
    }
}

impl RendererBackend for HeadlessBackend {
    fn init(&mut self) -> Result<(), RenderError> {
        log::debug!("headless backend initialized");
        Ok(())
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.device.record(RecordedCommand::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.device.record(RecordedCommand::SetClearColor(color));
    }

    fn clear(&mut self) {
        self.device.record(RecordedCommand::Clear);
    }

    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        let index_count = vertex_array
            .index_count()
            .ok_or(RenderError::MissingIndexBuffer)?;

        let mut state = self.device.state();
        let shader = state.bound_shader.as_ref().ok_or(RenderError::NoShaderBound)?;
        let call = DrawCall {
            shader: Some(shader.name.clone()),
            uniforms: shader.uniforms.borrow().clone(),
            vertex_array: state.bound_vertex_array,
            index_count,
            textures: state.textures,
        };
        state.commands.push(RecordedCommand::DrawIndexed(call));
        Ok(())
    }
}
