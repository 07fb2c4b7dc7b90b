use std::rc::Rc;

use glam::Vec4;

use crate::error::RenderError;
use crate::renderer::api::RendererBackend;
use crate::renderer::vertex_array::VertexArray;

use super::device::{DrawOp, FrameOp, Viewport, WgpuDevice};
use super::pipeline::vertex_layouts;

/// Records draws against the shared frame state of a [`WgpuDevice`].
///
/// Nothing reaches the GPU here; [`WgpuContext`](super::WgpuContext) replays
/// the recorded operations when the frame is presented.
pub struct WgpuBackend {
    device: WgpuDevice,
}

impl WgpuBackend {
    pub fn new(device: WgpuDevice) -> Self {
        Self { device }
    }
}

impl RendererBackend for WgpuBackend {
    fn init(&mut self) -> Result<(), RenderError> {
        // Blending and depth test are baked into every pipeline.
        log::info!(
            "wgpu backend initialized (surface format {:?})",
            self.device.surface_format()
        );
        Ok(())
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.device.frame().viewport = Some(Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.device.frame().clear_color = wgpu::Color {
            r: f64::from(color.x),
            g: f64::from(color.y),
            b: f64::from(color.z),
            a: f64::from(color.w),
        };
    }

    fn clear(&mut self) {
        let mut frame = self.device.frame();
        let color = frame.clear_color;
        frame.ops.push(FrameOp::Clear(color));
    }

    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        let index_count = vertex_array
            .index_count()
            .ok_or(RenderError::MissingIndexBuffer)?;

        let mut frame = self.device.frame();
        let program = frame.program.clone().ok_or(RenderError::NoShaderBound)?;
        let index_buffer = frame
            .index_buffer
            .clone()
            .ok_or(RenderError::MissingIndexBuffer)?;

        let layouts = vertex_layouts(frame.vertex_buffers.iter().map(|(_, layout)| layout));
        let pipeline = program.pipeline(&self.device, layouts)?;
        let texture = frame.textures[0]
            .clone()
            .unwrap_or_else(|| self.device.white_texture());

        let op = DrawOp {
            pipeline,
            uniforms: program.uniform_bytes(),
            vertex_buffers: frame
                .vertex_buffers
                .iter()
                .map(|(buffer, _)| Rc::clone(buffer))
                .collect(),
            index_buffer,
            index_count,
            texture,
            viewport: frame.viewport,
        };
        frame.ops.push(FrameOp::Draw(op));
        Ok(())
    }
}
