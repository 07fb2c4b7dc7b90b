use std::rc::Rc;

use crate::error::RenderError;

use super::buffer::{BufferElement, IndexBuffer, VertexBuffer};
use super::headless::HeadlessVertexArray;
use super::wgpu_backend::WgpuVertexArray;
use super::{Renderer, RendererApi};

/// One vertex attribute as presented to the shader stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBinding {
    /// First shader location of the attribute, unique across the whole
    /// vertex array. A matrix owns one location per column starting here.
    pub slot: u32,
    /// Index of the owning buffer in attachment order.
    pub buffer_index: usize,
    /// Stride of the owning buffer in bytes.
    pub stride: u32,
    pub element: BufferElement,
}

/// Aggregates vertex buffers and one index buffer.
pub trait VertexArray {
    fn bind(&self);
    fn unbind(&self);

    /// Attaches a vertex buffer; its layout must already be set.
    ///
    /// Attributes receive the next free slots, continuing after the buffers
    /// attached earlier. A matrix advances the next slot by its column count.
    fn add_vertex_buffer(&self, vertex_buffer: Rc<dyn VertexBuffer>) -> Result<(), RenderError>;

    fn set_index_buffer(&self, index_buffer: Rc<dyn IndexBuffer>);

    fn vertex_buffers(&self) -> Vec<Rc<dyn VertexBuffer>>;

    fn index_buffer(&self) -> Option<Rc<dyn IndexBuffer>>;

    fn attribute_bindings(&self) -> Vec<AttributeBinding>;

    /// Number of attributes across all attached layouts.
    fn attribute_count(&self) -> u32 {
        self.attribute_bindings().len() as u32
    }

    /// Index count of the attached index buffer, if any.
    fn index_count(&self) -> Option<u32> {
        self.index_buffer().map(|ib| ib.count())
    }
}

/// Backend-independent bookkeeping shared by every vertex array implementation.
#[derive(Default)]
pub(crate) struct VertexArrayData {
    vertex_buffers: Vec<Rc<dyn VertexBuffer>>,
    index_buffer: Option<Rc<dyn IndexBuffer>>,
    bindings: Vec<AttributeBinding>,
    next_slot: u32,
}

impl VertexArrayData {
    pub(crate) fn attach(&mut self, vertex_buffer: Rc<dyn VertexBuffer>) -> Result<(), RenderError> {
        let layout = vertex_buffer.layout();
        if layout.is_empty() {
            return Err(RenderError::EmptyLayout);
        }

        let buffer_index = self.vertex_buffers.len();
        for element in layout.iter() {
            self.bindings.push(AttributeBinding {
                slot: self.next_slot,
                buffer_index,
                stride: layout.stride(),
                element: element.clone(),
            });
            self.next_slot += element.ty.location_count();
        }

        self.vertex_buffers.push(vertex_buffer);
        Ok(())
    }

    pub(crate) fn set_index_buffer(&mut self, index_buffer: Rc<dyn IndexBuffer>) {
        self.index_buffer = Some(index_buffer);
    }

    pub(crate) fn vertex_buffers(&self) -> &[Rc<dyn VertexBuffer>] {
        &self.vertex_buffers
    }

    pub(crate) fn index_buffer(&self) -> Option<&Rc<dyn IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    pub(crate) fn bindings(&self) -> &[AttributeBinding] {
        &self.bindings
    }
}

/// Creates a vertex array for the active backend.
pub fn create_vertex_array(renderer: &Renderer) -> Result<Rc<dyn VertexArray>, RenderError> {
    log::debug!("creating vertex array");
    match renderer.api() {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None)),
        RendererApi::Headless => Ok(Rc::new(HeadlessVertexArray::new(
            renderer.headless_device()?,
        ))),
        RendererApi::Wgpu => Ok(Rc::new(WgpuVertexArray::new(renderer.wgpu_device()?))),
    }
}
