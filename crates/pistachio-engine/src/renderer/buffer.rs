use std::rc::Rc;

use crate::error::RenderError;

use super::headless::{HeadlessIndexBuffer, HeadlessVertexBuffer};
use super::wgpu_backend::{WgpuIndexBuffer, WgpuVertexBuffer};
use super::{Renderer, RendererApi};

/// Attribute type as seen by the shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes of one attribute of this type.
    pub const fn size(self) -> u32 {
        match self {
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 4 * 2,
            ShaderDataType::Float3 => 4 * 3,
            ShaderDataType::Float4 => 4 * 4,
            ShaderDataType::Mat3 => 4 * 3 * 3,
            ShaderDataType::Mat4 => 4 * 4 * 4,
            ShaderDataType::Int => 4,
            ShaderDataType::Int2 => 4 * 2,
            ShaderDataType::Int3 => 4 * 3,
            ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Bool => 1,
        }
    }

    /// Number of scalar components.
    pub const fn component_count(self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Bool => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat3 => 3 * 3,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }

    /// Number of consecutive shader locations the attribute occupies.
    ///
    /// Matrices take one location per column.
    pub const fn location_count(self) -> u32 {
        match self {
            ShaderDataType::Mat3 => 3,
            ShaderDataType::Mat4 => 4,
            _ => 1,
        }
    }
}

/// One named attribute inside a [`BufferLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct BufferElement {
    pub name: String,
    pub ty: ShaderDataType,
    pub size: u32,
    /// Byte offset from the start of a vertex. Filled in by the layout.
    pub offset: u32,
    pub normalized: bool,
}

impl BufferElement {
    pub fn new(ty: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            size: ty.size(),
            offset: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn component_count(&self) -> u32 {
        self.ty.component_count()
    }
}

/// Ordered description of the per-vertex fields of a vertex buffer.
///
/// Offsets and stride are computed on construction; elements are tightly packed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: impl IntoIterator<Item = BufferElement>) -> Self {
        let mut elements: Vec<BufferElement> = elements.into_iter().collect();
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size;
        }

        Self {
            elements,
            stride: offset,
        }
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl FromIterator<BufferElement> for BufferLayout {
    fn from_iter<I: IntoIterator<Item = BufferElement>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// GPU vertex buffer with its attribute layout.
pub trait VertexBuffer {
    fn bind(&self);
    fn unbind(&self);

    /// Size of the vertex data in bytes.
    fn size(&self) -> u64;

    fn layout(&self) -> BufferLayout;

    /// Must be called before the buffer is attached to a vertex array.
    fn set_layout(&self, layout: BufferLayout);
}

/// GPU index buffer of 32-bit indices.
pub trait IndexBuffer {
    fn bind(&self);
    fn unbind(&self);

    /// Number of indices.
    fn count(&self) -> u32;
}

/// Creates a vertex buffer for the active backend.
pub fn create_vertex_buffer(
    renderer: &Renderer,
    vertices: &[f32],
) -> Result<Rc<dyn VertexBuffer>, RenderError> {
    log::debug!("creating vertex buffer ({} bytes)", std::mem::size_of_val(vertices));
    match renderer.api() {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None)),
        RendererApi::Headless => Ok(Rc::new(HeadlessVertexBuffer::new(
            renderer.headless_device()?,
            vertices,
        ))),
        RendererApi::Wgpu => Ok(Rc::new(WgpuVertexBuffer::new(
            renderer.wgpu_device()?,
            vertices,
        ))),
    }
}

/// Creates an index buffer for the active backend.
pub fn create_index_buffer(
    renderer: &Renderer,
    indices: &[u32],
) -> Result<Rc<dyn IndexBuffer>, RenderError> {
    log::debug!("creating index buffer ({} indices)", indices.len());
    match renderer.api() {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None)),
        RendererApi::Headless => Ok(Rc::new(HeadlessIndexBuffer::new(
            renderer.headless_device()?,
            indices,
        ))),
        RendererApi::Wgpu => Ok(Rc::new(WgpuIndexBuffer::new(
            renderer.wgpu_device()?,
            indices,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::HeadlessDevice;

    fn quad_layout() -> BufferLayout {
        BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ])
    }

    #[test]
    fn layout_computes_offsets_and_stride() {
        let layout = quad_layout();
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.elements()[0].offset, 0);
        assert_eq!(layout.elements()[1].offset, 12);
        assert_eq!(layout.stride(), 20);
    }

    #[test]
    fn layout_preserves_declaration_order() {
        let layout = BufferLayout::new([
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Int, "a_Id"),
        ]);
        let names: Vec<&str> = layout.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a_Color", "a_Position", "a_Id"]);
        assert_eq!(layout.elements()[2].offset, 28);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let layout = BufferLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn matrix_types_report_sizes_and_components() {
        assert_eq!(ShaderDataType::Mat3.size(), 36);
        assert_eq!(ShaderDataType::Mat4.size(), 64);
        assert_eq!(ShaderDataType::Mat4.component_count(), 16);
        assert_eq!(ShaderDataType::Bool.size(), 1);
    }

    #[test]
    fn headless_buffers_report_size_and_count() {
        let renderer = Renderer::headless(HeadlessDevice::new());
        let vb = create_vertex_buffer(&renderer, &[0.0; 20]).unwrap();
        let ib = create_index_buffer(&renderer, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(vb.size(), 80);
        assert_eq!(ib.count(), 6);

        assert!(vb.layout().is_empty());
        vb.set_layout(quad_layout());
        assert_eq!(vb.layout(), quad_layout());
    }

    #[test]
    fn buffers_cannot_be_created_without_a_backend() {
        let renderer = Renderer::unconfigured();
        assert!(matches!(
            create_vertex_buffer(&renderer, &[0.0; 3]),
            Err(RenderError::UnsupportedApi(RendererApi::None))
        ));
        assert!(matches!(
            create_index_buffer(&renderer, &[0]),
            Err(RenderError::UnsupportedApi(RendererApi::None))
        ));
    }
}
