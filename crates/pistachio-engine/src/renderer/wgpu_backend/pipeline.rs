use crate::renderer::buffer::{BufferLayout, ShaderDataType};

/// Texture format of the depth attachment every pipeline is built against.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex buffer layout in a form usable as a pipeline cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VertexLayout {
    pub(crate) stride: u64,
    pub(crate) attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub(crate) fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Maps buffer layouts to wgpu vertex layouts.
///
/// Shader locations run on across buffers in order and agree with the
/// `AttributeBinding` slots of a vertex array holding the same buffers.
/// Matrices occupy one location per column.
pub(crate) fn vertex_layouts<'a>(
    layouts: impl IntoIterator<Item = &'a BufferLayout>,
) -> Vec<VertexLayout> {
    let mut location = 0;
    layouts
        .into_iter()
        .map(|layout| {
            let mut attributes = Vec::new();
            for element in layout {
                let format = vertex_format(element.ty, element.normalized);
                let columns = element.ty.location_count();
                let column_size = u64::from(element.size / columns);
                for column in 0..columns {
                    attributes.push(wgpu::VertexAttribute {
                        format,
                        offset: u64::from(element.offset) + u64::from(column) * column_size,
                        shader_location: location,
                    });
                    location += 1;
                }
            }
            VertexLayout {
                stride: u64::from(layout.stride()),
                attributes,
            }
        })
        .collect()
}

/// Format of one attribute column.
fn vertex_format(ty: ShaderDataType, normalized: bool) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as F;
    match ty {
        ShaderDataType::Float => F::Float32,
        ShaderDataType::Float2 => F::Float32x2,
        ShaderDataType::Float3 | ShaderDataType::Mat3 => F::Float32x3,
        ShaderDataType::Float4 | ShaderDataType::Mat4 => F::Float32x4,
        ShaderDataType::Int => F::Sint32,
        ShaderDataType::Int2 => F::Sint32x2,
        ShaderDataType::Int3 => F::Sint32x3,
        ShaderDataType::Int4 => F::Sint32x4,
        ShaderDataType::Bool if normalized => F::Unorm8,
        ShaderDataType::Bool => F::Uint8,
    }
}

pub(crate) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

pub(crate) fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::buffer::{create_vertex_buffer, BufferElement};
    use crate::renderer::headless::HeadlessDevice;
    use crate::renderer::{create_vertex_array, Renderer};

    #[test]
    fn locations_continue_across_buffers() {
        let a = BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ]);
        let b = BufferLayout::new([BufferElement::new(ShaderDataType::Float4, "a_Color")]);

        let layouts = vertex_layouts([&a, &b]);
        assert_eq!(layouts[0].stride, 20);
        assert_eq!(layouts[0].attributes[1].offset, 12);
        assert_eq!(layouts[0].attributes[1].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layouts[1].attributes[0].shader_location, 2);
    }

    #[test]
    fn matrices_take_one_location_per_column() {
        let layout = BufferLayout::new([
            BufferElement::new(ShaderDataType::Mat4, "a_Model"),
            BufferElement::new(ShaderDataType::Int, "a_Id"),
        ]);
        let layouts = vertex_layouts([&layout]);
        let attrs = &layouts[0].attributes;
        assert_eq!(attrs.len(), 5);
        let offsets: Vec<u64> = attrs.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, [0, 16, 32, 48, 64]);
        assert_eq!(attrs[4].shader_location, 4);
        assert_eq!(attrs[4].format, wgpu::VertexFormat::Sint32);
    }

    #[test]
    fn first_column_location_matches_vertex_array_slot() {
        let layouts = [
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Mat4, "a_Model"),
                BufferElement::new(ShaderDataType::Float, "a_Id"),
            ]),
            BufferLayout::new([
                BufferElement::new(ShaderDataType::Mat3, "a_Normal"),
                BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            ]),
        ];

        let renderer = Renderer::headless(HeadlessDevice::new());
        let va = create_vertex_array(&renderer).unwrap();
        for layout in &layouts {
            let vb = create_vertex_buffer(&renderer, &[0.0; 32]).unwrap();
            vb.set_layout(layout.clone());
            va.add_vertex_buffer(vb).unwrap();
        }

        let wgpu_layouts = vertex_layouts(&layouts);
        for binding in va.attribute_bindings() {
            let attrs = &wgpu_layouts[binding.buffer_index].attributes;
            let first = attrs
                .iter()
                .find(|a| u64::from(binding.element.offset) == a.offset)
                .unwrap();
            assert_eq!(first.shader_location, binding.slot, "{}", binding.element.name);
        }
        let slots: Vec<u32> = va.attribute_bindings().iter().map(|b| b.slot).collect();
        assert_eq!(slots, [0, 4, 5, 8]);
    }
}
