//! Backend-agnostic rendering.
//!
//! Client code builds resources through the `create_*` factories, records a
//! scene through [`Renderer`] and never names a backend type. The backend is
//! chosen once, when the renderer is constructed.

mod api;
mod buffer;
mod camera;
mod command;
mod context;
pub mod headless;
mod scene;
mod shader;
mod shader_library;
mod texture;
mod vertex_array;
pub mod wgpu_backend;

pub use api::{RendererApi, RendererBackend};
pub use buffer::{
    create_index_buffer, create_vertex_buffer, BufferElement, BufferLayout, IndexBuffer,
    ShaderDataType, VertexBuffer,
};
pub use camera::OrthographicCamera;
pub use command::RenderCommand;
pub use context::GraphicsContext;
pub use scene::{Renderer, SceneStats, TRANSFORM_UNIFORM, VIEW_PROJECTION_UNIFORM};
pub use shader::{
    create_shader, create_shader_from_file, shader_name_from_path, Shader, ShaderSources,
    ShaderStage, UniformType, UniformValue,
};
pub use shader_library::ShaderLibrary;
pub use texture::{
    create_texture_2d, create_texture_2d_from_image, ImageData, Texture, Texture2D,
    MAX_TEXTURE_SLOTS,
};
pub use vertex_array::{create_vertex_array, AttributeBinding, VertexArray};
