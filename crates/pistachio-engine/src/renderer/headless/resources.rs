use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::shader::{Shader, UniformValue};
use crate::renderer::texture::{ImageData, Texture, Texture2D, MAX_TEXTURE_SLOTS};
use crate::renderer::vertex_array::{AttributeBinding, VertexArray, VertexArrayData};

use super::device::{HeadlessDevice, ResourceId, ShaderState};

pub struct HeadlessVertexBuffer {
    id: ResourceId,
    device: HeadlessDevice,
    vertices: Vec<f32>,
    layout: RefCell<BufferLayout>,
}

impl HeadlessVertexBuffer {
    pub(crate) fn new(device: &HeadlessDevice, vertices: &[f32]) -> Self {
        Self {
            id: ResourceId::next(),
            device: device.clone(),
            vertices: vertices.to_vec(),
            layout: RefCell::new(BufferLayout::default()),
        }
    }
}

impl VertexBuffer for HeadlessVertexBuffer {
    fn bind(&self) {
        self.device.state().bound_vertex_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.device.state();
        if state.bound_vertex_buffer == Some(self.id) {
            state.bound_vertex_buffer = None;
        }
    }

    fn size(&self) -> u64 {
        std::mem::size_of_val(self.vertices.as_slice()) as u64
    }

    fn layout(&self) -> BufferLayout {
        self.layout.borrow().clone()
    }

    fn set_layout(&self, layout: BufferLayout) {
        *self.layout.borrow_mut() = layout;
    }
}

pub struct HeadlessIndexBuffer {
    id: ResourceId,
    device: HeadlessDevice,
    indices: Vec<u32>,
}

impl HeadlessIndexBuffer {
    pub(crate) fn new(device: &HeadlessDevice, indices: &[u32]) -> Self {
        Self {
            id: ResourceId::next(),
            device: device.clone(),
            indices: indices.to_vec(),
        }
    }
}

impl IndexBuffer for HeadlessIndexBuffer {
    fn bind(&self) {
        self.device.state().bound_index_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.device.state();
        if state.bound_index_buffer == Some(self.id) {
            state.bound_index_buffer = None;
        }
    }

    fn count(&self) -> u32 {
        self.indices.len() as u32
    }
}

pub struct HeadlessVertexArray {
    id: ResourceId,
    device: HeadlessDevice,
    data: RefCell<VertexArrayData>,
}

impl HeadlessVertexArray {
    pub(crate) fn new(device: &HeadlessDevice) -> Self {
        Self {
            id: ResourceId::next(),
            device: device.clone(),
            data: RefCell::new(VertexArrayData::default()),
        }
    }
}

impl VertexArray for HeadlessVertexArray {
    fn bind(&self) {
        self.device.state().bound_vertex_array = Some(self.id);
        let data = self.data.borrow();
        if let Some(ib) = data.index_buffer() {
            ib.bind();
        }
    }

    fn unbind(&self) {
        let mut state = self.device.state();
        if state.bound_vertex_array == Some(self.id) {
            state.bound_vertex_array = None;
        }
    }

    fn add_vertex_buffer(&self, vertex_buffer: Rc<dyn VertexBuffer>) -> Result<(), RenderError> {
        self.data.borrow_mut().attach(vertex_buffer)
    }

    fn set_index_buffer(&self, index_buffer: Rc<dyn IndexBuffer>) {
        self.data.borrow_mut().set_index_buffer(index_buffer);
    }

    fn vertex_buffers(&self) -> Vec<Rc<dyn VertexBuffer>> {
        self.data.borrow().vertex_buffers().to_vec()
    }

    fn index_buffer(&self) -> Option<Rc<dyn IndexBuffer>> {
        self.data.borrow().index_buffer().cloned()
    }

    fn attribute_bindings(&self) -> Vec<AttributeBinding> {
        self.data.borrow().bindings().to_vec()
    }
}

pub struct HeadlessShader {
    device: HeadlessDevice,
    state: Rc<ShaderState>,
}

impl HeadlessShader {
    pub(crate) fn new(device: &HeadlessDevice, name: &str) -> Self {
        Self {
            device: device.clone(),
            state: device.register_shader(name),
        }
    }
}

impl Shader for HeadlessShader {
    fn name(&self) -> &str {
        &self.state.name
    }

    fn bind(&self) {
        self.device.state().bound_shader = Some(Rc::clone(&self.state));
    }

    fn unbind(&self) {
        let mut state = self.device.state();
        if state
            .bound_shader
            .as_ref()
            .is_some_and(|s| Rc::ptr_eq(s, &self.state))
        {
            state.bound_shader = None;
        }
    }

    fn set_uniform(&self, name: &str, value: UniformValue) {
        self.state
            .uniforms
            .borrow_mut()
            .insert(name.to_string(), value);
    }
}

pub struct HeadlessTexture2D {
    id: ResourceId,
    device: HeadlessDevice,
    width: u32,
    height: u32,
}

impl HeadlessTexture2D {
    pub(crate) fn new(device: &HeadlessDevice, image: &ImageData) -> Self {
        Self {
            id: ResourceId::next(),
            device: device.clone(),
            width: image.width,
            height: image.height,
        }
    }
}

impl Texture for HeadlessTexture2D {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind(&self, slot: u32) {
        let mut state = self.device.state();
        let Some(entry) = state.textures.get_mut(slot as usize) else {
            log::warn!("texture slot {slot} out of range (max {MAX_TEXTURE_SLOTS})");
            return;
        };
        *entry = Some(self.id);
    }
}

impl Texture2D for HeadlessTexture2D {}
