use std::cell::RefCell;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::texture::{ImageData, Texture, Texture2D, MAX_TEXTURE_SLOTS};
use crate::renderer::vertex_array::{AttributeBinding, VertexArray, VertexArrayData};

use super::device::WgpuDevice;

pub struct WgpuVertexBuffer {
    device: WgpuDevice,
    buffer: Rc<wgpu::Buffer>,
    size: u64,
    layout: RefCell<BufferLayout>,
}

impl WgpuVertexBuffer {
    pub(crate) fn new(device: &WgpuDevice, vertices: &[f32]) -> Self {
        let buffer = device
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("pistachio vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self {
            device: device.clone(),
            buffer: Rc::new(buffer),
            size: std::mem::size_of_val(vertices) as u64,
            layout: RefCell::new(BufferLayout::default()),
        }
    }
}

impl VertexBuffer for WgpuVertexBuffer {
    /// Appends this buffer to the vertex input of the next draw.
    fn bind(&self) {
        let layout = self.layout.borrow().clone();
        self.device
            .frame()
            .vertex_buffers
            .push((Rc::clone(&self.buffer), layout));
    }

    fn unbind(&self) {
        self.device
            .frame()
            .vertex_buffers
            .retain(|(buffer, _)| !Rc::ptr_eq(buffer, &self.buffer));
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn layout(&self) -> BufferLayout {
        self.layout.borrow().clone()
    }

    fn set_layout(&self, layout: BufferLayout) {
        *self.layout.borrow_mut() = layout;
    }
}

pub struct WgpuIndexBuffer {
    device: WgpuDevice,
    buffer: Rc<wgpu::Buffer>,
    count: u32,
}

impl WgpuIndexBuffer {
    pub(crate) fn new(device: &WgpuDevice, indices: &[u32]) -> Self {
        let buffer = device
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("pistachio index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            device: device.clone(),
            buffer: Rc::new(buffer),
            count: indices.len() as u32,
        }
    }
}

impl IndexBuffer for WgpuIndexBuffer {
    fn bind(&self) {
        self.device.frame().index_buffer = Some(Rc::clone(&self.buffer));
    }

    fn unbind(&self) {
        let mut frame = self.device.frame();
        if frame
            .index_buffer
            .as_ref()
            .is_some_and(|b| Rc::ptr_eq(b, &self.buffer))
        {
            frame.index_buffer = None;
        }
    }

    fn count(&self) -> u32 {
        self.count
    }
}

/// Vertex array state lives on the CPU; binding re-binds the member buffers.
pub struct WgpuVertexArray {
    device: WgpuDevice,
    data: RefCell<VertexArrayData>,
}

impl WgpuVertexArray {
    pub(crate) fn new(device: &WgpuDevice) -> Self {
        Self {
            device: device.clone(),
            data: RefCell::new(VertexArrayData::default()),
        }
    }
}

impl VertexArray for WgpuVertexArray {
    fn bind(&self) {
        {
            let mut frame = self.device.frame();
            frame.vertex_buffers.clear();
            frame.index_buffer = None;
        }

        let data = self.data.borrow();
        for vb in data.vertex_buffers() {
            vb.bind();
        }
        if let Some(ib) = data.index_buffer() {
            ib.bind();
        }
    }

    fn unbind(&self) {
        let mut frame = self.device.frame();
        frame.vertex_buffers.clear();
        frame.index_buffer = None;
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

pub struct WgpuTexture2D {
    device: WgpuDevice,
    width: u32,
    height: u32,
    _texture: wgpu::Texture,
    bind_group: Rc<wgpu::BindGroup>,
}

impl WgpuTexture2D {
    pub(crate) fn new(device: &WgpuDevice, image: &ImageData) -> Self {
        let (texture, bind_group) =
            device.create_texture(image.width, image.height, &image.to_rgba8());
        Self {
            device: device.clone(),
            width: image.width,
            height: image.height,
            _texture: texture,
            bind_group: Rc::new(bind_group),
        }
    }
}

impl Texture for WgpuTexture2D {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind(&self, slot: u32) {
        let mut frame = self.device.frame();
        let Some(entry) = frame.textures.get_mut(slot as usize) else {
            log::warn!("texture slot {slot} out of range (max {MAX_TEXTURE_SLOTS})");
            return;
        };
        *entry = Some(Rc::clone(&self.bind_group));
    }
}

impl Texture2D for WgpuTexture2D {}
