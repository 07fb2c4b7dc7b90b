use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use crate::renderer::buffer::BufferLayout;
use crate::renderer::texture::MAX_TEXTURE_SLOTS;

use super::shader::Program;

/// Viewport rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// One indexed draw, with everything needed to replay it at present time.
pub(crate) struct DrawOp {
    pub(crate) pipeline: Rc<wgpu::RenderPipeline>,
    /// Snapshot of the program's uniform block at submit time.
    pub(crate) uniforms: Vec<u8>,
    pub(crate) vertex_buffers: Vec<Rc<wgpu::Buffer>>,
    pub(crate) index_buffer: Rc<wgpu::Buffer>,
    pub(crate) index_count: u32,
    pub(crate) texture: Rc<wgpu::BindGroup>,
    pub(crate) viewport: Option<Viewport>,
}

pub(crate) enum FrameOp {
    Clear(wgpu::Color),
    Draw(DrawOp),
}

/// Bind state and recorded operations of the frame in flight.
#[derive(Default)]
pub(crate) struct FrameState {
    pub(crate) program: Option<Rc<Program>>,
    /// Vertex buffers of the bound vertex array, in attachment order.
    pub(crate) vertex_buffers: Vec<(Rc<wgpu::Buffer>, BufferLayout)>,
    pub(crate) index_buffer: Option<Rc<wgpu::Buffer>>,
    pub(crate) textures: [Option<Rc<wgpu::BindGroup>>; MAX_TEXTURE_SLOTS],
    pub(crate) clear_color: wgpu::Color,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) ops: Vec<FrameOp>,
}

struct Shared {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    white_texture: Rc<wgpu::BindGroup>,
    frame: RefCell<FrameState>,
}

/// Shared wgpu device handle the resources and the backend record into.
///
/// Bind calls on resources update the frame state; draws snapshot it. The
/// graphics context replays the recorded frame on present. Cloning yields
/// another handle to the same device.
#[derive(Clone)]
pub struct WgpuDevice {
    shared: Rc<Shared>,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pistachio uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pistachio texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pistachio pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        // Minified textures are smoothed, magnified ones keep hard texel edges.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pistachio texture sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_rgba8(&device, &queue, 1, 1, &[255; 4], "pistachio white texture");
        let white_texture = Rc::new(texture_bind_group(
            &device,
            &texture_layout,
            &sampler,
            &white.create_view(&wgpu::TextureViewDescriptor::default()),
        ));

        Self {
            shared: Rc::new(Shared {
                device,
                queue,
                surface_format,
                uniform_layout,
                texture_layout,
                pipeline_layout,
                sampler,
                white_texture,
                frame: RefCell::new(FrameState::default()),
            }),
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.shared.surface_format
    }

    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.shared.device
    }

    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.shared.queue
    }

    pub(crate) fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.shared.uniform_layout
    }

    pub(crate) fn pipeline_layout(&self) -> &wgpu::PipelineLayout {
        &self.shared.pipeline_layout
    }

    /// Texture bound when slot 0 is empty.
    pub(crate) fn white_texture(&self) -> Rc<wgpu::BindGroup> {
        Rc::clone(&self.shared.white_texture)
    }

    pub(crate) fn frame(&self) -> RefMut<'_, FrameState> {
        self.shared.frame.borrow_mut()
    }

    /// Uploads RGBA8 pixels and returns the texture with its bind group.
    pub(crate) fn create_texture(
        &self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> (wgpu::Texture, wgpu::BindGroup) {
        let texture = upload_rgba8(
            &self.shared.device,
            &self.shared.queue,
            width,
            height,
            rgba,
            "pistachio texture2d",
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = texture_bind_group(
            &self.shared.device,
            &self.shared.texture_layout,
            &self.shared.sampler,
            &view,
        );
        (texture, bind_group)
    }
}

fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    rgba: &[u8],
    label: &str,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("pistachio texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
