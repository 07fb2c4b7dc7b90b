use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::renderer::context::GraphicsContext;

use super::device::{DrawOp, FrameOp, Viewport, WgpuDevice};
use super::pipeline::DEPTH_FORMAT;

/// Window surface presenting the frames recorded through a [`WgpuDevice`].
pub struct WgpuContext {
    gpu: Gpu,
    device: WgpuDevice,
    depth: wgpu::TextureView,
    vsync: bool,
}

impl WgpuContext {
    /// Acquires a GPU for `window` and sets up the shared device.
    pub fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let vsync = init.vsync;
        let gpu = pollster::block_on(Gpu::new(window, init))?;
        let device = WgpuDevice::new(
            gpu.device().clone(),
            gpu.queue().clone(),
            gpu.surface_format(),
        );
        let depth = create_depth_view(gpu.device(), gpu.size());

        Ok(Self {
            gpu,
            device,
            depth,
            vsync,
        })
    }

    /// Device handle for [`Renderer::wgpu`](crate::renderer::Renderer::wgpu).
    pub fn device(&self) -> &WgpuDevice {
        &self.device
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView, ops: &[FrameOp]) {
        let clear_color = self.device.frame().clear_color;
        let draws: Vec<&DrawOp> = ops
            .iter()
            .filter_map(|op| match op {
                FrameOp::Draw(draw) => Some(draw),
                FrameOp::Clear(_) => None,
            })
            .collect();

        let alignment = self.gpu.device().limits().min_uniform_buffer_offset_alignment;
        let stride = uniform_stride(draws.iter().map(|d| d.uniforms.len()), alignment);
        let uniforms = (!draws.is_empty()).then(|| self.upload_uniforms(&draws, stride));

        let plan = plan_passes(
            ops.iter().map(|op| match op {
                FrameOp::Clear(color) => Some(*color),
                FrameOp::Draw(_) => None,
            }),
            clear_color,
        );

        let size = self.gpu.size();
        for pass_plan in plan {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pistachio scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass_plan.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let Some((_, uniform_group)) = uniforms.as_ref() else {
                continue;
            };
            for index in pass_plan.draws {
                let draw = draws[index];
                if let Some(viewport) = draw.viewport.and_then(|v| clamp_viewport(v, size)) {
                    let [x, y, w, h] = viewport;
                    pass.set_viewport(x, y, w, h, 0.0, 1.0);
                }
                pass.set_pipeline(&draw.pipeline);
                pass.set_bind_group(0, uniform_group, &[(index as u64 * stride) as u32]);
                pass.set_bind_group(1, draw.texture.as_ref(), &[]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
    }

    /// Packs every draw's uniform snapshot into one buffer at `stride` offsets.
    fn upload_uniforms(&self, draws: &[&DrawOp], stride: u64) -> (wgpu::Buffer, wgpu::BindGroup) {
        let mut staging = vec![0u8; draws.len() * stride as usize];
        for (i, draw) in draws.iter().enumerate() {
            let start = i * stride as usize;
            staging[start..start + draw.uniforms.len()].copy_from_slice(&draw.uniforms);
        }

        let device = self.gpu.device();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pistachio frame uniforms"),
            contents: &staging,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pistachio frame uniforms bind group"),
            layout: self.device.uniform_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(stride),
                }),
            }],
        });
        (buffer, bind_group)
    }
}

impl GraphicsContext for WgpuContext {
    fn init(&mut self) -> Result<()> {
        let info = self.gpu.adapter_info();
        log::info!("GPU: {} ({:?}, {:?})", info.name, info.backend, info.device_type);
        log::info!("  driver: {} {}", info.driver, info.driver_info);
        log::info!("  present mode: {:?}", self.gpu.present_mode());
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        let ops = std::mem::take(&mut self.device.frame().ops);

        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(&err) {
                    SurfaceErrorAction::Fatal => {
                        Err(anyhow::Error::new(err).context("surface lost beyond recovery"))
                    }
                    action => {
                        log::warn!("frame skipped ({err}): {action:?}");
                        Ok(())
                    }
                };
            }
        };

        self.encode(&mut frame.encoder, &frame.view, &ops);
        self.gpu.submit(frame);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let size = PhysicalSize::new(width, height);
        self.gpu.resize(size);
        if width > 0 && height > 0 {
            self.depth = create_depth_view(self.gpu.device(), size);
        }
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        self.gpu.set_vsync(enabled);
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }
}

fn create_depth_view(device: &wgpu::Device, size: PhysicalSize<u32>) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("pistachio depth"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Render passes of one frame. Every `Clear` starts a new pass.
#[derive(Debug, Clone, PartialEq)]
struct PassPlan {
    clear: wgpu::Color,
    /// Ordinals of the draws recorded in this pass.
    draws: Vec<usize>,
}

/// Splits recorded operations into passes; `None` stands for a draw.
///
/// Draws before the first clear go into a pass cleared to `fallback`, as
/// does an empty frame. Back-to-back clears collapse into the last one.
fn plan_passes(
    ops: impl IntoIterator<Item = Option<wgpu::Color>>,
    fallback: wgpu::Color,
) -> Vec<PassPlan> {
    let mut passes: Vec<PassPlan> = Vec::new();
    let mut draw = 0;
    for op in ops {
        match op {
            Some(color) => match passes.last_mut() {
                Some(pass) if pass.draws.is_empty() => pass.clear = color,
                _ => passes.push(PassPlan {
                    clear: color,
                    draws: Vec::new(),
                }),
            },
            None => {
                if passes.is_empty() {
                    passes.push(PassPlan {
                        clear: fallback,
                        draws: Vec::new(),
                    });
                }
                if let Some(pass) = passes.last_mut() {
                    pass.draws.push(draw);
                }
                draw += 1;
            }
        }
    }

    if passes.is_empty() {
        passes.push(PassPlan {
            clear: fallback,
            draws: Vec::new(),
        });
    }
    passes
}

/// Per-draw stride in the frame uniform buffer.
fn uniform_stride(sizes: impl IntoIterator<Item = usize>, alignment: u32) -> u64 {
    let largest = sizes.into_iter().max().unwrap_or(0).max(16) as u64;
    largest.div_ceil(u64::from(alignment)) * u64::from(alignment)
}

/// Converts a bottom-left origin viewport into a wgpu viewport inside the target.
fn clamp_viewport(viewport: Viewport, target: PhysicalSize<u32>) -> Option<[f32; 4]> {
    let x = viewport.x.min(target.width);
    let y = viewport.y.min(target.height);
    let width = viewport.width.min(target.width - x);
    let height = viewport.height.min(target.height - y);
    if width == 0 || height == 0 {
        return None;
    }
    let top = target.height - (y + height);
    Some([x as f32, top as f32, width as f32, height as f32])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: wgpu::Color = wgpu::Color::RED;
    const BLUE: wgpu::Color = wgpu::Color::BLUE;
    const BLACK: wgpu::Color = wgpu::Color::BLACK;

    #[test]
    fn empty_frame_still_clears() {
        assert_eq!(
            plan_passes([], BLACK),
            [PassPlan {
                clear: BLACK,
                draws: vec![]
            }]
        );
    }

    #[test]
    fn clear_then_draws_is_one_pass() {
        let plan = plan_passes([Some(RED), None, None], BLACK);
        assert_eq!(
            plan,
            [PassPlan {
                clear: RED,
                draws: vec![0, 1]
            }]
        );
    }

    #[test]
    fn clear_between_draws_splits_passes() {
        let plan = plan_passes([None, Some(RED), Some(BLUE), None], BLACK);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].clear, BLACK);
        assert_eq!(plan[0].draws, [0]);
        assert_eq!(plan[1].clear, BLUE);
        assert_eq!(plan[1].draws, [1]);
    }

    #[test]
    fn stride_respects_offset_alignment() {
        assert_eq!(uniform_stride([144, 64], 256), 256);
        assert_eq!(uniform_stride([300], 256), 512);
        assert_eq!(uniform_stride([], 256), 256);
    }

    #[test]
    fn viewport_is_flipped_and_clamped() {
        let target = PhysicalSize::new(800, 600);
        let full = Viewport {
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        };
        assert_eq!(clamp_viewport(full, target), Some([0.0, 0.0, 800.0, 600.0]));

        let bottom_left = Viewport {
            x: 0,
            y: 0,
            width: 400,
            height: 300,
        };
        assert_eq!(clamp_viewport(bottom_left, target), Some([0.0, 300.0, 400.0, 300.0]));

        let oversized = Viewport {
            x: 100,
            y: 0,
            width: 2000,
            height: 600,
        };
        assert_eq!(clamp_viewport(oversized, target), Some([100.0, 0.0, 700.0, 600.0]));

        let outside = Viewport {
            x: 900,
            y: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(clamp_viewport(outside, target), None);
    }
}
