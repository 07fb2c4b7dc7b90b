//! Backend drawing through wgpu.
//!
//! Resources and the backend record into the shared frame state of a
//! [`WgpuDevice`]; [`WgpuContext`] replays the frame on the window surface.

mod backend;
mod context;
mod device;
mod pipeline;
mod reflect;
mod resources;
mod shader;

pub use backend::WgpuBackend;
pub use context::WgpuContext;
pub use device::WgpuDevice;
pub use resources::{WgpuIndexBuffer, WgpuTexture2D, WgpuVertexArray, WgpuVertexBuffer};
pub use shader::WgpuShader;

/// Device on the default adapter, or `None` on machines without one.
#[cfg(test)]
pub(crate) fn test_device() -> Option<WgpuDevice> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .ok()?;
    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
    Some(WgpuDevice::new(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb))
}
