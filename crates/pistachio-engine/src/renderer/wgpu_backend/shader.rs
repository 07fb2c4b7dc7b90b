use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::shader::{Shader, ShaderSources, UniformValue};

use super::device::WgpuDevice;
use super::pipeline::{alpha_blend, depth_state, VertexLayout};
use super::reflect::{reflect_program, UniformBlock};

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

/// Compiled stages plus the CPU copy of the uniform block.
pub(crate) struct Program {
    name: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    block: UniformBlock,
    uniforms: RefCell<Vec<u8>>,
    pipelines: RefCell<HashMap<Vec<VertexLayout>, Rc<wgpu::RenderPipeline>>>,
}

impl Program {
    pub(crate) fn uniform_bytes(&self) -> Vec<u8> {
        self.uniforms.borrow().clone()
    }

    /// Pipeline for this program and the given vertex layouts, built on first use.
    ///
    /// Fails when the vertex layouts do not satisfy the vertex stage inputs.
    pub(crate) fn pipeline(
        &self,
        device: &WgpuDevice,
        layouts: Vec<VertexLayout>,
    ) -> Result<Rc<wgpu::RenderPipeline>, RenderError> {
        if let Some(pipeline) = self.pipelines.borrow().get(&layouts) {
            return Ok(Rc::clone(pipeline));
        }

        log::debug!(
            "building pipeline for shader `{}` ({} vertex buffers)",
            self.name,
            layouts.len()
        );
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            layouts.iter().map(VertexLayout::as_wgpu).collect();

        let scope = device
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&self.name),
                layout: Some(device.pipeline_layout()),
                vertex: wgpu::VertexState {
                    module: &self.vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: device.surface_format(),
                        blend: Some(alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(depth_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
        if let Some(err) = pollster::block_on(scope.pop()) {
            log::error!("pipeline for shader `{}` is invalid: {err}", self.name);
            return Err(RenderError::shader_source(
                &self.name,
                format!("pipeline: {err}"),
            ));
        }

        let pipeline = Rc::new(pipeline);
        self.pipelines
            .borrow_mut()
            .insert(layouts, Rc::clone(&pipeline));
        Ok(pipeline)
    }
}

/// WGSL program with `vs_main` and `fs_main` entry points.
///
/// Named uniforms live in the struct bound at `@group(0) @binding(0)`;
/// `@group(1)` holds the texture in slot 0 and its sampler.
pub struct WgpuShader {
    device: WgpuDevice,
    program: Rc<Program>,
}

impl WgpuShader {
    pub(crate) fn new(
        device: &WgpuDevice,
        name: &str,
        sources: &ShaderSources,
    ) -> Result<Self, RenderError> {
        let block = reflect_program(name, &sources.vertex, &sources.fragment)?;
        log::debug!("shader `{name}` uniform block: {} bytes", block.size());

        let vertex = compile(device, name, "vertex", &sources.vertex)?;
        let fragment = compile(device, name, "fragment", &sources.fragment)?;

        Ok(Self {
            device: device.clone(),
            program: Rc::new(Program {
                name: name.to_string(),
                vertex,
                fragment,
                uniforms: RefCell::new(vec![0; block.size()]),
                block,
                pipelines: RefCell::new(HashMap::new()),
            }),
        })
    }
}

/// Compiles one stage, turning compiler errors into a construction error.
///
/// Validation errors are caught in an error scope; outside one wgpu hands
/// them to the uncaptured-error handler, which panics.
fn compile(
    device: &WgpuDevice,
    name: &str,
    stage: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, RenderError> {
    let scope = device
        .device()
        .push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device
        .device()
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

    match pollster::block_on(scope.pop()) {
        None => Ok(module),
        Some(err) => {
            log::error!("{stage} stage of shader `{name}` failed to compile:\n{err}");
            Err(RenderError::shader_source(name, format!("{stage} stage: {err}")))
        }
    }
}

impl Shader for WgpuShader {
    fn name(&self) -> &str {
        &self.program.name
    }

    fn bind(&self) {
        self.device.frame().program = Some(Rc::clone(&self.program));
    }

    fn unbind(&self) {
        let mut frame = self.device.frame();
        if frame
            .program
            .as_ref()
            .is_some_and(|p| Rc::ptr_eq(p, &self.program))
        {
            frame.program = None;
        }
    }

    fn set_uniform(&self, name: &str, value: UniformValue) {
        let mut data = self.program.uniforms.borrow_mut();
        if !self.program.block.write(&mut data, name, value) {
            log::trace!(
                "shader `{}` has no {:?} uniform `{name}`",
                self.program.name,
                value.uniform_type()
            );
        }
    }
}
