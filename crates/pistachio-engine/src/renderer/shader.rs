use std::path::Path;
use std::rc::Rc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::RenderError;

use super::headless::HeadlessShader;
use super::wgpu_backend::WgpuShader;
use super::{Renderer, RendererApi};

/// Pipeline stage a source string belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "vertex" => Some(ShaderStage::Vertex),
            "fragment" | "pixel" => Some(ShaderStage::Fragment),
            _ => None,
        }
    }
}

/// Runtime type tag of a uniform value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
}

/// A typed uniform value uploaded by name.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Float2(_) => UniformType::Float2,
            UniformValue::Float3(_) => UniformType::Float3,
            UniformValue::Float4(_) => UniformType::Float4,
            UniformValue::Mat3(_) => UniformType::Mat3,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Compiled shader program.
///
/// Uniform uploads never report success: writing a name the program does not
/// declare is a silent no-op, as it is at the driver level.
pub trait Shader {
    fn name(&self) -> &str;

    fn bind(&self);
    fn unbind(&self);

    fn set_uniform(&self, name: &str, value: UniformValue);

    fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_float2(&self, name: &str, value: Vec2) {
        self.set_uniform(name, UniformValue::Float2(value));
    }

    fn set_float3(&self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Float3(value));
    }

    fn set_float4(&self, name: &str, value: Vec4) {
        self.set_uniform(name, UniformValue::Float4(value));
    }

    fn set_mat3(&self, name: &str, value: Mat3) {
        self.set_uniform(name, UniformValue::Mat3(value));
    }

    fn set_mat4(&self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }
}

/// Per-stage sources of one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Splits a combined source on `#type <stage>` marker lines.
    ///
    /// Accepted stages are `vertex`, `fragment` and `pixel`. Both stages must
    /// be present exactly once.
    pub fn parse(name: &str, source: &str) -> Result<Self, RenderError> {
        let mut vertex: Option<String> = None;
        let mut fragment: Option<String> = None;
        let mut current: Option<(ShaderStage, String)> = None;

        for (line_no, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();
            let marker_rest = trimmed
                .strip_prefix("#type")
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
            if let Some(rest) = marker_rest {
                let marker = rest.trim();
                let stage = ShaderStage::from_marker(marker).ok_or_else(|| {
                    RenderError::shader_source(
                        name,
                        format!("unknown stage `{marker}` on line {}", line_no + 1),
                    )
                })?;

                if let Some((prev, body)) = current.take() {
                    store_stage(name, prev, body, &mut vertex, &mut fragment)?;
                }
                current = Some((stage, String::new()));
                continue;
            }

            match current.as_mut() {
                Some((_, body)) => {
                    body.push_str(line);
                    body.push('\n');
                }
                None if trimmed.is_empty() => {}
                None => {
                    return Err(RenderError::shader_source(
                        name,
                        format!("source before the first #type marker on line {}", line_no + 1),
                    ));
                }
            }
        }

        if let Some((stage, body)) = current.take() {
            store_stage(name, stage, body, &mut vertex, &mut fragment)?;
        }

        match (vertex, fragment) {
            (Some(vertex), Some(fragment)) => Ok(Self { vertex, fragment }),
            (None, _) => Err(RenderError::shader_source(name, "missing vertex stage")),
            (_, None) => Err(RenderError::shader_source(name, "missing fragment stage")),
        }
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), RenderError> {
        if self.vertex.trim().is_empty() {
            return Err(RenderError::shader_source(name, "empty vertex stage"));
        }
        if self.fragment.trim().is_empty() {
            return Err(RenderError::shader_source(name, "empty fragment stage"));
        }
        Ok(())
    }
}

fn store_stage(
    name: &str,
    stage: ShaderStage,
    body: String,
    vertex: &mut Option<String>,
    fragment: &mut Option<String>,
) -> Result<(), RenderError> {
    let slot = match stage {
        ShaderStage::Vertex => vertex,
        ShaderStage::Fragment => fragment,
    };
    if slot.is_some() {
        return Err(RenderError::shader_source(
            name,
            format!("duplicate {stage:?} stage"),
        ));
    }
    *slot = Some(body);
    Ok(())
}

/// Shader name for a source file: the file name without its extension.
pub fn shader_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Creates a shader from explicit vertex and fragment sources.
pub fn create_shader(
    renderer: &Renderer,
    name: &str,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<Rc<dyn Shader>, RenderError> {
    create_from_sources(renderer, name, ShaderSources::new(vertex_src, fragment_src))
}

/// Creates a shader from a combined source file with stage markers.
pub fn create_shader_from_file(
    renderer: &Renderer,
    path: impl AsRef<Path>,
) -> Result<Rc<dyn Shader>, RenderError> {
    let path = path.as_ref();
    if renderer.api() == RendererApi::None {
        return Err(RenderError::UnsupportedApi(RendererApi::None));
    }

    let source = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })?;
    let name = shader_name_from_path(path);
    let sources = ShaderSources::parse(&name, &source)?;
    create_from_sources(renderer, &name, sources)
}

fn create_from_sources(
    renderer: &Renderer,
    name: &str,
    sources: ShaderSources,
) -> Result<Rc<dyn Shader>, RenderError> {
    log::debug!("creating shader `{name}`");
    match renderer.api() {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None)),
        RendererApi::Headless => {
            sources.validate(name)?;
            Ok(Rc::new(HeadlessShader::new(renderer.headless_device()?, name)))
        }
        RendererApi::Wgpu => {
            sources.validate(name)?;
            Ok(Rc::new(WgpuShader::new(
                renderer.wgpu_device()?,
                name,
                &sources,
            )?))
        }
    }
}
