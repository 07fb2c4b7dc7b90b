use std::path::PathBuf;

use crate::renderer::RendererApi;

/// Errors raised by the renderer core.
///
/// Most variants describe misuse by calling code (wrong backend, broken scene
/// protocol, duplicate names). They are returned in every build profile; the
/// application loop treats them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer api `{0}` is not supported for resource creation")]
    UnsupportedApi(RendererApi),

    #[error("unknown renderer api `{0}`")]
    UnknownApi(String),

    #[error("renderer api `{0}` is selected but its device is not available")]
    BackendUnavailable(RendererApi),

    #[error("shader `{0}` already exists")]
    DuplicateShader(String),

    #[error("shader `{0}` not found")]
    ShaderNotFound(String),

    #[error("begin_scene called while a scene is already active")]
    SceneAlreadyActive,

    #[error("no active scene; call begin_scene first")]
    NoActiveScene,

    #[error("vertex buffer has no layout")]
    EmptyLayout,

    #[error("vertex array has no index buffer")]
    MissingIndexBuffer,

    #[error("draw issued without a bound shader")]
    NoShaderBound,

    #[error("shader `{name}`: {message}")]
    ShaderSource { name: String, message: String },

    #[error("failed to read shader file {path}")]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid image data: {0}")]
    InvalidImage(String),
}

impl RenderError {
    pub(crate) fn shader_source(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ShaderSource {
            name: name.into(),
            message: message.into(),
        }
    }
}
