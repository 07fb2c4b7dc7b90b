use anyhow::{bail, Context, Result};

use crate::device::GpuInit;
use crate::logging::LoggingConfig;
use crate::renderer::RendererApi;

/// Frames rendered by a headless run when no count is configured.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 60;

const ENV_RENDERER_API: &str = "PISTACHIO_RENDERER_API";
const ENV_VSYNC: &str = "PISTACHIO_VSYNC";
const ENV_HEADLESS_FRAMES: &str = "PISTACHIO_HEADLESS_FRAMES";

/// Main window properties.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowProps {
    pub title: String,
    /// Logical pixels.
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            title: "Pistachio Engine".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Everything [`run`](crate::app::run) needs to start an application.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub window: WindowProps,
    pub api: RendererApi,
    /// `vsync` here is overridden by `window.vsync`.
    pub gpu: GpuInit,
    pub logging: LoggingConfig,
    /// Only used when `api` is [`RendererApi::Headless`].
    pub headless_frames: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowProps::default(),
            api: RendererApi::Wgpu,
            gpu: GpuInit::default(),
            logging: LoggingConfig::default(),
            headless_frames: None,
        }
    }
}

impl EngineConfig {
    /// Defaults with the process environment applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `PISTACHIO_*` overrides read through `lookup`.
    ///
    /// Unset variables leave the field untouched; malformed values are errors.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api) = lookup(ENV_RENDERER_API) {
            self.api = api
                .parse()
                .with_context(|| format!("invalid {ENV_RENDERER_API}"))?;
        }

        if let Some(vsync) = lookup(ENV_VSYNC) {
            self.window.vsync =
                parse_flag(&vsync).with_context(|| format!("invalid {ENV_VSYNC}"))?;
        }

        if let Some(frames) = lookup(ENV_HEADLESS_FRAMES) {
            let frames = frames
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid {ENV_HEADLESS_FRAMES} `{frames}`"))?;
            self.headless_frames = Some(frames);
        }

        Ok(self)
    }

    /// The [`GpuInit`] to open the window surface with.
    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            vsync: self.window.vsync,
            ..self.gpu.clone()
        }
    }

    pub fn headless_frames(&self) -> u64 {
        self.headless_frames.unwrap_or(DEFAULT_HEADLESS_FRAMES)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        other => bail!("expected 0/1/true/false/on/off, got `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::RenderError;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.window.title, "Pistachio Engine");
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert!(config.window.vsync);
        assert_eq!(config.api, RendererApi::Wgpu);
        assert_eq!(config.headless_frames(), DEFAULT_HEADLESS_FRAMES);
    }

    #[test]
    fn no_variables_changes_nothing() {
        let config = EngineConfig::default().with_overrides(env(&[])).unwrap();
        assert_eq!(config.api, RendererApi::Wgpu);
        assert_eq!(config.headless_frames, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::default()
            .with_overrides(env(&[
                ("PISTACHIO_RENDERER_API", "HEADLESS"),
                ("PISTACHIO_VSYNC", "off"),
                ("PISTACHIO_HEADLESS_FRAMES", " 12 "),
            ]))
            .unwrap();

        assert_eq!(config.api, RendererApi::Headless);
        assert!(!config.window.vsync);
        assert!(!config.gpu_init().vsync);
        assert_eq!(config.headless_frames(), 12);
    }

    #[test]
    fn unknown_api_is_reported() {
        let err = EngineConfig::default()
            .with_overrides(env(&[("PISTACHIO_RENDERER_API", "vulkan")]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RenderError>(),
            Some(RenderError::UnknownApi(name)) if name == "vulkan"
        ));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(EngineConfig::default()
            .with_overrides(env(&[("PISTACHIO_VSYNC", "maybe")]))
            .is_err());
        assert!(EngineConfig::default()
            .with_overrides(env(&[("PISTACHIO_HEADLESS_FRAMES", "-3")]))
            .is_err());
    }

    #[test]
    fn flags() {
        for on in ["1", "true", "ON"] {
            assert!(parse_flag(on).unwrap());
        }
        for off in ["0", "False", "off"] {
            assert!(!parse_flag(off).unwrap());
        }
    }
}
