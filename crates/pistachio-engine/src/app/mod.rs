//! Application bootstrapping: layers, the frame loop and entry points.

mod application;
mod layer;

use anyhow::Result;

use crate::config::EngineConfig;
use crate::error::RenderError;
use crate::logging::init_logging;
use crate::renderer::RendererApi;

pub use application::Application;
pub use layer::{FrameCtx, Layer, LayerStack};

/// Runs an application as configured until it stops.
///
/// `setup` pushes the client's layers once the renderer exists. With
/// [`RendererApi::Wgpu`] this opens a window and blocks in the event loop;
/// with [`RendererApi::Headless`] it renders `config.headless_frames()`
/// frames offscreen.
pub fn run<F>(config: EngineConfig, setup: F) -> Result<()>
where
    F: FnOnce(&mut Application) -> Result<()> + 'static,
{
    init_logging(config.logging.clone());

    match config.api {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None).into()),
        RendererApi::Headless => {
            let mut app = Application::headless(config.window.width, config.window.height)?;
            setup(&mut app)?;
            application::drive_headless(&mut app, config.headless_frames())
        }
        RendererApi::Wgpu => crate::window::run(config, setup),
    }
}

/// Renders `frames` frames on the headless backend and returns the
/// application for inspection.
pub fn run_headless<F>(frames: u64, setup: F) -> Result<Application>
where
    F: FnOnce(&mut Application) -> Result<()>,
{
    let window = crate::config::WindowProps::default();
    let mut app = Application::headless(window.width, window.height)?;
    setup(&mut app)?;
    application::drive_headless(&mut app, frames)?;
    Ok(app)
}
