use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::app::Application;
use crate::config::EngineConfig;
use crate::events::Event;
use crate::renderer::wgpu_backend::WgpuContext;
use crate::renderer::Renderer;

use super::translate::translate_window_event;

/// Opens the main window and blocks until the application stops.
pub(crate) fn run<F>(config: EngineConfig, setup: F) -> Result<()>
where
    F: FnOnce(&mut Application) -> Result<()> + 'static,
{
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut runtime = Runtime {
        config,
        setup: Some(setup),
        window: None,
        app: None,
        error: None,
    };

    event_loop
        .run_app(&mut runtime)
        .context("winit event loop terminated with error")?;

    match runtime.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Runtime<F> {
    config: EngineConfig,
    setup: Option<F>,

    app: Option<Application>,
    window: Option<Arc<Window>>,

    /// First fatal error; returned from `run` once the loop exits.
    error: Option<anyhow::Error>,
}

impl<F> Runtime<F>
where
    F: FnOnce(&mut Application) -> Result<()>,
{
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let props = &self.config.window;
        log::info!(
            "creating window `{}` ({}x{})",
            props.title,
            props.width,
            props.height
        );

        let attrs = Window::default_attributes()
            .with_title(props.title.clone())
            .with_inner_size(LogicalSize::new(props.width, props.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let context = WgpuContext::new(Arc::clone(&window), self.config.gpu_init())?;
        let size = context.size();
        let renderer = Renderer::wgpu(context.device().clone());

        let mut app = Application::new(renderer, Box::new(context))?;
        app.on_event(Event::WindowResize {
            width: size.width,
            height: size.height,
        });

        if let Some(setup) = self.setup.take() {
            setup(&mut app).context("application setup failed")?;
        }

        window.request_redraw();
        self.window = Some(window);
        self.app = Some(app);
        Ok(())
    }

    /// Feeds one window event to the application.
    fn handle(&mut self, event: WindowEvent) -> Result<()> {
        let (Some(app), Some(window)) = (self.app.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };

        match event {
            WindowEvent::RedrawRequested => {
                if app.is_running() {
                    app.frame()?;
                }
            }
            WindowEvent::Focused(false) => app.on_focus_lost(),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                app.on_event(Event::WindowResize {
                    width: size.width,
                    height: size.height,
                });
            }
            other => {
                if let Some(event) = translate_window_event(&other) {
                    app.on_event(event);
                }
            }
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn is_stopped(&self) -> bool {
        self.app.as_ref().is_some_and(|app| !app.is_running())
    }
}

impl<F> ApplicationHandler for Runtime<F>
where
    F: FnOnce(&mut Application) -> Result<()>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(err) = self.handle(event) {
            self.fail(event_loop, err);
            return;
        }
        if self.is_stopped() {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.is_stopped() {
            event_loop.exit();
            return;
        }

        // Continuous redraw.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
