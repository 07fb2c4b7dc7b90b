use anyhow::{Context, Result};

use crate::events::Event;
use crate::input::InputState;
use crate::renderer::headless::{HeadlessContext, HeadlessDevice};
use crate::renderer::{GraphicsContext, Renderer};
use crate::time::FrameClock;

use super::layer::{FrameCtx, Layer, LayerStack};

/// Owns the renderer, its presentation context and the layer stack.
///
/// The platform side feeds events through [`on_event`](Self::on_event) and
/// calls [`frame`](Self::frame) once per redraw until
/// [`is_running`](Self::is_running) turns false.
pub struct Application {
    layers: LayerStack,
    renderer: Renderer,
    context: Box<dyn GraphicsContext>,
    input: InputState,
    clock: FrameClock,
    running: bool,
    minimized: bool,
}

impl Application {
    /// Initializes `context` and `renderer` and returns a running application.
    pub fn new(mut renderer: Renderer, mut context: Box<dyn GraphicsContext>) -> Result<Self> {
        context
            .init()
            .context("failed to initialize graphics context")?;
        renderer
            .init()
            .with_context(|| format!("failed to initialize {} renderer", renderer.api()))?;

        Ok(Self {
            layers: LayerStack::new(),
            renderer,
            context,
            input: InputState::new(),
            clock: FrameClock::new(),
            running: true,
            minimized: false,
        })
    }

    /// Application on the headless backend with a `width` x `height` target.
    pub fn headless(width: u32, height: u32) -> Result<Self> {
        let device = HeadlessDevice::new();
        let context = HeadlessContext::new(device.clone(), width, height);
        let mut app = Self::new(Renderer::headless(device), Box::new(context))?;
        app.on_event(Event::WindowResize { width, height });
        Ok(app)
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Stops the application after the current frame.
    pub fn close(&mut self) {
        self.running = false;
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.context.set_vsync(enabled);
    }

    pub fn is_vsync(&self) -> bool {
        self.context.is_vsync()
    }

    /// Attaches `layer` and pushes it below the overlays.
    pub fn push_layer(&mut self, mut layer: Box<dyn Layer>) -> Result<()> {
        layer
            .on_attach(&mut self.renderer)
            .with_context(|| format!("layer `{}` failed to attach", layer.name()))?;
        log::debug!("pushed layer `{}`", layer.name());
        self.layers.push_layer(layer);
        Ok(())
    }

    pub fn push_overlay(&mut self, mut overlay: Box<dyn Layer>) -> Result<()> {
        overlay
            .on_attach(&mut self.renderer)
            .with_context(|| format!("overlay `{}` failed to attach", overlay.name()))?;
        log::debug!("pushed overlay `{}`", overlay.name());
        self.layers.push_overlay(overlay);
        Ok(())
    }

    pub fn pop_layer(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        self.layers.pop_layer(name)
    }

    pub fn pop_overlay(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        self.layers.pop_overlay(name)
    }

    /// Single entry point for platform events.
    ///
    /// Input state is updated first, then the application reacts, then the
    /// layers see the event top to bottom.
    pub fn on_event(&mut self, event: Event) {
        log::trace!("{event}");
        self.input.on_event(&event);

        match event {
            Event::WindowClose => {
                log::info!("window close requested");
                self.running = false;
            }
            Event::WindowResize { width, height } => self.on_window_resize(width, height),
            _ => {}
        }

        self.layers.on_event(&event);
    }

    /// Forgets held keys and buttons; call when the window loses focus.
    pub fn on_focus_lost(&mut self) {
        self.input.release_all();
    }

    /// Runs one frame: tick the clock, update layers, present.
    ///
    /// Layer updates are skipped while minimized; presenting still happens so
    /// the context can service its surface.
    pub fn frame(&mut self) -> Result<()> {
        let time = self.clock.tick();

        if !self.minimized {
            let mut ctx = FrameCtx {
                renderer: &mut self.renderer,
                input: &self.input,
                time,
            };
            self.layers.update(&mut ctx)?;
        }

        self.context
            .swap_buffers()
            .context("failed to present frame")
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            if !self.minimized {
                log::debug!("window minimized");
            }
            self.minimized = true;
            return;
        }

        if self.minimized {
            // Do not hand layers the time spent minimized.
            self.clock.reset();
            self.minimized = false;
        }
        self.renderer.on_window_resize(width, height);
        self.context.resize(width, height);
    }
}

/// Drives `app` for up to `frames` frames or until it stops.
pub(crate) fn drive_headless(app: &mut Application, frames: u64) -> Result<()> {
    let mut rendered = 0;
    while rendered < frames && app.is_running() {
        app.frame()?;
        rendered += 1;
    }
    log::info!("headless run finished after {rendered} frames");
    Ok(())
}
