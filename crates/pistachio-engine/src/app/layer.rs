use anyhow::{Context, Result};

use crate::events::Event;
use crate::input::InputState;
use crate::renderer::Renderer;
use crate::time::{FrameTime, Timestep};

/// Per-frame context handed to [`Layer::on_update`].
pub struct FrameCtx<'a> {
    pub renderer: &'a mut Renderer,
    pub input: &'a InputState,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    pub fn timestep(&self) -> Timestep {
        self.time.dt
    }
}

/// Unit of application logic stacked in an [`Application`](super::Application).
pub trait Layer {
    /// Used for logging and to pop the layer again.
    fn name(&self) -> &str;

    /// Called once when pushed. Create GPU resources here.
    fn on_attach(&mut self, renderer: &mut Renderer) -> Result<()> {
        let _ = renderer;
        Ok(())
    }

    fn on_detach(&mut self) {}

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()>;

    /// Returns `true` when the event is handled and must not reach lower layers.
    fn on_event(&mut self, event: &Event) -> bool {
        let _ = event;
        false
    }
}

/// Ordered layers with overlays kept above all regular layers.
///
/// Updates run bottom to top; events travel top to bottom until a layer
/// handles them. Remaining layers are detached when the stack is dropped.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn Layer>>,
    /// Index of the first overlay.
    overlay_start: usize,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `layer` above the other layers and below every overlay.
    pub fn push_layer(&mut self, layer: Box<dyn Layer>) {
        self.layers.insert(self.overlay_start, layer);
        self.overlay_start += 1;
    }

    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) {
        self.layers.push(overlay);
    }

    /// Removes the lowest regular layer called `name` and detaches it.
    pub fn pop_layer(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let index = self.layers[..self.overlay_start]
            .iter()
            .position(|layer| layer.name() == name)?;
        self.overlay_start -= 1;
        Some(detached(self.layers.remove(index)))
    }

    /// Removes the lowest overlay called `name` and detaches it.
    pub fn pop_overlay(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let index = self.layers[self.overlay_start..]
            .iter()
            .position(|layer| layer.name() == name)?;
        Some(detached(self.layers.remove(self.overlay_start + index)))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names, bottom to top.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.name())
    }

    /// Updates every layer bottom to top, stopping at the first failure.
    pub fn update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        for layer in &mut self.layers {
            layer
                .on_update(ctx)
                .with_context(|| format!("layer `{}` failed to update", layer.name()))?;
        }
        Ok(())
    }

    /// Offers `event` top to bottom. Returns whether a layer handled it.
    pub fn on_event(&mut self, event: &Event) -> bool {
        for layer in self.layers.iter_mut().rev() {
            if layer.on_event(event) {
                log::trace!("{event} handled by layer `{}`", layer.name());
                return true;
            }
        }
        false
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        while let Some(mut layer) = self.layers.pop() {
            layer.on_detach();
        }
    }
}

fn detached(mut layer: Box<dyn Layer>) -> Box<dyn Layer> {
    layer.on_detach();
    layer
}
