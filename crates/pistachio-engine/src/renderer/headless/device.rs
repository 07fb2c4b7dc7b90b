use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec4;

use crate::renderer::shader::UniformValue;
use crate::renderer::texture::MAX_TEXTURE_SLOTS;

/// Identity of a headless resource, unique for the process lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A draw as seen by the headless backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Name of the bound shader.
    pub shader: Option<String>,
    /// Snapshot of the bound shader's uniforms at draw time.
    pub uniforms: HashMap<String, UniformValue>,
    pub vertex_array: Option<ResourceId>,
    pub index_count: u32,
    pub textures: [Option<ResourceId>; MAX_TEXTURE_SLOTS],
}

/// Backend command recorded in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    SetViewport {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    SetClearColor(Vec4),
    Clear,
    DrawIndexed(DrawCall),
}

#[derive(Debug)]
pub(crate) struct ShaderState {
    pub(crate) name: String,
    pub(crate) uniforms: RefCell<HashMap<String, UniformValue>>,
}

#[derive(Debug, Default)]
pub(crate) struct DeviceState {
    pub(crate) bound_shader: Option<Rc<ShaderState>>,
    pub(crate) bound_vertex_array: Option<ResourceId>,
    pub(crate) bound_vertex_buffer: Option<ResourceId>,
    pub(crate) bound_index_buffer: Option<ResourceId>,
    pub(crate) textures: [Option<ResourceId>; MAX_TEXTURE_SLOTS],
    pub(crate) commands: Vec<RecordedCommand>,
    shaders: Vec<Weak<ShaderState>>,
}

/// Shared state of the headless backend.
///
/// Resources write their bind state here; the backend snapshots it into
/// [`RecordedCommand`]s. Cloning yields another handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDevice {
    state: Rc<RefCell<DeviceState>>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`take_commands`](Self::take_commands).
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.state.borrow().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::DrawIndexed(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current uniform values of the live shader named `name`.
    pub fn uniforms_of(&self, name: &str) -> Option<HashMap<String, UniformValue>> {
        self.state
            .borrow()
            .shaders
            .iter()
            .filter_map(Weak::upgrade)
            .find(|s| s.name == name)
            .map(|s| s.uniforms.borrow().clone())
    }

    pub(crate) fn state(&self) -> RefMut<'_, DeviceState> {
        self.state.borrow_mut()
    }

    pub(crate) fn register_shader(&self, name: &str) -> Rc<ShaderState> {
        let shader = Rc::new(ShaderState {
            name: name.to_string(),
            uniforms: RefCell::new(HashMap::new()),
        });
        let mut state = self.state.borrow_mut();
        state.shaders.retain(|s| s.strong_count() > 0);
        state.shaders.push(Rc::downgrade(&shader));
        shader
    }

    pub(crate) fn record(&self, command: RecordedCommand) {
        self.state.borrow_mut().commands.push(command);
    }
}
