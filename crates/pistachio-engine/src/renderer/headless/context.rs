use anyhow::Result;

use crate::renderer::context::GraphicsContext;

use super::device::{HeadlessDevice, RecordedCommand};

/// Context that "presents" by moving the recorded commands into a frame.
#[derive(Debug)]
pub struct HeadlessContext {
    device: HeadlessDevice,
    size: (u32, u32),
    vsync: bool,
    frames_presented: u64,
    last_frame: Vec<RecordedCommand>,
}

impl HeadlessContext {
    pub fn new(device: HeadlessDevice, width: u32, height: u32) -> Self {
        Self {
            device,
            size: (width, height),
            vsync: true,
            frames_presented: 0,
            last_frame: Vec::new(),
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Commands of the most recently presented frame.
    pub fn last_frame(&self) -> &[RecordedCommand] {
        &self.last_frame
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl GraphicsContext for HeadlessContext {
    fn init(&mut self) -> Result<()> {
        log::info!("headless context {}x{}", self.size.0, self.size.1);
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.last_frame = self.device.take_commands();
        self.frames_presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn is_vsync(&self) -> bool {
        self.vsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Renderer;

    #[test]
    fn swap_moves_recorded_commands_into_the_frame() {
        let device = HeadlessDevice::new();
        let mut renderer = Renderer::headless(device.clone());
        let mut context = HeadlessContext::new(device.clone(), 640, 480);

        renderer.command().clear();
        context.swap_buffers().unwrap();

        assert_eq!(context.frames_presented(), 1);
        assert_eq!(context.last_frame(), [RecordedCommand::Clear]);
        assert!(device.commands().is_empty());

        context.swap_buffers().unwrap();
        assert_eq!(context.frames_presented(), 2);
        assert!(context.last_frame().is_empty());
    }

    #[test]
    fn resize_and_vsync_are_tracked() {
        let mut context = HeadlessContext::new(HeadlessDevice::new(), 640, 480);
        context.resize(1024, 768);
        context.set_vsync(false);
        assert_eq!(context.size(), (1024, 768));
        assert!(!context.is_vsync());
    }
}
