use anyhow::Result;

/// Owns the drawing surface and presents finished frames.
pub trait GraphicsContext {
    fn init(&mut self) -> Result<()>;

    /// Presents everything recorded since the previous call.
    fn swap_buffers(&mut self) -> Result<()>;

    /// Resizes the drawable, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    fn set_vsync(&mut self, enabled: bool);

    fn is_vsync(&self) -> bool;
}
