use std::path::Path;
use std::rc::Rc;

use crate::error::RenderError;

use super::headless::HeadlessTexture2D;
use super::wgpu_backend::WgpuTexture2D;
use super::{Renderer, RendererApi};

/// Number of texture slots a backend exposes.
pub const MAX_TEXTURE_SLOTS: usize = 8;

/// Decoded pixel data handed to texture construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Channel count of `pixels` (3 = RGB, 4 = RGBA).
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decodes an image file.
    ///
    /// Images with an alpha channel keep four channels; everything else is
    /// converted to RGB.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| RenderError::TextureDecode {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = (decoded.width(), decoded.height());
        let image = if decoded.color().has_alpha() {
            Self {
                width,
                height,
                channels: 4,
                pixels: decoded.into_rgba8().into_raw(),
            }
        } else {
            Self {
                width,
                height,
                channels: 3,
                pixels: decoded.into_rgb8().into_raw(),
            }
        };
        image.validate()?;
        Ok(image)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidImage(format!(
                "zero-sized image {}x{}",
                self.width, self.height
            )));
        }
        if !matches!(self.channels, 3 | 4) {
            return Err(RenderError::InvalidImage(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        let expected = self.width as usize * self.height as usize * self.channels as usize;
        if self.pixels.len() != expected {
            return Err(RenderError::InvalidImage(format!(
                "expected {expected} bytes, got {}",
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Pixel data expanded to RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.channels {
            4 => self.pixels.clone(),
            _ => self
                .pixels
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
        }
    }
}

/// Base texture contract.
pub trait Texture {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Binds the texture to `slot` for subsequent draws.
    fn bind(&self, slot: u32);
}

/// Two-dimensional texture.
pub trait Texture2D: Texture {}

/// Creates a texture from an image file.
pub fn create_texture_2d(
    renderer: &Renderer,
    path: impl AsRef<Path>,
) -> Result<Rc<dyn Texture2D>, RenderError> {
    let path = path.as_ref();
    if renderer.api() == RendererApi::None {
        return Err(RenderError::UnsupportedApi(RendererApi::None));
    }
    log::debug!("loading texture {}", path.display());
    let image = ImageData::load(path)?;
    create_texture_2d_from_image(renderer, &image)
}

/// Creates a texture from already decoded pixels.
pub fn create_texture_2d_from_image(
    renderer: &Renderer,
    image: &ImageData,
) -> Result<Rc<dyn Texture2D>, RenderError> {
    match renderer.api() {
        RendererApi::None => Err(RenderError::UnsupportedApi(RendererApi::None)),
        RendererApi::Headless => {
            image.validate()?;
            Ok(Rc::new(HeadlessTexture2D::new(
                renderer.headless_device()?,
                image,
            )))
        }
        RendererApi::Wgpu => {
            image.validate()?;
            Ok(Rc::new(WgpuTexture2D::new(renderer.wgpu_device()?, image)))
        }
    }
}
