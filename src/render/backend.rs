use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::error::{GlyphError, GlyphResult};

/// Owned straight-alpha RGBA8 copy of a canvas snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Copy a borrowed canvas snapshot so the compositor can keep reusing its buffer.
    pub fn copy_from(width: u32, height: u32, rgba: &[u8]) -> GlyphResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(GlyphError::validation(format!(
                "snapshot is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data: rgba.to_vec(),
        })
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.data.get(i..i + 4)?.try_into().ok()
    }

    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> GlyphResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| GlyphError::validation("raster dimensions do not match its data"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(buf)
    }
}
