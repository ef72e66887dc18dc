//! Canvas compositing and glyph rendering.

/// Raster frame type and PNG encoding.
pub mod backend;
/// Palette-index compositing onto the persistent canvas.
pub mod compositor;
/// Luma, block downsampling and glyph mapping.
pub mod glyph;
