//! Luma conversion, block downsampling and glyph mapping.

use crate::foundation::error::{GlyphError, GlyphResult};

/// Gradient used when none is configured, lightest to darkest.
pub const DEFAULT_GRADIENT: &str = " .,:;irsXA253hMHGS#9B&@";

/// A text rendering of one frame: equal-length rows of glyphs plus the frame's display delay.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CharacterFrame {
    /// Glyph rows, top to bottom.
    pub rows: Vec<String>,
    /// Display time in hundredths of a second.
    pub delay: u16,
}

impl CharacterFrame {
    /// Rows joined by line breaks.
    pub fn text(&self) -> String {
        self.rows.join("\n")
    }

    /// Grid size as `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (
            self.rows.first().map_or(0, |r| r.chars().count()),
            self.rows.len(),
        )
    }
}

/// ITU-R BT.601 luma, `round(0.299 R + 0.587 G + 0.114 B)` in integer thousandths.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Converts RGBA snapshots into glyph grids.
#[derive(Clone, Debug)]
pub struct GlyphMapper {
    gradient: Vec<char>,
    block_w: u32,
    block_h: u32,
}

impl GlyphMapper {
    /// `gradient` must hold at least two glyphs; block sizes must be non-zero.
    pub fn new(gradient: &str, block_w: u32, block_h: u32) -> GlyphResult<Self> {
        let gradient: Vec<char> = gradient.chars().collect();
        if gradient.len() < 2 {
            return Err(GlyphError::validation(
                "glyph gradient must contain at least 2 glyphs",
            ));
        }
        if block_w == 0 || block_h == 0 {
            return Err(GlyphError::validation(
                "compression factors must be non-zero",
            ));
        }
        Ok(Self {
            gradient,
            block_w,
            block_h,
        })
    }

    /// Block size `(width, height)`.
    pub fn block(&self) -> (u32, u32) {
        (self.block_w, self.block_h)
    }

    /// Output grid `(columns, rows)` for a canvas; partial blocks are dropped.
    pub fn grid_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width / self.block_w, height / self.block_h)
    }

    /// Glyph for an averaged luma value.
    pub fn glyph(&self, value: u8) -> char {
        let last = (self.gradient.len() - 1) as u32;
        // round(value / 255 * last), half up, in integers.
        let idx = (u32::from(value) * last * 2 + 255) / (2 * 255);
        self.gradient[idx as usize]
    }

    /// Single-channel luma plane of an RGBA buffer.
    pub fn luma_plane(rgba: &[u8]) -> Vec<u8> {
        rgba.chunks_exact(4).map(|p| luma(p[0], p[1], p[2])).collect()
    }

    /// Average non-overlapping blocks of a luma plane, row-major.
    pub fn downsample(&self, luma: &[u8], width: u32, height: u32) -> Vec<u8> {
        let (cols, rows) = self.grid_size(width, height);
        let count = self.block_w * self.block_h;
        let stride = width as usize;
        let mut out = Vec::with_capacity((cols * rows) as usize);
        for by in 0..rows {
            for bx in 0..cols {
                let mut sum = 0u32;
                for y in by * self.block_h..(by + 1) * self.block_h {
                    let row = y as usize * stride;
                    let x0 = (bx * self.block_w) as usize;
                    sum += luma[row + x0..row + x0 + self.block_w as usize]
                        .iter()
                        .map(|&v| u32::from(v))
                        .sum::<u32>();
                }
                out.push((sum / count) as u8);
            }
        }
        out
    }

    /// Render a full-canvas RGBA snapshot into glyph rows.
    pub fn render(&self, rgba: &[u8], width: u32, height: u32) -> GlyphResult<Vec<String>> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(GlyphError::validation(format!(
                "snapshot is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            )));
        }
        let (cols, _) = self.grid_size(width, height);
        let luma = Self::luma_plane(rgba);
        let blocks = self.downsample(&luma, width, height);
        if cols == 0 {
            return Ok(Vec::new());
        }
        Ok(blocks
            .chunks_exact(cols as usize)
            .map(|row| row.iter().map(|&v| self.glyph(v)).collect())
            .collect())
    }
}

/// Block size for a canvas so the grid is about `target_width` columns wide.
///
/// `cell_aspect` is the height/width ratio of one output glyph cell.
pub fn compression_for(canvas_width: u16, target_width: u32, cell_aspect: f32) -> (u32, u32) {
    let wf = (u32::from(canvas_width) / target_width.max(1)).max(1);
    let hf = ((wf as f32) * cell_aspect).round().max(1.0) as u32;
    (wf, hf)
}
