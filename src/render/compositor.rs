use crate::decode::context::DecodeContext;
use crate::foundation::core::{ColorTable, FrameRect, Rgb};
use crate::foundation::error::{GlyphError, GlyphResult};

/// Per-frame metadata popped when the first index bytes of a frame arrive.
#[derive(Debug)]
struct PendingFrame {
    rect: FrameRect,
    transparent_index: Option<u8>,
    local_color_table: Option<ColorTable>,
    indices: Vec<u8>,
}

/// Resolves palette indices into a persistent RGBA canvas.
///
/// The canvas is allocated once per session. Pixels a frame does not write (outside its
/// rectangle, or transparent) keep the previous frame's color, which is GIF disposal method 1.
#[derive(Debug)]
pub struct Compositor {
    width: u32,
    height: u32,
    canvas: Vec<u8>,
    pending: Option<PendingFrame>,
}

impl Compositor {
    /// Allocate a transparent-black canvas of `width x height` pixels.
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (u32::from(width), u32::from(height));
        Self {
            width,
            height,
            canvas: vec![0; (width as usize) * (height as usize) * 4],
            pending: None,
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current canvas contents.
    pub fn canvas(&self) -> &[u8] {
        &self.canvas
    }

    /// Index bytes still missing for the frame being assembled, if one is in progress.
    pub fn missing(&self) -> Option<usize> {
        self.pending
            .as_ref()
            .map(|p| p.rect.area() - p.indices.len())
    }

    /// Forget a partially assembled frame. Its metadata has already been popped.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Add index bytes for the current frame.
    ///
    /// The first call for a frame pops its rectangle, transparent index and local color table.
    /// Returns the full canvas once the frame's `width * height` indices have arrived; the
    /// snapshot borrows the live buffer and must be consumed before the next call.
    pub fn accept(&mut self, ctx: &mut DecodeContext, piece: &[u8]) -> GlyphResult<Option<&[u8]>> {
        if self.pending.is_none() {
            let rect = ctx.positions.pop()?;
            let transparent_index = ctx.transparent.pop()?;
            let local_color_table = ctx.local_tables.pop()?;
            self.pending = Some(PendingFrame {
                rect,
                transparent_index,
                local_color_table,
                // The declared rectangle is untrusted; grow with the data actually received.
                indices: Vec::with_capacity(rect.area().min(piece.len())),
            });
        }
        let Some(pending) = self.pending.as_mut() else {
            return Ok(None);
        };

        let expected = pending.rect.area();
        let have = pending.indices.len() + piece.len();
        if have > expected {
            self.pending = None;
            return Err(GlyphError::overrun(format!(
                "frame data is {have} indices, rectangle holds {expected}"
            )));
        }
        pending.indices.extend_from_slice(piece);
        if have < expected {
            return Ok(None);
        }

        let Some(frame) = self.pending.take() else {
            return Ok(None);
        };
        let table = frame
            .local_color_table
            .as_ref()
            .or(ctx.global_color_table.as_ref());
        self.paint(&frame, table);
        Ok(Some(&self.canvas))
    }

    fn paint(&mut self, frame: &PendingFrame, table: Option<&ColorTable>) {
        let rect = frame.rect;
        let frame_w = usize::from(rect.width);
        if frame_w == 0 {
            return;
        }
        for (row, line) in frame.indices.chunks_exact(frame_w).enumerate() {
            let y = u32::from(rect.top) + row as u32;
            if y >= self.height {
                break;
            }
            for (col, &index) in line.iter().enumerate() {
                if frame.transparent_index == Some(index) {
                    continue;
                }
                let x = u32::from(rect.left) + col as u32;
                if x >= self.width {
                    break;
                }
                let Rgb { r, g, b } = table.and_then(|t| t.get(index)).unwrap_or_default();
                let at = ((y * self.width + x) as usize) * 4;
                self.canvas[at..at + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }
    }
}
