use crate::foundation::core::FrameIndex;
use crate::foundation::error::GlyphResult;
use crate::render::backend::FrameRGBA;
use crate::render::glyph::CharacterFrame;

/// Stream facts handed to a [`FrameSink`] once the GIF header has been parsed.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StreamInfo {
    /// Logical screen width in pixels.
    pub canvas_width: u32,
    /// Logical screen height in pixels.
    pub canvas_height: u32,
    /// Glyph columns per frame.
    pub grid_columns: u32,
    /// Glyph rows per frame.
    pub grid_rows: u32,
}

/// One finished frame as delivered to a sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Frame position in the GIF.
    pub index: FrameIndex,
    /// 0 for the decode pass, 1.. for replays of retained frames.
    pub pass: u32,
    /// Character-art rendering plus display delay.
    pub text: CharacterFrame,
    /// Full-canvas raster copy, when raster output is enabled.
    pub raster: Option<FrameRGBA>,
}

/// Summary made available once every frame of the stream has been decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PlaybackSummary {
    /// Per-frame delays in hundredths of a second, in frame order.
    pub delays: Vec<u16>,
    /// Netscape loop count, if the GIF carried one (`0` loops forever).
    pub loop_count: Option<u16>,
    /// Comment extension texts.
    pub comments: Vec<String>,
}

/// Sink contract for consuming frames in stream order.
///
/// Call order: `begin` once, `push_frame` per frame, `complete` once after the decode pass,
/// optionally more `push_frame` calls for replays, then `end`. An error from any method ends the
/// session.
pub trait FrameSink: Send {
    /// Called once the header is known, before any frame.
    fn begin(&mut self, info: StreamInfo) -> GlyphResult<()>;
    /// Push one frame. The frame is only borrowed; copy what must outlive the call.
    fn push_frame(&mut self, frame: &RenderedFrame) -> GlyphResult<()>;
    /// Called once after the last decoded frame with the ordered delays.
    fn complete(&mut self, summary: &PlaybackSummary) -> GlyphResult<()>;
    /// Called once when the session finishes.
    fn end(&mut self) -> GlyphResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    info: Option<StreamInfo>,
    /// Frames in delivery order, replays included.
    pub(crate) frames: Vec<RenderedFrame>,
    summary: Option<PlaybackSummary>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream info captured in `begin`, if any.
    pub fn info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[RenderedFrame] {
        &self.frames
    }

    /// Summary captured in `complete`, if any.
    pub fn summary(&self) -> Option<&PlaybackSummary> {
        self.summary.as_ref()
    }

    /// `true` once `end` was called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, info: StreamInfo) -> GlyphResult<()> {
        self.info = Some(info);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, frame: &RenderedFrame) -> GlyphResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn complete(&mut self, summary: &PlaybackSummary) -> GlyphResult<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }

    fn end(&mut self) -> GlyphResult<()> {
        self.ended = true;
        Ok(())
    }
}
