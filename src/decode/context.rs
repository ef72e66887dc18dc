use std::collections::VecDeque;

use crate::foundation::core::{ColorTable, FrameRect};
use crate::foundation::error::{GlyphError, GlyphResult};

/// FIFO hand-off for one per-frame metadata stream.
///
/// Contract: the demultiplexer pushes exactly one value per frame and exactly one downstream
/// stage pops it, in the same order. Push and pop counts are kept so tests and the session can
/// check the two sides stayed in lockstep.
#[derive(Debug)]
pub struct MetaQueue<T> {
    name: &'static str,
    items: VecDeque<T>,
    pushed: u64,
    popped: u64,
}

impl<T> MetaQueue<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            items: VecDeque::new(),
            pushed: 0,
            popped: 0,
        }
    }

    /// Append one frame's value.
    pub fn push(&mut self, value: T) {
        self.pushed += 1;
        self.items.push_back(value);
    }

    /// Pop the oldest value. An empty queue means a stage ran ahead of the demultiplexer.
    pub fn pop(&mut self) -> GlyphResult<T> {
        let value = self.items.pop_front().ok_or_else(|| {
            GlyphError::desync(format!("{} queue popped while empty", self.name))
        })?;
        self.popped += 1;
        Ok(value)
    }

    /// Values pushed but not yet popped.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when no value is waiting.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total values ever pushed.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Total values ever popped.
    pub fn popped(&self) -> u64 {
        self.popped
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

/// Push/pop totals for all five metadata queues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueBalance {
    /// `(pushed, popped)` for delay times.
    pub delays: (u64, u64),
    /// `(pushed, popped)` for frame rectangles.
    pub positions: (u64, u64),
    /// `(pushed, popped)` for LZW minimum code sizes.
    pub code_sizes: (u64, u64),
    /// `(pushed, popped)` for transparent indices.
    pub transparent: (u64, u64),
    /// `(pushed, popped)` for local color tables.
    pub local_tables: (u64, u64),
}

impl QueueBalance {
    /// Return `true` when every queue was pushed and popped exactly `frames` times.
    pub fn is_balanced(&self, frames: u64) -> bool {
        [
            self.delays,
            self.positions,
            self.code_sizes,
            self.transparent,
            self.local_tables,
        ]
        .iter()
        .all(|&(pushed, popped)| pushed == frames && popped == frames)
    }
}

/// GIF container revision from the signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub enum GifVersion {
    /// `GIF87a`.
    Gif87a,
    /// `GIF89a`.
    #[default]
    Gif89a,
}

/// Session-lifetime state shared by the pipeline stages.
///
/// Created at session start and dropped at session end. Header fields are filled by the
/// demultiplexer; the queues carry per-frame metadata from the demultiplexer to the stage that
/// consumes it (code sizes to the LZW decoder, rect/transparency/local table to the compositor,
/// delays to the pacer).
#[derive(Debug)]
pub struct DecodeContext {
    /// Container revision from the signature.
    pub version: GifVersion,
    /// Logical screen width in pixels.
    pub width: u16,
    /// Logical screen height in pixels.
    pub height: u16,
    /// Background color index from the screen descriptor.
    pub background_index: u8,
    /// Raw pixel aspect ratio byte.
    pub pixel_aspect_ratio: u8,
    /// Global color table, if the screen descriptor declared one.
    pub global_color_table: Option<ColorTable>,
    /// Netscape loop count; `Some(0)` loops forever, `None` when the stream carries none.
    pub loop_count: Option<u16>,
    /// Comment extension texts, one per extension.
    pub comments: Vec<String>,
    /// Downsample block size `(width, height)`, set once the header is known.
    pub compression: (u32, u32),
    /// Frames fully demultiplexed so far.
    pub frames_demuxed: u64,
    header_ready: bool,

    /// Per-frame delays, consumed by the pacer.
    pub delays: MetaQueue<u16>,
    /// Per-frame rectangles, consumed by the compositor.
    pub positions: MetaQueue<FrameRect>,
    /// Per-frame LZW minimum code sizes, consumed by the decompressor.
    pub code_sizes: MetaQueue<u8>,
    /// Per-frame transparent indices, consumed by the compositor.
    pub transparent: MetaQueue<Option<u8>>,
    /// Per-frame local color tables, consumed by the compositor.
    pub local_tables: MetaQueue<Option<ColorTable>>,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeContext {
    /// Empty context: zeroed header and empty queues.
    pub fn new() -> Self {
        Self {
            version: GifVersion::default(),
            width: 0,
            height: 0,
            background_index: 0,
            pixel_aspect_ratio: 0,
            global_color_table: None,
            loop_count: None,
            comments: Vec::new(),
            compression: (1, 1),
            frames_demuxed: 0,
            header_ready: false,
            delays: MetaQueue::new("delay"),
            positions: MetaQueue::new("position"),
            code_sizes: MetaQueue::new("code size"),
            transparent: MetaQueue::new("transparent index"),
            local_tables: MetaQueue::new("local color table"),
        }
    }

    /// `true` once the logical screen descriptor (and global table, if any) has been parsed.
    pub fn header_ready(&self) -> bool {
        self.header_ready
    }

    pub(crate) fn mark_header_ready(&mut self) {
        self.header_ready = true;
    }

    /// Push all per-frame metadata for one frame in a single step.
    pub(crate) fn push_frame(&mut self, meta: FrameMeta) {
        self.delays.push(meta.delay);
        self.positions.push(meta.rect);
        self.code_sizes.push(meta.code_size);
        self.transparent.push(meta.transparent_index);
        self.local_tables.push(meta.local_color_table);
        self.frames_demuxed += 1;
    }

    /// Push/pop totals of every queue.
    pub fn queue_balance(&self) -> QueueBalance {
        QueueBalance {
            delays: (self.delays.pushed(), self.delays.popped()),
            positions: (self.positions.pushed(), self.positions.popped()),
            code_sizes: (self.code_sizes.pushed(), self.code_sizes.popped()),
            transparent: (self.transparent.pushed(), self.transparent.popped()),
            local_tables: (self.local_tables.pushed(), self.local_tables.popped()),
        }
    }

    /// Drop queued metadata that no stage will consume (cancellation path).
    pub(crate) fn discard_pending(&mut self) {
        self.delays.clear();
        self.positions.clear();
        self.code_sizes.clear();
        self.transparent.clear();
        self.local_tables.clear();
    }
}

/// Metadata for one frame as assembled by the demultiplexer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FrameMeta {
    pub delay: u16,
    pub rect: FrameRect,
    pub code_size: u8,
    pub transparent_index: Option<u8>,
    pub local_color_table: Option<ColorTable>,
}
