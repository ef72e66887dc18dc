use std::ops::Range;

use crate::decode::context::{DecodeContext, FrameMeta, GifVersion};
use crate::foundation::core::{ColorTable, FrameIndex, FrameRect, color_table_bytes};
use crate::foundation::error::{GlyphError, GlyphResult};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const LABEL_GRAPHIC_CONTROL: u8 = 0xF9;
const LABEL_APPLICATION: u8 = 0xFF;
const LABEL_COMMENT: u8 = 0xFE;
const LABEL_PLAIN_TEXT: u8 = 0x01;

/// One frame's LZW payload: the concatenated image data sub-blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedFrame {
    /// Position of the frame in the stream.
    pub index: FrameIndex,
    /// Compressed bytes, without sub-block length prefixes.
    pub data: Vec<u8>,
}

/// Parser position. Every state consumes one complete unit before moving on, so a state is
/// never re-entered for a field that already produced its side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Signature,
    ScreenDescriptor,
    GlobalTable(usize),
    BlockStart,
    ExtensionLabel,
    GraphicControl,
    ApplicationHeader,
    LoopSubBlock,
    Comment(Vec<u8>),
    PlainTextHeader,
    SkipSubBlocks,
    ImageDescriptor,
    LocalTable(usize),
    MinCodeSize,
    ImageData,
    Trailer,
}

enum Step {
    Progress,
    NeedMore,
    Frame(CompressedFrame),
    Trailer,
}

/// Graphic Control Extension values waiting for their image descriptor.
#[derive(Clone, Copy, Debug)]
struct GraphicControl {
    delay: u16,
    transparent_index: Option<u8>,
}

/// Incremental GIF container parser.
///
/// `feed` only buffers bytes; `next_payload` parses as far as the buffer allows and stops after
/// each completed frame, so callers control how far ahead of playback parsing runs.
#[derive(Debug)]
pub struct Demuxer {
    state: State,
    buf: Vec<u8>,
    pos: usize,
    pending_control: Option<GraphicControl>,
    frame: FrameMeta,
    payload: Vec<u8>,
    next_index: u64,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    /// Parser positioned before the GIF signature, with an empty buffer.
    pub fn new() -> Self {
        Self {
            state: State::Signature,
            buf: Vec::new(),
            pos: 0,
            pending_control: None,
            frame: FrameMeta::default(),
            payload: Vec::new(),
            next_index: 0,
        }
    }

    /// Append a chunk of source bytes. Bytes after the trailer are dropped.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.state == State::Trailer {
            return;
        }
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Parse until one frame payload is complete, the buffer runs dry, or the trailer is hit.
    pub fn next_payload(&mut self, ctx: &mut DecodeContext) -> GlyphResult<Option<CompressedFrame>> {
        loop {
            match self.step(ctx)? {
                Step::Progress => {}
                Step::Frame(frame) => return Ok(Some(frame)),
                Step::NeedMore | Step::Trailer => return Ok(None),
            }
        }
    }

    /// `true` once the trailer byte has been read.
    pub fn is_finished(&self) -> bool {
        self.state == State::Trailer
    }

    /// Bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Check that end of stream is acceptable at the current position.
    ///
    /// A missing trailer is tolerated between blocks; anywhere else the stream was truncated.
    pub fn finish(&self) -> GlyphResult<()> {
        match self.state {
            State::Trailer => Ok(()),
            State::BlockStart if self.buffered() == 0 => {
                tracing::warn!("stream ended without a trailer");
                Ok(())
            }
            ref state => Err(GlyphError::malformed(format!(
                "truncated stream: ended in {} with {} unparsed bytes",
                state.describe(),
                self.buffered()
            ))),
        }
    }

    fn step(&mut self, ctx: &mut DecodeContext) -> GlyphResult<Step> {
        match self.state {
            State::Signature => {
                let Some(sig) = self.take_array::<6>() else {
                    return Ok(Step::NeedMore);
                };
                ctx.version = match &sig {
                    b"GIF87a" => GifVersion::Gif87a,
                    b"GIF89a" => GifVersion::Gif89a,
                    _ => {
                        return Err(GlyphError::malformed(format!(
                            "bad signature {:?}",
                            String::from_utf8_lossy(&sig)
                        )));
                    }
                };
                self.state = State::ScreenDescriptor;
            }
            State::ScreenDescriptor => {
                let Some(d) = self.take_array::<7>() else {
                    return Ok(Step::NeedMore);
                };
                ctx.width = u16::from_le_bytes([d[0], d[1]]);
                ctx.height = u16::from_le_bytes([d[2], d[3]]);
                let flags = d[4];
                ctx.background_index = d[5];
                ctx.pixel_aspect_ratio = d[6];
                tracing::debug!(
                    width = ctx.width,
                    height = ctx.height,
                    global_table = flags & 0x80 != 0,
                    "logical screen descriptor"
                );
                if flags & 0x80 != 0 {
                    self.state = State::GlobalTable(color_table_bytes(flags));
                } else {
                    ctx.mark_header_ready();
                    self.state = State::BlockStart;
                }
            }
            State::GlobalTable(len) => {
                let Some(bytes) = self.take_vec(len) else {
                    return Ok(Step::NeedMore);
                };
                ctx.global_color_table = Some(ColorTable::from_packed(&bytes));
                ctx.mark_header_ready();
                self.state = State::BlockStart;
            }
            State::BlockStart => {
                let Some([introducer]) = self.take_array::<1>() else {
                    return Ok(Step::NeedMore);
                };
                self.state = match introducer {
                    EXTENSION_INTRODUCER => State::ExtensionLabel,
                    IMAGE_SEPARATOR => State::ImageDescriptor,
                    TRAILER => {
                        tracing::debug!(frames = ctx.frames_demuxed, "trailer");
                        self.state = State::Trailer;
                        self.buf.clear();
                        self.pos = 0;
                        return Ok(Step::Trailer);
                    }
                    other => {
                        return Err(GlyphError::malformed(format!(
                            "unknown block introducer 0x{other:02X}"
                        )));
                    }
                };
            }
            State::ExtensionLabel => {
                let Some([label]) = self.take_array::<1>() else {
                    return Ok(Step::NeedMore);
                };
                self.state = match label {
                    LABEL_GRAPHIC_CONTROL => State::GraphicControl,
                    LABEL_APPLICATION => State::ApplicationHeader,
                    LABEL_COMMENT => State::Comment(Vec::new()),
                    LABEL_PLAIN_TEXT => State::PlainTextHeader,
                    other => {
                        tracing::debug!(label = other, "skipping unknown extension");
                        State::SkipSubBlocks
                    }
                };
            }
            State::GraphicControl => {
                self.expect_block_len(4, "graphic control extension")?;
                let Some(b) = self.take_array::<6>() else {
                    return Ok(Step::NeedMore);
                };
                if b[5] != 0 {
                    return Err(GlyphError::malformed(
                        "graphic control extension missing block terminator",
                    ));
                }
                let flags = b[1];
                let disposal = (flags >> 2) & 0b111;
                if disposal > 1 {
                    tracing::debug!(disposal, "unsupported disposal method, leaving frame in place");
                }
                let control = GraphicControl {
                    delay: u16::from_le_bytes([b[2], b[3]]),
                    transparent_index: (flags & 1 != 0).then_some(b[4]),
                };
                if self.pending_control.replace(control).is_some() {
                    tracing::warn!("graphic control extension superseded before its image");
                }
                self.state = State::BlockStart;
            }
            State::ApplicationHeader => {
                self.expect_block_len(11, "application extension")?;
                let Some(b) = self.take_array::<12>() else {
                    return Ok(Step::NeedMore);
                };
                let ident = &b[1..12];
                self.state = if ident == b"NETSCAPE2.0" || ident == b"ANIMEXTS1.0" {
                    State::LoopSubBlock
                } else {
                    tracing::debug!(
                        identifier = %String::from_utf8_lossy(ident),
                        "skipping application extension"
                    );
                    State::SkipSubBlocks
                };
            }
            State::LoopSubBlock => {
                self.expect_block_len(3, "loop count sub-block")?;
                let Some(b) = self.take_array::<4>() else {
                    return Ok(Step::NeedMore);
                };
                if b[1] != 1 {
                    return Err(GlyphError::malformed(format!(
                        "loop count sub-block has id {} (expected 1)",
                        b[1]
                    )));
                }
                let loops = u16::from_le_bytes([b[2], b[3]]);
                tracing::debug!(loops, "loop count");
                ctx.loop_count = Some(loops);
                self.state = State::SkipSubBlocks;
            }
            State::Comment(_) => {
                let Some(range) = self.sub_block() else {
                    return Ok(Step::NeedMore);
                };
                let State::Comment(text) = &mut self.state else {
                    unreachable!("state checked above");
                };
                if range.is_empty() {
                    ctx.comments.push(String::from_utf8_lossy(text).into_owned());
                    self.state = State::BlockStart;
                } else {
                    text.extend_from_slice(&self.buf[range]);
                }
            }
            State::PlainTextHeader => {
                self.expect_block_len(12, "plain text extension")?;
                if self.take_array::<13>().is_none() {
                    return Ok(Step::NeedMore);
                }
                self.state = State::SkipSubBlocks;
            }
            State::SkipSubBlocks => {
                let Some(range) = self.sub_block() else {
                    return Ok(Step::NeedMore);
                };
                if range.is_empty() {
                    self.state = State::BlockStart;
                }
            }
            State::ImageDescriptor => {
                let Some(d) = self.take_array::<9>() else {
                    return Ok(Step::NeedMore);
                };
                let rect = FrameRect {
                    left: u16::from_le_bytes([d[0], d[1]]),
                    top: u16::from_le_bytes([d[2], d[3]]),
                    width: u16::from_le_bytes([d[4], d[5]]),
                    height: u16::from_le_bytes([d[6], d[7]]),
                };
                let flags = d[8];
                if flags & 0x40 != 0 {
                    tracing::warn!(
                        frame = self.next_index,
                        "interlaced frame decoded in stored row order"
                    );
                }
                let control = self.pending_control.take();
                self.frame = FrameMeta {
                    delay: control.map_or(0, |c| c.delay),
                    rect,
                    code_size: 0,
                    transparent_index: control.and_then(|c| c.transparent_index),
                    local_color_table: None,
                };
                self.state = if flags & 0x80 != 0 {
                    State::LocalTable(color_table_bytes(flags))
                } else {
                    State::MinCodeSize
                };
            }
            State::LocalTable(len) => {
                let Some(bytes) = self.take_vec(len) else {
                    return Ok(Step::NeedMore);
                };
                self.frame.local_color_table = Some(ColorTable::from_packed(&bytes));
                self.state = State::MinCodeSize;
            }
            State::MinCodeSize => {
                let Some([code_size]) = self.take_array::<1>() else {
                    return Ok(Step::NeedMore);
                };
                self.frame.code_size = code_size;
                self.payload.clear();
                self.state = State::ImageData;
            }
            State::ImageData => {
                let Some(range) = self.sub_block() else {
                    return Ok(Step::NeedMore);
                };
                if !range.is_empty() {
                    self.payload.extend_from_slice(&self.buf[range]);
                    return Ok(Step::Progress);
                }
                let meta = std::mem::take(&mut self.frame);
                tracing::debug!(
                    frame = self.next_index,
                    rect = ?meta.rect,
                    code_size = meta.code_size,
                    delay = meta.delay,
                    payload_len = self.payload.len(),
                    "frame demultiplexed"
                );
                ctx.push_frame(meta);
                let frame = CompressedFrame {
                    index: FrameIndex(self.next_index),
                    data: std::mem::take(&mut self.payload),
                };
                self.next_index += 1;
                self.state = State::BlockStart;
                return Ok(Step::Frame(frame));
            }
            State::Trailer => return Ok(Step::Trailer),
        }
        Ok(Step::Progress)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buf.get(self.pos..self.pos + N)?;
        let out = <[u8; N]>::try_from(bytes).ok()?;
        self.pos += N;
        Some(out)
    }

    fn take_vec(&mut self, n: usize) -> Option<Vec<u8>> {
        let bytes = self.buf.get(self.pos..self.pos + n)?.to_vec();
        self.pos += n;
        Some(bytes)
    }

    /// Consume one length-prefixed sub-block if it is fully buffered, returning the range of its
    /// data in `buf`. An empty range is the block terminator.
    fn sub_block(&mut self) -> Option<Range<usize>> {
        let len = usize::from(*self.buf.get(self.pos)?);
        let start = self.pos + 1;
        if self.buf.len() < start + len {
            return None;
        }
        self.pos = start + len;
        Some(start..start + len)
    }

    /// Reject a fixed-length block as soon as its length byte is visible.
    fn expect_block_len(&self, expected: u8, what: &str) -> GlyphResult<()> {
        match self.buf.get(self.pos) {
            Some(&len) if len != expected => Err(GlyphError::malformed(format!(
                "{what} declares length {len} (expected {expected})"
            ))),
            _ => Ok(()),
        }
    }
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::Signature => "signature",
            State::ScreenDescriptor => "logical screen descriptor",
            State::GlobalTable(_) => "global color table",
            State::BlockStart => "block introducer",
            State::ExtensionLabel => "extension label",
            State::GraphicControl => "graphic control extension",
            State::ApplicationHeader => "application extension",
            State::LoopSubBlock => "loop count sub-block",
            State::Comment(_) => "comment extension",
            State::PlainTextHeader => "plain text extension",
            State::SkipSubBlocks => "extension sub-blocks",
            State::ImageDescriptor => "image descriptor",
            State::LocalTable(_) => "local color table",
            State::MinCodeSize => "minimum code size",
            State::ImageData => "image data",
            State::Trailer => "trailer",
        }
    }
}
