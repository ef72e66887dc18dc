//! glyphgif decodes animated GIFs from a byte stream and plays them back as character art.
//!
//! The pipeline is pull-driven and single-threaded:
//!
//! - a [`ByteSource`] supplies chunks of any size
//! - the demultiplexer parses container blocks and queues per-frame metadata in a
//!   [`DecodeContext`]
//! - the LZW decoder expands each frame payload into palette indices
//! - the compositor paints them onto a persistent RGBA canvas
//! - the glyph mapper downsamples the canvas into a grid of glyphs
//! - the pacer hands each frame to a [`FrameSink`] and waits out its delay
//!
//! [`DecodeSession`] owns all of it.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Container parsing and LZW decompression.
pub mod decode;
/// Frame sinks.
pub mod encode;
/// Delay pacing and replay.
pub mod playback;
/// Compositing and glyph rendering.
pub mod render;
/// Session-oriented decode API.
pub mod session;
/// Byte sources.
pub mod source;

pub use crate::foundation::core::{ColorTable, FrameIndex, FrameRect, Rgb};
pub use crate::foundation::error::{GlyphError, GlyphResult};

pub use crate::decode::context::{DecodeContext, GifVersion, MetaQueue, QueueBalance};
pub use crate::decode::demux::{CompressedFrame, Demuxer};
pub use crate::decode::lzw::{CodeTrace, LzwDecoder, compress};
pub use crate::encode::directory::DirectorySink;
pub use crate::encode::sink::{
    FrameSink, InMemorySink, PlaybackSummary, RenderedFrame, StreamInfo,
};
pub use crate::encode::terminal::TerminalSink;
pub use crate::playback::clock::{Clock, RecordingClock, SystemClock};
pub use crate::playback::pacer::{Pacer, delay_duration};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::compositor::Compositor;
pub use crate::render::glyph::{
    CharacterFrame, DEFAULT_GRADIENT, GlyphMapper, compression_for, luma,
};
pub use crate::session::decode_session::{DecodeSession, SessionStats};
pub use crate::session::opts::SessionOpts;
pub use crate::source::{ByteSource, ChannelSource, ReaderSource, SliceSource, SourceEvent};
