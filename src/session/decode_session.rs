use crate::decode::context::DecodeContext;
use crate::decode::demux::{CompressedFrame, Demuxer};
use crate::decode::lzw::LzwDecoder;
use crate::encode::sink::{FrameSink, PlaybackSummary, StreamInfo};
use crate::foundation::error::{GlyphError, GlyphResult};
use crate::playback::clock::{Clock, SystemClock};
use crate::playback::pacer::Pacer;
use crate::render::backend::FrameRGBA;
use crate::render::compositor::Compositor;
use crate::render::glyph::{GlyphMapper, compression_for};
use crate::session::opts::SessionOpts;
use crate::source::ByteSource;

/// Counters for a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames delivered during the decode pass.
    pub frames: u64,
    /// Bytes pulled from the source.
    pub bytes_read: u64,
    /// Completed replay passes.
    pub replay_passes: u32,
}

/// One GIF decode, from first byte to last delivered frame.
///
/// The session owns every pipeline stage and the shared [`DecodeContext`]. Work is strictly
/// sequential: a chunk is pulled from the source only when every frame that can be parsed from
/// the bytes already buffered has gone through the pacer.
pub struct DecodeSession {
    opts: SessionOpts,
    ctx: DecodeContext,
    demux: Demuxer,
    lzw: LzwDecoder,
    compositor: Option<Compositor>,
    mapper: Option<GlyphMapper>,
    pacer: Pacer,
    indices: Vec<u8>,
    started: bool,
    bytes_read: u64,
}

impl DecodeSession {
    /// Session that paces with the system clock.
    pub fn new(opts: SessionOpts) -> GlyphResult<Self> {
        Self::with_clock(opts, Box::new(SystemClock))
    }

    /// Session that paces with `clock`. Fails if `opts` do not validate.
    pub fn with_clock(opts: SessionOpts, clock: Box<dyn Clock>) -> GlyphResult<Self> {
        opts.validate()?;
        let pacer = Pacer::new(clock, opts.pace);
        Ok(Self {
            opts,
            ctx: DecodeContext::new(),
            demux: Demuxer::new(),
            lzw: LzwDecoder::new(),
            compositor: None,
            mapper: None,
            pacer,
            indices: Vec::new(),
            started: false,
            bytes_read: 0,
        })
    }

    /// Shared decode state (header fields, queue counters).
    pub fn context(&self) -> &DecodeContext {
        &self.ctx
    }

    /// Options the session was created with.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Decode the whole stream into `sink`, then replay if enabled.
    ///
    /// On any error the buffered state of every stage is dropped and no further frame reaches
    /// the sink.
    #[tracing::instrument(skip_all)]
    pub fn run(
        &mut self,
        source: &mut dyn ByteSource,
        sink: &mut dyn FrameSink,
    ) -> GlyphResult<SessionStats> {
        match self.run_inner(source, sink) {
            Ok(stats) => Ok(stats),
            Err(err) => {
                tracing::warn!(error = %err, "decode session aborted");
                self.abort();
                Err(err)
            }
        }
    }

    fn run_inner(
        &mut self,
        source: &mut dyn ByteSource,
        sink: &mut dyn FrameSink,
    ) -> GlyphResult<SessionStats> {
        loop {
            self.pump(sink)?;
            if self.demux.is_finished() {
                break;
            }
            match source.next_chunk()? {
                Some(chunk) => {
                    self.bytes_read += chunk.len() as u64;
                    self.demux.feed(&chunk);
                }
                None => {
                    self.demux.finish()?;
                    break;
                }
            }
        }
        if !self.started {
            self.start(sink)?;
        }

        let frames = self.pacer.retained().len() as u64;
        tracing::info!(frames, bytes = self.bytes_read, "decode pass complete");
        let summary = PlaybackSummary {
            delays: self.pacer.delays(),
            loop_count: self.ctx.loop_count,
            comments: self.ctx.comments.clone(),
        };
        sink.complete(&summary)?;

        let replay_passes = if self.opts.replay {
            let loops = self.replay_loops();
            self.pacer.replay(sink, loops)?
        } else {
            0
        };
        sink.end()?;
        Ok(SessionStats {
            frames,
            bytes_read: self.bytes_read,
            replay_passes,
        })
    }

    /// Push every frame that can be completed from the bytes already buffered.
    fn pump(&mut self, sink: &mut dyn FrameSink) -> GlyphResult<()> {
        loop {
            let next = self.demux.next_payload(&mut self.ctx)?;
            if !self.started && self.ctx.header_ready() {
                self.start(sink)?;
            }
            let Some(frame) = next else {
                return Ok(());
            };
            self.process(frame, sink)?;
        }
    }

    fn start(&mut self, sink: &mut dyn FrameSink) -> GlyphResult<()> {
        let compression = self.opts.compression.unwrap_or_else(|| {
            compression_for(self.ctx.width, self.opts.target_width, self.opts.cell_aspect)
        });
        self.ctx.compression = compression;
        let mapper = GlyphMapper::new(&self.opts.gradient, compression.0, compression.1)?;
        let (width, height) = (u32::from(self.ctx.width), u32::from(self.ctx.height));
        let (grid_columns, grid_rows) = mapper.grid_size(width, height);
        tracing::info!(
            width,
            height,
            block_w = compression.0,
            block_h = compression.1,
            grid_columns,
            grid_rows,
            "stream header decoded"
        );
        self.compositor = Some(Compositor::new(self.ctx.width, self.ctx.height));
        self.mapper = Some(mapper);
        self.started = true;
        sink.begin(StreamInfo {
            canvas_width: width,
            canvas_height: height,
            grid_columns,
            grid_rows,
        })
    }

    fn process(&mut self, frame: CompressedFrame, sink: &mut dyn FrameSink) -> GlyphResult<()> {
        let code_size = self.ctx.code_sizes.pop()?;
        self.indices.clear();
        self.lzw
            .decompress_into(&frame.data, code_size, &mut self.indices)?;

        let (Some(compositor), Some(mapper)) = (self.compositor.as_mut(), self.mapper.as_ref())
        else {
            return Err(GlyphError::desync("frame arrived before the stream header"));
        };
        let (width, height) = (compositor.width(), compositor.height());
        let Some(snapshot) = compositor.accept(&mut self.ctx, &self.indices)? else {
            return Err(GlyphError::malformed(format!(
                "frame {} decoded to {} indices, short of its rectangle",
                frame.index.0,
                self.indices.len()
            )));
        };
        let raster = if self.opts.raster {
            Some(FrameRGBA::copy_from(width, height, snapshot)?)
        } else {
            None
        };
        let rows = mapper.render(snapshot, width, height)?;
        tracing::debug!(frame = frame.index.0, indices = self.indices.len(), "frame rendered");

        self.pacer
            .present(&mut self.ctx, frame.index, rows, raster, sink)
    }

    /// Replay passes after the decode pass. `None` repeats until the sink fails.
    fn replay_loops(&self) -> Option<u32> {
        let from_gif = match self.ctx.loop_count {
            Some(0) | None => None,
            Some(n) => Some(u32::from(n)),
        };
        match (from_gif, self.opts.max_loops) {
            (Some(gif), Some(cap)) => Some(gif.min(cap)),
            (gif, cap) => gif.or(cap),
        }
    }

    fn abort(&mut self) {
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.discard_pending();
        }
        self.ctx.discard_pending();
        self.demux = Demuxer::new();
        self.indices.clear();
    }
}

impl std::fmt::Debug for DecodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeSession")
            .field("opts", &self.opts)
            .field("started", &self.started)
            .field("bytes_read", &self.bytes_read)
            .field("frames_demuxed", &self.ctx.frames_demuxed)
            .finish()
    }
}
