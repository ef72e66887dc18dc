//! Byte sources feeding the demultiplexer.

use std::io::Read;
use std::sync::mpsc;

use crate::foundation::error::{GlyphError, GlyphResult};

/// Supplier of GIF bytes in chunks of arbitrary size.
///
/// `Ok(None)` marks the end of the stream; an error is a transport failure that ends the
/// session.
pub trait ByteSource {
    /// Next chunk of bytes, `Ok(None)` once the stream has ended.
    fn next_chunk(&mut self) -> GlyphResult<Option<Vec<u8>>>;
}

/// In-memory bytes handed out in chunks following a repeating size pattern.
#[derive(Clone, Debug)]
pub struct SliceSource {
    bytes: Vec<u8>,
    pos: usize,
    pattern: Vec<usize>,
    turn: usize,
}

impl SliceSource {
    /// Chunks of `chunk_size` bytes (the last one may be shorter).
    pub fn new(bytes: impl Into<Vec<u8>>, chunk_size: usize) -> Self {
        Self::with_pattern(bytes, vec![chunk_size])
    }

    /// Chunks whose sizes cycle through `pattern`. Zero sizes are treated as 1.
    pub fn with_pattern(bytes: impl Into<Vec<u8>>, pattern: Vec<usize>) -> Self {
        let pattern = if pattern.is_empty() {
            vec![usize::MAX]
        } else {
            pattern.into_iter().map(|n| n.max(1)).collect()
        };
        Self {
            bytes: bytes.into(),
            pos: 0,
            pattern,
            turn: 0,
        }
    }
}

impl ByteSource for SliceSource {
    fn next_chunk(&mut self) -> GlyphResult<Option<Vec<u8>>> {
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let size = self.pattern[self.turn % self.pattern.len()];
        self.turn += 1;
        let end = self.pos.saturating_add(size).min(self.bytes.len());
        let chunk = self.bytes[self.pos..end].to_vec();
        self.pos = end;
        Ok(Some(chunk))
    }
}

/// Reads chunks from any [`Read`] implementation (files, sockets, pipes).
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ReaderSource<R> {
    /// Read up to `chunk_size` bytes per call (minimum 1).
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> GlyphResult<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(GlyphError::transport(format!("read failed: {e}"))),
            }
        }
    }
}

/// Message from a producer thread to a [`ChannelSource`].
#[derive(Debug)]
pub enum SourceEvent {
    /// More bytes.
    Chunk(Vec<u8>),
    /// Clean end of stream.
    End,
    /// The producer failed.
    Failed(String),
}

/// Receives chunks pushed by another thread over a bounded channel.
///
/// A producer that hangs up without sending [`SourceEvent::End`] is a transport failure.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<SourceEvent>,
    done: bool,
}

impl ChannelSource {
    /// Create a source and the sender a producer pushes into. `capacity` bounds in-flight chunks.
    pub fn bounded(capacity: usize) -> (mpsc::SyncSender<SourceEvent>, Self) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (tx, Self { rx, done: false })
    }
}

impl ByteSource for ChannelSource {
    fn next_chunk(&mut self) -> GlyphResult<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(SourceEvent::Chunk(bytes)) => Ok(Some(bytes)),
            Ok(SourceEvent::End) => {
                self.done = true;
                Ok(None)
            }
            Ok(SourceEvent::Failed(reason)) => Err(GlyphError::transport(reason)),
            Err(_) => Err(GlyphError::transport(
                "byte source disconnected before end of stream",
            )),
        }
    }
}
