//! Container parsing and LZW decompression.

/// Header fields and per-frame metadata queues.
pub mod context;
/// Resumable container parser.
pub mod demux;
/// Variable-width LZW decoder and encoder.
pub mod lzw;
