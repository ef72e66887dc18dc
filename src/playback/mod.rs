//! Delay pacing and replay.

/// Sleep abstraction.
pub mod clock;
/// Ordered frame delivery with delays.
pub mod pacer;
