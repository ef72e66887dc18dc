//! Frame sinks.
//!
//! Sinks consume rendered frames in stream order and are driven by `DecodeSession::run`.

/// Directory export (text, PNG and a JSON timeline).
pub mod directory;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
/// In-place ANSI terminal playback.
pub mod terminal;
