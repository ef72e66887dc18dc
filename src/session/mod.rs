//! Decode sessions and their options.

/// The pipeline driver.
pub mod decode_session;
/// Session options.
pub mod opts;
