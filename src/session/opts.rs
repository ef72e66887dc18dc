use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{GlyphError, GlyphResult};
use crate::render::glyph::DEFAULT_GRADIENT;

/// Tunables for a [`DecodeSession`](crate::DecodeSession).
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOpts {
    /// Desired glyph columns; drives the horizontal compression factor.
    pub target_width: u32,
    /// Glyphs ordered lightest to darkest, at least two.
    pub gradient: String,
    /// Height/width ratio of one glyph cell, used to derive the vertical factor.
    pub cell_aspect: f32,
    /// Explicit `(width, height)` block size; overrides `target_width` and `cell_aspect`.
    pub compression: Option<(u32, u32)>,
    /// Replay retained frames after the decode pass.
    pub replay: bool,
    /// Upper bound on replay passes. `None` follows the GIF loop count.
    ///
    /// A loop count of 0 means forever, and so does a stream without a NETSCAPE2.0 or
    /// ANIMEXTS1.0 loop extension. With `replay` set and no `max_loops`, such a stream replays
    /// until the sink returns an error.
    pub max_loops: Option<u32>,
    /// Attach a full-canvas RGBA copy to every frame.
    pub raster: bool,
    /// Hold the pipeline for each frame's delay. Disable for export.
    pub pace: bool,
    /// Read size used by reader-backed sources.
    pub chunk_size: usize,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            target_width: 80,
            gradient: DEFAULT_GRADIENT.to_string(),
            cell_aspect: 2.0,
            compression: None,
            replay: false,
            max_loops: None,
            raster: false,
            pace: true,
            chunk_size: 4096,
        }
    }
}

impl SessionOpts {
    /// Parse options from a JSON document.
    pub fn from_json(text: &str) -> GlyphResult<Self> {
        let opts: Self = serde_json::from_str(text)
            .map_err(|e| GlyphError::validation(format!("invalid options json: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> GlyphResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read options '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Reject zero sizes, gradients shorter than two glyphs and non-positive aspect ratios.
    pub fn validate(&self) -> GlyphResult<()> {
        if self.target_width == 0 {
            return Err(GlyphError::validation("target_width must be > 0"));
        }
        if self.gradient.chars().count() < 2 {
            return Err(GlyphError::validation(
                "gradient must contain at least 2 glyphs",
            ));
        }
        if !(self.cell_aspect.is_finite() && self.cell_aspect > 0.0) {
            return Err(GlyphError::validation("cell_aspect must be finite and > 0"));
        }
        if let Some((w, h)) = self.compression {
            if w == 0 || h == 0 {
                return Err(GlyphError::validation("compression factors must be > 0"));
            }
        }
        if self.chunk_size == 0 {
            return Err(GlyphError::validation("chunk_size must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SessionOpts::default().validate().unwrap();
    }

    #[test]
    fn json_fills_missing_fields() {
        let opts = SessionOpts::from_json(r#"{"target_width": 40, "replay": true}"#).unwrap();
        assert_eq!(opts.target_width, 40);
        assert!(opts.replay);
        assert_eq!(opts.gradient, DEFAULT_GRADIENT);
        assert!(opts.pace);
    }

    #[test]
    fn json_rejects_unknown_and_invalid() {
        assert!(SessionOpts::from_json(r#"{"width": 40}"#).is_err());
        assert!(SessionOpts::from_json(r##"{"gradient": "#"}"##).is_err());
        assert!(SessionOpts::from_json(r#"{"compression": [0, 2]}"#).is_err());
    }
}
