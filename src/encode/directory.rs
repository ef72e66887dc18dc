use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, PlaybackSummary, RenderedFrame, StreamInfo};
use crate::foundation::error::{GlyphError, GlyphResult};

/// Writes decoded frames to a directory.
///
/// Layout:
/// - `frame_00000.txt`: glyph rows of each frame
/// - `frame_00000.png`: raster snapshot, when the session attaches one
/// - `timeline.json`: stream info, ordered delays, loop count and comments
///
/// Replayed frames are identical to the decode pass and are not written again.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    info: Option<StreamInfo>,
    written: u64,
}

#[derive(serde::Serialize)]
struct Timeline<'a> {
    info: &'a StreamInfo,
    frames: u64,
    #[serde(flatten)]
    summary: &'a PlaybackSummary,
}

impl DirectorySink {
    /// Sink writing under `root`, created on `begin`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            info: None,
            written: 0,
        }
    }

    /// Output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the text file for frame `index`.
    pub fn text_path(&self, index: u64) -> PathBuf {
        self.root.join(format!("frame_{index:05}.txt"))
    }

    /// Path of the PNG file for frame `index`.
    pub fn png_path(&self, index: u64) -> PathBuf {
        self.root.join(format!("frame_{index:05}.png"))
    }

    /// Path of the JSON timeline written on `complete`.
    pub fn timeline_path(&self) -> PathBuf {
        self.root.join("timeline.json")
    }
}

impl FrameSink for DirectorySink {
    fn begin(&mut self, info: StreamInfo) -> GlyphResult<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create output dir '{}'", self.root.display()))?;
        self.info = Some(info);
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &RenderedFrame) -> GlyphResult<()> {
        if frame.pass > 0 {
            return Ok(());
        }
        let index = frame.index.0;
        let mut text = frame.text.text();
        text.push('\n');
        let path = self.text_path(index);
        std::fs::write(&path, text).with_context(|| format!("write '{}'", path.display()))?;

        if let Some(raster) = &frame.raster {
            let png = raster.encode_png()?;
            let path = self.png_path(index);
            std::fs::write(&path, png).with_context(|| format!("write '{}'", path.display()))?;
        }
        self.written += 1;
        Ok(())
    }

    fn complete(&mut self, summary: &PlaybackSummary) -> GlyphResult<()> {
        let Some(info) = self.info.as_ref() else {
            return Err(GlyphError::validation(
                "directory sink completed before begin",
            ));
        };
        let timeline = Timeline {
            info,
            frames: self.written,
            summary,
        };
        let json = serde_json::to_vec_pretty(&timeline).context("serialize timeline")?;
        let path = self.timeline_path();
        std::fs::write(&path, json).with_context(|| format!("write '{}'", path.display()))?;
        tracing::info!(frames = self.written, dir = %self.root.display(), "frames exported");
        Ok(())
    }

    fn end(&mut self) -> GlyphResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::FrameIndex;
    use crate::render::backend::FrameRGBA;
    use crate::render::glyph::CharacterFrame;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("glyphgif_directory_sink")
            .join(format!("{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn writes_text_png_and_timeline() {
        let dir = scratch_dir("basic");
        let mut sink = DirectorySink::new(&dir);
        sink.begin(StreamInfo {
            canvas_width: 1,
            canvas_height: 1,
            grid_columns: 1,
            grid_rows: 1,
        })
        .unwrap();
        let mut frame = RenderedFrame {
            index: FrameIndex(0),
            pass: 0,
            text: CharacterFrame {
                rows: vec!["@".into()],
                delay: 7,
            },
            raster: Some(FrameRGBA::copy_from(1, 1, &[255, 255, 255, 255]).unwrap()),
        };
        sink.push_frame(&frame).unwrap();
        frame.pass = 1;
        frame.raster = None;
        frame.text.rows = vec![" ".into()];
        sink.push_frame(&frame).unwrap();
        sink.complete(&PlaybackSummary {
            delays: vec![7],
            loop_count: Some(0),
            comments: vec!["hi".into()],
        })
        .unwrap();
        sink.end().unwrap();

        assert_eq!(std::fs::read_to_string(sink.text_path(0)).unwrap(), "@\n");
        let png = std::fs::read(sink.png_path(0)).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let timeline: serde_json::Value =
            serde_json::from_slice(&std::fs::read(sink.timeline_path()).unwrap()).unwrap();
        assert_eq!(timeline["frames"], 1);
        assert_eq!(timeline["delays"], serde_json::json!([7]));
        assert_eq!(timeline["loop_count"], 0);
        assert_eq!(timeline["info"]["grid_columns"], 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn complete_without_begin_is_rejected() {
        let mut sink = DirectorySink::new(scratch_dir("unbegun"));
        assert!(sink.complete(&PlaybackSummary::default()).is_err());
    }
}
