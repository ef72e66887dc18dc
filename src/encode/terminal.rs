use std::io::Write;

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, PlaybackSummary, RenderedFrame, StreamInfo};
use crate::foundation::error::GlyphResult;

const CLEAR_SCREEN: &str = "\x1b[2J";
const CURSOR_HOME: &str = "\x1b[H";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// Draws each frame in place on an ANSI terminal.
///
/// Every frame rewinds the cursor to the top-left corner and overwrites the previous one.
pub struct TerminalSink<W: Write> {
    out: W,
    ansi: bool,
    drawn: u64,
}

impl<W: Write> std::fmt::Debug for TerminalSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSink")
            .field("ansi", &self.ansi)
            .field("drawn", &self.drawn)
            .finish()
    }
}

impl<W: Write> TerminalSink<W> {
    /// Redraw frames in place using ANSI cursor control.
    pub fn new(out: W) -> Self {
        Self {
            out,
            ansi: true,
            drawn: 0,
        }
    }

    /// Print frames one after another without escape sequences, separated by a blank line.
    pub fn plain(out: W) -> Self {
        Self {
            out,
            ansi: false,
            drawn: 0,
        }
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> FrameSink for TerminalSink<W> {
    fn begin(&mut self, _info: StreamInfo) -> GlyphResult<()> {
        if self.ansi {
            write!(self.out, "{HIDE_CURSOR}{CLEAR_SCREEN}").context("clear terminal")?;
        }
        Ok(())
    }

    fn push_frame(&mut self, frame: &RenderedFrame) -> GlyphResult<()> {
        if self.ansi {
            self.out
                .write_all(CURSOR_HOME.as_bytes())
                .context("rewind cursor")?;
        } else if self.drawn > 0 {
            self.out.write_all(b"\n").context("write frame separator")?;
        }
        for row in &frame.text.rows {
            writeln!(self.out, "{row}")
                .with_context(|| format!("write frame {}", frame.index.0))?;
        }
        self.out.flush().context("flush terminal")?;
        self.drawn += 1;
        Ok(())
    }

    fn complete(&mut self, _summary: &PlaybackSummary) -> GlyphResult<()> {
        Ok(())
    }

    fn end(&mut self) -> GlyphResult<()> {
        if self.ansi {
            write!(self.out, "{SHOW_CURSOR}").context("restore cursor")?;
        }
        self.out.flush().context("flush terminal")?;
        Ok(())
    }
}
