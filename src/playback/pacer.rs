use std::time::Duration;

use crate::decode::context::DecodeContext;
use crate::encode::sink::{FrameSink, RenderedFrame};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::GlyphResult;
use crate::playback::clock::Clock;
use crate::render::backend::FrameRGBA;
use crate::render::glyph::CharacterFrame;

/// GIF delays are in hundredths of a second.
pub fn delay_duration(delay: u16) -> Duration {
    Duration::from_millis(u64::from(delay) * 10)
}

/// Final stage: hands frames to the sink, then holds the pipeline for the frame's delay.
///
/// Every delivered frame is retained so the animation can be replayed without redecoding.
pub struct Pacer {
    clock: Box<dyn Clock>,
    pace: bool,
    retained: Vec<RenderedFrame>,
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("pace", &self.pace)
            .field("retained", &self.retained.len())
            .finish()
    }
}

impl Pacer {
    /// With `pace == false` frames are forwarded back to back.
    pub fn new(clock: Box<dyn Clock>, pace: bool) -> Self {
        Self {
            clock,
            pace,
            retained: Vec::new(),
        }
    }

    /// Pop the frame's delay, deliver it, retain it, then wait out the delay.
    pub fn present(
        &mut self,
        ctx: &mut DecodeContext,
        index: FrameIndex,
        rows: Vec<String>,
        raster: Option<FrameRGBA>,
        sink: &mut dyn FrameSink,
    ) -> GlyphResult<()> {
        let delay = ctx.delays.pop()?;
        let frame = RenderedFrame {
            index,
            pass: 0,
            text: CharacterFrame { rows, delay },
            raster,
        };
        sink.push_frame(&frame)?;
        self.retained.push(frame);
        self.wait(delay);
        Ok(())
    }

    /// Frames delivered during the decode pass, in order.
    pub fn retained(&self) -> &[RenderedFrame] {
        &self.retained
    }

    /// Ordered per-frame delays of the retained frames.
    pub fn delays(&self) -> Vec<u16> {
        self.retained.iter().map(|f| f.text.delay).collect()
    }

    /// Replay the retained frames `loops` more times (`None` repeats until the sink fails).
    ///
    /// Returns the number of completed passes.
    pub fn replay(&mut self, sink: &mut dyn FrameSink, loops: Option<u32>) -> GlyphResult<u32> {
        if self.retained.is_empty() {
            return Ok(0);
        }
        let mut pass = 0u32;
        while loops.is_none_or(|n| pass < n) {
            pass += 1;
            tracing::debug!(pass, frames = self.retained.len(), "replaying");
            for i in 0..self.retained.len() {
                let frame = &mut self.retained[i];
                frame.pass = pass;
                sink.push_frame(frame)?;
                let delay = frame.text.delay;
                self.wait(delay);
            }
        }
        Ok(pass)
    }

    fn wait(&mut self, delay: u16) {
        if self.pace {
            self.clock.sleep(delay_duration(delay));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::context::FrameMeta;
    use crate::encode::sink::InMemorySink;
    use crate::playback::clock::RecordingClock;

    fn ctx_with_delays(delays: &[u16]) -> DecodeContext {
        let mut ctx = DecodeContext::new();
        for &delay in delays {
            ctx.push_frame(FrameMeta {
                delay,
                ..FrameMeta::default()
            });
        }
        ctx
    }

    #[test]
    fn sleeps_ten_ms_per_delay_unit_after_delivery() {
        let clock = RecordingClock::new();
        let mut pacer = Pacer::new(Box::new(clock.clone()), true);
        let mut ctx = ctx_with_delays(&[5, 0, 12]);
        let mut sink = InMemorySink::new();
        for i in 0..3 {
            pacer
                .present(&mut ctx, FrameIndex(i), vec!["x".into()], None, &mut sink)
                .unwrap();
            assert_eq!(sink.frames().len() as u64, i + 1);
        }
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_millis(50),
                Duration::ZERO,
                Duration::from_millis(120)
            ]
        );
        assert_eq!(pacer.delays(), vec![5, 0, 12]);
        assert_eq!(ctx.delays.popped(), 3);
    }

    #[test]
    fn unpaced_never_sleeps() {
        let clock = RecordingClock::new();
        let mut pacer = Pacer::new(Box::new(clock.clone()), false);
        let mut ctx = ctx_with_delays(&[9]);
        let mut sink = InMemorySink::new();
        pacer
            .present(&mut ctx, FrameIndex(0), vec![], None, &mut sink)
            .unwrap();
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn replay_repeats_retained_frames_with_same_delays() {
        let clock = RecordingClock::new();
        let mut pacer = Pacer::new(Box::new(clock.clone()), true);
        let mut ctx = ctx_with_delays(&[2, 3]);
        let mut sink = InMemorySink::new();
        pacer
            .present(&mut ctx, FrameIndex(0), vec!["a".into()], None, &mut sink)
            .unwrap();
        pacer
            .present(&mut ctx, FrameIndex(1), vec!["b".into()], None, &mut sink)
            .unwrap();

        assert_eq!(pacer.replay(&mut sink, Some(2)).unwrap(), 2);
        let seen: Vec<(u64, u32, &str)> = sink
            .frames()
            .iter()
            .map(|f| (f.index.0, f.pass, f.text.rows[0].as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![
                (0, 0, "a"),
                (1, 0, "b"),
                (0, 1, "a"),
                (1, 1, "b"),
                (0, 2, "a"),
                (1, 2, "b")
            ]
        );
        assert_eq!(clock.sleeps().len(), 6);
        assert_eq!(clock.sleeps()[5], Duration::from_millis(30));
    }

    #[test]
    fn replay_without_frames_returns_immediately() {
        let mut pacer = Pacer::new(Box::new(RecordingClock::new()), true);
        let mut sink = InMemorySink::new();
        assert_eq!(pacer.replay(&mut sink, None).unwrap(), 0);
    }

    #[test]
    fn missing_delay_is_desync() {
        let mut pacer = Pacer::new(Box::new(RecordingClock::new()), true);
        let mut ctx = DecodeContext::new();
        let mut sink = InMemorySink::new();
        assert!(
            pacer
                .present(&mut ctx, FrameIndex(0), vec![], None, &mut sink)
                .is_err()
        );
        assert!(sink.frames().is_empty());
    }
}
