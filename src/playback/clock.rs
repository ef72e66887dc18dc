use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blocking wait primitive used by the pacer.
pub trait Clock: Send {
    /// Block the pipeline for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records requested sleeps without blocking. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingClock {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingClock {
    /// Clock with an empty sleep log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Clock for RecordingClock {
    fn sleep(&mut self, duration: Duration) {
        if let Ok(mut log) = self.slept.lock() {
            log.push(duration);
        }
    }
}
