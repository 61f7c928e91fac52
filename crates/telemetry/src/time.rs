// Path: crates/telemetry/src/time.rs
use std::time::{Duration, Instant};

/// Logs how long a labelled scope took when it is dropped, on success or failure alike.
pub struct StepTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> StepTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StepTimer<'_> {
    fn drop(&mut self) {
        tracing::debug!(
            target: "timing",
            step = self.label,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            "step finished"
        );
    }
}
