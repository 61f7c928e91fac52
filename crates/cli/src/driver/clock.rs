// Path: crates/cli/src/driver/clock.rs

use dao_types::DriverError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time, read whenever a step needs "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Time since the Unix epoch; a clock set before 1970 is a configuration error.
    fn since_epoch(&self) -> Result<Duration, DriverError> {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DriverError::Config(format!("clock is before the Unix epoch: {e}")))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
