use chrono::Utc;
use std::time::Duration;

/// Source of "now" as time since the Unix epoch
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        Duration::from_millis(Utc::now().timestamp_millis().max(0) as u64)
    }
}
