//! Minimum-interval gate for outbound requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Lets at most one caller through per interval; later callers sleep until
/// their slot. There is no queue beyond the mutex and no backpressure.
pub struct MinIntervalGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the interval since the previous pass has elapsed
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
