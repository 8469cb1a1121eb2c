use std::time::Duration;

use tracing::trace;

/// Drops pose results arriving faster than a minimum interval.
///
/// Uses the stream timestamps carried by each result, so replaying a
/// recording behaves the same as a live camera.
#[derive(Debug, Clone)]
pub struct FrameGate {
    min_interval: Duration,
    last_accepted_at: Option<Duration>,
}

impl FrameGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted_at: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns true and records `timestamp` if enough time has passed since
    /// the last accepted frame. The first frame is always accepted.
    pub fn accept(&mut self, timestamp: Duration) -> bool {
        if let Some(last) = self.last_accepted_at {
            // Out-of-order timestamps never pass
            let elapsed = match timestamp.checked_sub(last) {
                Some(d) => d,
                None => {
                    trace!(?timestamp, ?last, "frame dropped: timestamp went backwards");
                    return false;
                }
            };
            if elapsed < self.min_interval {
                trace!(?elapsed, "frame dropped by gate");
                return false;
            }
        }
        self.last_accepted_at = Some(timestamp);
        true
    }

    pub fn reset(&mut self) {
        self.last_accepted_at = None;
    }
}
