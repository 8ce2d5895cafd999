//! Artificial latency injection.

use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::rules::DelayRange;

impl DelayRange {
    /// Pick the delay for one response. With a `max` above `min` the value
    /// is drawn uniformly from `[min, max)`, otherwise `min` is used as-is.
    pub fn pick_ms(&self) -> u64 {
        match self.max {
            Some(max) if max > self.min => rand::thread_rng().gen_range(self.min..max),
            _ => self.min,
        }
    }
}

/// Sleep for the configured delay, if any. The random draw happens before
/// the await point so the future stays `Send` without holding RNG state.
pub async fn apply_delay(delay: Option<&DelayRange>) {
    let Some(delay) = delay else {
        return;
    };
    let millis = delay.pick_ms();
    if millis == 0 {
        return;
    }
    debug!("Delaying response by {millis}ms");
    sleep(Duration::from_millis(millis)).await;
}
