use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

/// Invokes a callback on a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Calls `callback` once per period, the first time one period from now.
    ///
    /// A tick that fires while the callback is still running is delayed
    /// rather than queued. Returns the first error of `callback`.
    pub async fn run<F, Fut, E>(&self, mut callback: F) -> Result<(), E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            debug!(period_secs = self.period.as_secs(), "scheduled refresh");
            callback().await?;
        }
    }
}
