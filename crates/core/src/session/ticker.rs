use std::time::Duration;

use log::debug;
use tokio::time::{self, Interval, MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic redraw timer. Only exists while the video is playing; dropping it
/// is how the timer is cancelled.
pub struct RedrawTicker {
    interval: Interval,
}

impl RedrawTicker {
    pub fn start(every: Duration) -> Self {
        let every = every.max(MIN_PERIOD);
        debug!("Starting redraw ticker every {}ms", every.as_millis());
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Resolve on the next tick, or never when there is no ticker.
    pub async fn tick(ticker: &mut Option<Self>) {
        match ticker {
            Some(ticker) => {
                ticker.interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Drop for RedrawTicker {
    fn drop(&mut self) {
        debug!("Redraw ticker stopped");
    }
}
