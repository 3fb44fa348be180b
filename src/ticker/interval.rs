use super::Ticker;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Ticker backed by `tokio::time::Interval`. This is usually what we want.
///
/// The first signal arrives one full interval after `start`, not immediately.
#[derive(Default)]
pub struct IntervalTicker {
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self { interval: None }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    fn start(&mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        // A slow flush delays the schedule instead of bursting missed ticks
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    async fn tick(&mut self) -> Option<Instant> {
        match self.interval.as_mut() {
            Some(interval) => Some(interval.tick().await),
            None => None,
        }
    }

    fn stop(&mut self) {
        self.interval = None;
    }
}
