//! Ticker Module
//!
//! This module defines the time source that drives time-based flushes:
//! - IntervalTicker: Fires every flush interval using the tokio clock
//! - ManualTicker: Fires only when a `TickHandle` asks it to (for deterministic tests)
//!
//! Any other scheduling policy can be plugged in by implementing [`Ticker`].

mod interval;
mod manual;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

pub use interval::IntervalTicker;
pub use manual::{ManualTicker, TickHandle, manual};

/// Recurring signal source observed by the coordinator's control loop
///
/// The control loop calls `start` once, then awaits `tick` repeatedly until
/// shutdown, and finally calls `stop`. `tick` must be cancel-safe: the loop
/// drops a pending `tick` future whenever the stop request wins the race.
#[async_trait]
pub trait Ticker: Send + 'static {
    /// Begin emitting a signal every `interval`
    fn start(&mut self, interval: Duration);

    /// Wait for the next signal
    ///
    /// # Returns
    /// * `Some(instant)` when the ticker fires
    /// * `None` when it can never fire again; the coordinator then only waits for stop
    async fn tick(&mut self) -> Option<Instant>;

    /// Stop emitting signals
    fn stop(&mut self);
}
