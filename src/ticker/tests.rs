//! Tests for the ticker implementations

use super::{IntervalTicker, Ticker, manual};
use crate::BatcherError;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_interval_ticker_waits_a_full_period_before_first_tick() {
    let mut ticker = IntervalTicker::new();
    let started = Instant::now();
    ticker.start(Duration::from_millis(100));

    let first = ticker.tick().await.unwrap();
    let second = ticker.tick().await.unwrap();

    assert!(first - started >= Duration::from_millis(100));
    assert!(second - first >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_interval_ticker_is_silent_when_stopped() {
    let mut ticker = IntervalTicker::new();
    assert!(ticker.tick().await.is_none());

    ticker.start(Duration::from_millis(10));
    ticker.stop();
    assert!(ticker.tick().await.is_none());
}

#[tokio::test]
async fn test_manual_tick_is_acknowledged_when_next_signal_requested() {
    let (mut ticker, handle) = manual();
    ticker.start(Duration::from_secs(3600));

    let driver = tokio::spawn(async move {
        handle.tick().await.unwrap();
        handle.tick().await.unwrap();
    });

    // First signal received, its ack released by the second call
    assert!(ticker.tick().await.is_some());
    assert!(ticker.tick().await.is_some());
    // The second ack is released by stop
    ticker.stop();

    driver.await.unwrap();
}

#[tokio::test]
async fn test_manual_tick_fails_without_a_listener() {
    let (ticker, handle) = manual();
    drop(ticker);

    assert_eq!(handle.tick().await, Err(BatcherError::TickerClosed));
}

#[tokio::test]
async fn test_manual_ticker_ends_when_handles_dropped() {
    let (mut ticker, handle) = manual();
    drop(handle);

    assert!(ticker.tick().await.is_none());
}
