//! Manually advanced ticker
//!
//! Every `TickHandle::tick()` produces exactly one signal and returns only
//! once the coordinator has finished reacting to it. The acknowledgement is
//! sent when the control loop comes back for the next signal (or stops the
//! ticker), which happens strictly after the flush the signal triggered.

use super::Ticker;
use crate::BatcherError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

type Ack = oneshot::Sender<()>;

/// Creates a linked manual ticker and the handle that drives it
pub fn manual() -> (ManualTicker, TickHandle) {
    let (tx, rx) = mpsc::channel(1);
    (
        ManualTicker {
            rx,
            pending_ack: None,
        },
        TickHandle { tx },
    )
}

/// Ticker that only fires when its [`TickHandle`] asks it to
pub struct ManualTicker {
    rx: mpsc::Receiver<Ack>,
    /// Ack for the signal most recently handed to the control loop
    pending_ack: Option<Ack>,
}

impl ManualTicker {
    fn release_pending(&mut self) {
        if let Some(ack) = self.pending_ack.take() {
            let _ = ack.send(());
        }
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    fn start(&mut self, _interval: Duration) {}

    async fn tick(&mut self) -> Option<Instant> {
        // Asking for the next signal means the previous one is fully handled
        self.release_pending();

        let ack = self.rx.recv().await?;
        self.pending_ack = Some(ack);
        Some(Instant::now())
    }

    fn stop(&mut self) {
        self.release_pending();
        self.rx.close();
    }
}

impl Drop for ManualTicker {
    fn drop(&mut self) {
        self.release_pending();
    }
}

/// Test-side control for a [`ManualTicker`]
#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::Sender<Ack>,
}

impl TickHandle {
    /// Fire one signal and wait until the coordinator has consumed it
    ///
    /// # Returns
    /// * `Ok(())` once the flush triggered by this signal has been performed
    /// * `Err(BatcherError::TickerClosed)` if the coordinator stopped before taking the signal
    pub async fn tick(&self) -> Result<(), BatcherError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(ack_tx)
            .await
            .map_err(|_| BatcherError::TickerClosed)?;
        ack_rx.await.map_err(|_| BatcherError::TickerClosed)
    }
}
