//! Result Pump Module
//!
//! Feeds completed batches to the caller's `ResultHandler`, one at a time,
//! until the coordinator closes the result stream.

use crate::{BatchId, BatchResult, BatcherError, batch::ResultHandler};
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::debug;

/// Batch IDs whose results have been handed to the handler
///
/// Stored as a contiguous low-water mark plus the sparse IDs above it, so a
/// long-running coordinator does not keep one entry per batch.
#[derive(Debug)]
struct ObservedBatches {
    /// Every ID below this has been observed
    below: u64,
    /// Observed IDs at or above `below`
    sparse: BTreeSet<u64>,
}

impl ObservedBatches {
    fn new() -> Self {
        Self {
            below: BatchId::FIRST.get(),
            sparse: BTreeSet::new(),
        }
    }

    fn insert(&mut self, batch_id: BatchId) {
        if batch_id.get() < self.below {
            return;
        }
        self.sparse.insert(batch_id.get());
        while self.sparse.remove(&self.below) {
            self.below += 1;
        }
    }

    fn contains(&self, batch_id: BatchId) -> bool {
        batch_id.get() < self.below || self.sparse.contains(&batch_id.get())
    }
}

/// Single reader of the result stream
pub struct ResultPump<R> {
    results: mpsc::UnboundedReceiver<BatchResult<R>>,
    handler: Box<dyn ResultHandler<R>>,
    observed: ObservedBatches,
    /// The stream has returned `None`; nothing more will arrive
    closed: bool,
}

impl<R> ResultPump<R>
where
    R: Send + 'static,
{
    pub fn new(
        results: mpsc::UnboundedReceiver<BatchResult<R>>,
        handler: Box<dyn ResultHandler<R>>,
    ) -> Self {
        Self {
            results,
            handler,
            observed: ObservedBatches::new(),
            closed: false,
        }
    }

    /// Receive one result and hand it to the handler
    ///
    /// Returns the batch ID handled, or `None` once the stream is closed.
    async fn pump_one(&mut self) -> Option<BatchId> {
        if self.closed {
            return None;
        }
        match self.results.recv().await {
            Some(result) => {
                let batch_id = result.batch_id;
                self.handler.handle(result).await;
                self.observed.insert(batch_id);
                Some(batch_id)
            }
            None => {
                debug!("Result stream closed");
                self.closed = true;
                None
            }
        }
    }

    /// Deliver results until the coordinator closes the stream
    ///
    /// # Returns
    /// * `Ok(())` after the last result has been handled
    /// * `Err(BatcherError::ResultsAlreadyDrained)` if an earlier call already saw the end
    pub async fn run_to_end(&mut self) -> Result<(), BatcherError> {
        if self.closed {
            return Err(BatcherError::ResultsAlreadyDrained);
        }
        while self.pump_one().await.is_some() {}
        Ok(())
    }

    /// Deliver results until `batch_id` has been handled
    ///
    /// Returns immediately if it was handled by an earlier pump.
    pub async fn run_until(&mut self, batch_id: BatchId) -> Result<(), BatcherError> {
        while !self.observed.contains(batch_id) {
            if self.pump_one().await.is_none() {
                return Err(BatcherError::ResultsClosed { batch_id });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_batches_compacts_contiguous_ids() {
        let mut observed = ObservedBatches::new();
        observed.insert(BatchId(2));
        observed.insert(BatchId(4));
        assert!(!observed.contains(BatchId(1)));
        assert!(observed.contains(BatchId(2)));

        observed.insert(BatchId(1));
        assert_eq!(observed.below, 3);
        assert_eq!(observed.sparse.len(), 1);

        observed.insert(BatchId(3));
        assert_eq!(observed.below, 5);
        assert!(observed.sparse.is_empty());
        assert!(observed.contains(BatchId(4)));
        assert!(!observed.contains(BatchId(5)));
    }
}
