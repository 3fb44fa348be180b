//! Batch Dispatcher Module
//!
//! This module is responsible for turning pending items into dispatched batches.
//! Each batch is assigned a unique sequential ID and processed on its own task.
//!
//! # Flush Steps
//! 1. Take the dispatch lock (serializes submits, ticks and shutdown)
//! 2. Drain the pending queue; an empty drain is a no-op
//! 3. Assign the next batch ID and bump the in-flight count
//! 4. Spawn a task that runs the processor and pushes the result
//!
//! Submits push under the same lock, so a size-triggered batch never holds
//! more than `max_batch_size` items. The lock is released as soon as the
//! task is spawned, so batch processing itself always runs in parallel.

use crate::{
    BatchId, BatchResult, ProcessorPanic,
    batch::BatchProcessor,
    queue::PendingQueue,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info};

/// What caused a flush. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushTrigger {
    /// The queue reached `max_batch_size` during a submit
    Size,
    /// The ticker fired
    Tick,
    /// Final flush during shutdown; closes the queue
    Shutdown,
}

/// Bookkeeping mutated only under the dispatch lock
struct DispatchState<R> {
    /// Next batch ID to assign (starts at 1, increments for each batch)
    next_batch_id: BatchId,
    /// Sender side of the result stream; `None` once the stream is closed
    results: Option<mpsc::UnboundedSender<BatchResult<R>>>,
}

/// Decrements the in-flight count when a dispatch task ends, even by panic
struct InFlightGuard(Arc<watch::Sender<usize>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

/// Batch dispatcher
///
/// Owns the pending queue and launches one processing task per non-empty flush.
pub(crate) struct Dispatcher<T, R> {
    /// Items submitted but not yet part of a batch
    queue: PendingQueue<T>,
    /// Queue length that triggers an immediate flush
    max_batch_size: usize,
    /// Caller-supplied batch processor, shared with every dispatch task
    processor: Arc<dyn BatchProcessor<T, R>>,
    /// Dispatch-serializing lock around ID assignment and the result sender
    state: Mutex<DispatchState<R>>,
    /// Number of batches whose result has not been pushed yet
    in_flight: Arc<watch::Sender<usize>>,
}

impl<T, R> Dispatcher<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Creates a new dispatcher
    ///
    /// # Arguments
    /// * `max_batch_size` - Queue length that triggers a flush during submit
    /// * `processor` - Processor invoked once per batch
    /// * `results` - Sender side of the result stream
    pub(crate) fn new(
        max_batch_size: usize,
        processor: Arc<dyn BatchProcessor<T, R>>,
        results: mpsc::UnboundedSender<BatchResult<R>>,
    ) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            queue: PendingQueue::new(),
            max_batch_size,
            processor,
            state: Mutex::new(DispatchState {
                next_batch_id: BatchId::FIRST,
                results: Some(results),
            }),
            in_flight: Arc::new(in_flight),
        }
    }

    pub(crate) fn queue(&self) -> &PendingQueue<T> {
        &self.queue
    }

    /// Queue one item, dispatching the batch if it is now full
    ///
    /// The push, the length check and the drain all happen under the
    /// dispatch lock, so no other submit can grow the batch in between.
    ///
    /// # Returns
    /// * `Ok(Some(batch_id))` if this item completed a batch
    /// * `Ok(None)` if the item is waiting for a later flush
    /// * `Err(item)` handing the item back if shutdown closed the queue
    pub(crate) async fn submit(&self, item: T) -> Result<Option<BatchId>, T> {
        let mut state = self.state.lock().await;

        let len = self.queue.push(item).await?;
        if len < self.max_batch_size {
            return Ok(None);
        }

        let batch = self.queue.drain().await;
        Ok(self.dispatch(&mut state, batch, FlushTrigger::Size))
    }

    /// Drain the queue and dispatch whatever was pending as one batch
    ///
    /// # Arguments
    /// * `trigger` - What caused this flush; `Shutdown` also closes the queue
    ///
    /// # Returns
    /// * `Some(batch_id)` if a batch was dispatched
    /// * `None` if nothing was pending
    pub(crate) async fn flush(&self, trigger: FlushTrigger) -> Option<BatchId> {
        // Lock order is always dispatch state, then queue
        let mut state = self.state.lock().await;

        let batch = match trigger {
            FlushTrigger::Shutdown => self.queue.close_and_drain().await,
            FlushTrigger::Size | FlushTrigger::Tick => self.queue.drain().await,
        };

        self.dispatch(&mut state, batch, trigger)
    }

    /// Assign an ID to a drained batch and spawn its processing task
    ///
    /// Only called with the dispatch lock held.
    fn dispatch(
        &self,
        state: &mut DispatchState<R>,
        batch: Vec<T>,
        trigger: FlushTrigger,
    ) -> Option<BatchId> {
        if batch.is_empty() {
            debug!(?trigger, "No pending items to flush");
            return None;
        }

        let Some(results) = state.results.clone() else {
            // The stream only closes after the shutdown flush has closed the queue
            error!(?trigger, "Result stream closed with {} items still pending", batch.len());
            return None;
        };

        let batch_id = state.next_batch_id;
        state.next_batch_id = batch_id.next();
        self.in_flight.send_modify(|n| *n += 1);

        info!("Batch {} created with {} items ({:?} trigger)", batch_id, batch.len(), trigger);

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let processor = Arc::clone(&self.processor);
        tokio::spawn(async move {
            let _guard = guard;

            let outcome = AssertUnwindSafe(processor.process(batch, batch_id))
                .catch_unwind()
                .await
                .map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    error!("Processor panicked on batch {}: {}", batch_id, message);
                    ProcessorPanic { batch_id, message }
                });

            if results.send(BatchResult { batch_id, outcome }).is_err() {
                debug!("Result receiver dropped; discarding result of batch {}", batch_id);
            }
        });

        Some(batch_id)
    }

    /// Wait until every dispatched batch has pushed its result
    pub(crate) async fn wait_idle(&self) {
        let mut in_flight = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this only returns once idle
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }

    /// Drop the dispatcher's sender; the stream ends once every task's clone is gone
    pub(crate) async fn close_results(&self) {
        self.state.lock().await.results = None;
    }

    /// Number of batches dispatched so far
    pub(crate) async fn batches_dispatched(&self) -> u64 {
        self.state.lock().await.next_batch_id.get() - BatchId::FIRST.get()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
