//! Batch Processing Capabilities
//!
//! The two pluggable behaviours of a `MicroBatcher`:
//! - `BatchProcessor`: turns one batch of items into an outcome
//! - `ResultHandler`: receives each outcome, one at a time
//!
//! Both are generic over the item and outcome types, so mismatched
//! processors and handlers are rejected at compile time. Plain closures can
//! be used through [`processor_fn`] and [`handler_fn`].

use crate::{BatchId, BatchResult};
use async_trait::async_trait;
use std::future::Future;

/// Called with each batch of items.
///
/// Each batch runs on its own tokio task, so several calls may be in flight
/// at once; share state accordingly. A processor that never completes will
/// hold shutdown open indefinitely.
#[async_trait]
pub trait BatchProcessor<T, R>: Send + Sync + 'static
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Process one non-empty batch, in submission order
    ///
    /// # Arguments
    /// * `batch` - The items taken from the queue by one flush
    /// * `batch_id` - Identifier assigned to this batch, for correlation
    ///
    /// # Returns
    /// The outcome forwarded verbatim to the result handler. Domain errors
    /// belong inside `R`.
    async fn process(&self, batch: Vec<T>, batch_id: BatchId) -> R;
}

/// Called after each batch finishes processing.
///
/// Runs on whichever task is pumping results (`wait_for_results` or
/// `wait_for_batch`), never concurrently with itself.
#[async_trait]
pub trait ResultHandler<R>: Send + 'static
where
    R: Send + 'static,
{
    async fn handle(&mut self, result: BatchResult<R>);
}

/// Adapter returned by [`processor_fn`]
pub struct ProcessorFn<F>(F);

/// Use an async closure `Fn(Vec<T>, BatchId) -> impl Future<Output = R>` as a processor
pub fn processor_fn<F>(f: F) -> ProcessorFn<F> {
    ProcessorFn(f)
}

#[async_trait]
impl<T, R, F, Fut> BatchProcessor<T, R> for ProcessorFn<F>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(Vec<T>, BatchId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    async fn process(&self, batch: Vec<T>, batch_id: BatchId) -> R {
        (self.0)(batch, batch_id).await
    }
}

/// Adapter returned by [`handler_fn`]
pub struct HandlerFn<F>(F);

/// Use a synchronous `FnMut(BatchResult<R>)` closure as a result handler
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<R, F> ResultHandler<R> for HandlerFn<F>
where
    R: Send + 'static,
    F: FnMut(BatchResult<R>) + Send + 'static,
{
    async fn handle(&mut self, result: BatchResult<R>) {
        (self.0)(result)
    }
}
