//! Micro-Batcher Module
//!
//! This module implements the coordinator that connects the queue, the
//! dispatcher, the ticker and the result stream. It runs a background loop
//! that flushes pending items on every tick and drains in-flight work on stop.
//!
//! # Lifecycle
//! 1. `Running`: flush on each tick; `submit` flushes when the batch is full
//! 2. `Stopping`: stop the ticker, flush the remainder, wait for in-flight batches
//! 3. `Stopped`: result stream closed, `wait_for_results` returns

use crate::{
    BatchConfig, BatchId, BatcherError, BatcherState, SubmitError,
    batch::{
        BatchProcessor, ResultHandler,
        dispatcher::{Dispatcher, FlushTrigger},
        results::ResultPump,
    },
    ticker::{IntervalTicker, Ticker},
};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

struct Shared<T, R> {
    dispatcher: Arc<Dispatcher<T, R>>,
    /// One-shot stop request; taken by the first `stop()`
    stop: Mutex<Option<oneshot::Sender<()>>>,
    state: watch::Receiver<BatcherState>,
    results: Mutex<ResultPump<R>>,
}

/// Handle to a running micro-batcher
///
/// Cloning the handle is cheap; all clones drive the same coordinator.
/// Dropping every clone without calling `stop` still drains pending work,
/// but the results are discarded.
pub struct MicroBatcher<T, R> {
    shared: Arc<Shared<T, R>>,
}

impl<T, R> Clone for MicroBatcher<T, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, R> MicroBatcher<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Start a micro-batcher that flushes on a real-time interval
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Flush interval and maximum batch size
    /// * `processor` - Called with each batch, on its own task
    /// * `handler` - Called with each result while results are being pumped
    ///
    /// # Returns
    /// * `Ok(MicroBatcher)` with the control loop running
    /// * `Err(BatcherError::InvalidConfig)` if the configuration is out of range
    pub fn start<P, H>(config: BatchConfig, processor: P, handler: H) -> Result<Self, BatcherError>
    where
        P: BatchProcessor<T, R>,
        H: ResultHandler<R>,
    {
        Self::start_with_ticker(config, processor, handler, IntervalTicker::new())
    }

    /// Start a micro-batcher driven by the given ticker
    ///
    /// Use a `ManualTicker` for deterministic tests, or any custom `Ticker`
    /// for a different scheduling policy.
    pub fn start_with_ticker<P, H, K>(
        config: BatchConfig,
        processor: P,
        handler: H,
        ticker: K,
    ) -> Result<Self, BatcherError>
    where
        P: BatchProcessor<T, R>,
        H: ResultHandler<R>,
        K: Ticker,
    {
        config.validate()?;

        info!(
            "Micro-batcher starting: max_batch_size={}, flush_interval={:?}",
            config.max_batch_size, config.flush_interval
        );

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(BatcherState::Running);

        let dispatcher = Arc::new(Dispatcher::new(
            config.max_batch_size,
            Arc::new(processor),
            results_tx,
        ));

        tokio::spawn(control_loop(
            Arc::clone(&dispatcher),
            ticker,
            config.flush_interval,
            stop_rx,
            state_tx,
        ));

        Ok(Self {
            shared: Arc::new(Shared {
                dispatcher,
                stop: Mutex::new(Some(stop_tx)),
                state: state_rx,
                results: Mutex::new(ResultPump::new(results_rx, Box::new(handler))),
            }),
        })
    }

    /// Submit one item to be batched
    ///
    /// Waits only briefly on the dispatch and queue locks, never on batch
    /// processing. Dispatches the batch immediately if this item fills it.
    ///
    /// # Returns
    /// * `Ok(())` once the item is queued (or already dispatched)
    /// * `Err(SubmitError(item))` if shutdown has already taken the final batch
    pub async fn submit(&self, item: T) -> Result<(), SubmitError<T>> {
        match self.shared.dispatcher.submit(item).await {
            Ok(_) => Ok(()),
            Err(item) => {
                warn!("Item submitted after shutdown; rejecting");
                Err(SubmitError(item))
            }
        }
    }

    /// Begin graceful shutdown
    ///
    /// Returns once the request is sent; use `wait_for_results` to wait for
    /// the remaining batches.
    ///
    /// # Returns
    /// * `Err(BatcherError::AlreadyStopped)` if stop was already requested
    pub async fn stop(&self) -> Result<(), BatcherError> {
        let stop = self
            .shared
            .stop
            .lock()
            .await
            .take()
            .ok_or(BatcherError::AlreadyStopped)?;

        // The control loop only goes away after a stop request or a dropped handle
        stop.send(()).map_err(|_| BatcherError::Stopped)
    }

    /// Send every result to the `ResultHandler` until shutdown completes
    ///
    /// Blocks until `stop()` has been called and every in-flight batch has
    /// been delivered.
    pub async fn wait_for_results(&self) -> Result<(), BatcherError> {
        self.shared.results.lock().await.run_to_end().await
    }

    /// Pump results until the given batch has been delivered
    ///
    /// Results for other batches that arrive first are delivered to the
    /// handler as usual. Useful for forcing a completion order in tests.
    ///
    /// # Returns
    /// * `Err(BatcherError::ResultsClosed)` if shutdown completes before the batch is seen
    pub async fn wait_for_batch(&self, batch_id: BatchId) -> Result<(), BatcherError> {
        self.shared.results.lock().await.run_until(batch_id).await
    }

    pub fn state(&self) -> BatcherState {
        *self.shared.state.borrow()
    }

    /// Number of batches dispatched so far
    pub async fn batches_dispatched(&self) -> u64 {
        self.shared.dispatcher.batches_dispatched().await
    }

    /// Number of items waiting for the next flush
    pub async fn pending(&self) -> usize {
        self.shared.dispatcher.queue().len().await
    }
}

/// The coordinator's background loop
///
/// Multiplexes ticker signals and the stop request, then runs the
/// `Stopping` sequence exactly once.
async fn control_loop<T, R, K>(
    dispatcher: Arc<Dispatcher<T, R>>,
    mut ticker: K,
    interval: std::time::Duration,
    mut stop: oneshot::Receiver<()>,
    state: watch::Sender<BatcherState>,
) where
    T: Send + 'static,
    R: Send + 'static,
    K: Ticker,
{
    ticker.start(interval);
    let mut ticking = true;

    loop {
        tokio::select! {
            tick = ticker.tick(), if ticking => match tick {
                Some(_) => {
                    dispatcher.flush(FlushTrigger::Tick).await;
                }
                None => {
                    debug!("Ticker exhausted; only size and shutdown flushes remain");
                    ticking = false;
                }
            },
            request = &mut stop => {
                if request.is_err() {
                    debug!("All handles dropped without stop; shutting down");
                }
                break;
            }
        }
    }

    state.send_replace(BatcherState::Stopping);
    info!("Micro-batcher stopping");

    ticker.stop();

    // Send remaining items, then wait for every batch to report back
    dispatcher.flush(FlushTrigger::Shutdown).await;
    dispatcher.wait_idle().await;

    state.send_replace(BatcherState::Stopped);
    // This unblocks wait_for_results
    dispatcher.close_results().await;

    info!(
        "Micro-batcher stopped after {} batches",
        dispatcher.batches_dispatched().await
    );
}
