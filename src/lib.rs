//! This crate implements micro-batching of an item stream.
//! Items are submitted one at a time, grouped into batches by size or by time,
//! processed concurrently by a caller-supplied processor, and the results are
//! delivered to a caller-supplied handler as they become available.
//!
//! ```no_run
//! use microbatch::{BatchConfig, BatchId, BatchResult, MicroBatcher, handler_fn, processor_fn};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), microbatch::BatcherError> {
//! let processor = processor_fn(|batch: Vec<u32>, _id: BatchId| async move { batch.iter().sum::<u32>() });
//! let handler = handler_fn(|result: BatchResult<u32>| println!("batch {} -> {:?}", result.batch_id, result.outcome));
//!
//! let batcher: MicroBatcher<u32, u32> = MicroBatcher::start(BatchConfig::new(Duration::from_secs(1), 100), processor, handler)?;
//! batcher.submit(1).await?;
//! batcher.submit(2).await?;
//! batcher.stop().await?;
//! batcher.wait_for_results().await?;
//! # Ok(())
//! # }
//! ```

pub mod types; // Batch IDs, results, lifecycle state and errors.
pub mod config; // Defines and loads batching configuration.
pub mod queue; // Buffers submitted items until the next flush.
pub mod ticker; // Time sources that drive interval flushes.
pub mod batch; // Dispatches batches and delivers their results.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::BatchConfig;
pub use batch::{BatchProcessor, MicroBatcher, ResultHandler, handler_fn, processor_fn};
pub use ticker::{IntervalTicker, ManualTicker, TickHandle, Ticker};
