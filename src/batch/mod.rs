//! Batch Module
//!
//! This module handles batch creation and delivery:
//! - MicroBatcher: Coordinator exposing submit/stop/wait operations
//! - Dispatcher: Drains the queue and launches one task per batch
//! - ResultPump: Delivers finished batches to the result handler

mod batcher;
mod dispatcher;
mod processor;
mod results;

#[cfg(test)]
mod testing;

pub use batcher::MicroBatcher;
pub use processor::{BatchProcessor, HandlerFn, ProcessorFn, ResultHandler, handler_fn, processor_fn};
