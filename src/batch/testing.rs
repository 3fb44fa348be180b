//! Fakes shared by the batch tests

use crate::{
    BatchId, BatchResult,
    batch::{BatchProcessor, ResultHandler},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const SOME_RESULT: &str = "some result";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Lets a test decide when each batch is allowed to finish
#[derive(Default)]
pub struct BatchGate {
    gates: Mutex<HashMap<BatchId, Arc<Notify>>>,
}

impl BatchGate {
    fn gate(&self, batch_id: BatchId) -> Arc<Notify> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(gates.entry(batch_id).or_default())
    }

    /// Allow `batch_id` to finish; may be called before the batch starts
    pub fn release(&self, batch_id: BatchId) {
        self.gate(batch_id).notify_one();
    }

    async fn wait(&self, batch_id: BatchId) {
        self.gate(batch_id).notified().await;
    }
}

/// Records every batch it is called with and returns `SOME_RESULT`
#[derive(Clone, Default)]
pub struct FakeBatchProcessor {
    calls: Arc<Mutex<Vec<(BatchId, Vec<i32>)>>>,
    gate: Option<Arc<BatchGate>>,
}

impl FakeBatchProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A processor whose batches block until released through the gate
    pub fn gated() -> (Self, Arc<BatchGate>) {
        let gate = Arc::new(BatchGate::default());
        let processor = Self {
            calls: Arc::default(),
            gate: Some(Arc::clone(&gate)),
        };
        (processor, gate)
    }

    /// Batches in the order they were dispatched
    pub fn calls(&self) -> Vec<Vec<i32>> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|(batch_id, _)| *batch_id);
        calls.into_iter().map(|(_, batch)| batch).collect()
    }
}

#[async_trait]
impl BatchProcessor<i32, String> for FakeBatchProcessor {
    async fn process(&self, batch: Vec<i32>, batch_id: BatchId) -> String {
        self.calls.lock().unwrap().push((batch_id, batch));
        if let Some(gate) = &self.gate {
            gate.wait(batch_id).await;
        }
        SOME_RESULT.to_string()
    }
}

/// Records every result in the order it was handled
#[derive(Clone)]
pub struct RecordingHandler<R> {
    calls: Arc<Mutex<Vec<BatchResult<R>>>>,
}

impl<R: Clone> RecordingHandler<R> {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<BatchResult<R>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batch_ids(&self) -> Vec<BatchId> {
        self.calls().iter().map(|result| result.batch_id).collect()
    }
}

#[async_trait]
impl<R> ResultHandler<R> for RecordingHandler<R>
where
    R: Send + 'static,
{
    async fn handle(&mut self, result: BatchResult<R>) {
        self.calls.lock().unwrap().push(result);
    }
}
