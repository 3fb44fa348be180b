use std::fmt;

/// Identifier assigned to a batch at the moment it is taken from the queue.
///
/// IDs start at 1 and increase by one for every non-empty flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(pub u64);

impl BatchId {
    /// The first ID handed out by a fresh coordinator
    pub const FIRST: BatchId = BatchId(1);

    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> BatchId {
        BatchId(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a coordinator. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatcherState {
    Running,
    Stopping,
    Stopped,
}

/// A processor panicked while handling a batch.
///
/// The dispatch task converts the panic into this value so the rest of the
/// coordinator keeps running and the batch still produces exactly one result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("processor panicked on batch {batch_id}: {message}")]
pub struct ProcessorPanic {
    pub batch_id: BatchId,
    pub message: String,
}

/// Completed batch, as delivered to the result handler
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<R> {
    pub batch_id: BatchId,
    pub outcome: Result<R, ProcessorPanic>,
}

/// A submit was rejected because shutdown already took the final batch.
///
/// Carries the item back so the caller can decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("micro-batcher is stopped; item was not accepted")]
pub struct SubmitError<T>(pub T);

impl<T> SubmitError<T> {
    /// Take back the rejected item
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<SubmitError<T>> for BatcherError {
    fn from(_: SubmitError<T>) -> Self {
        BatcherError::Stopped
    }
}

/// Errors returned at the coordinator boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatcherError {
    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shutdown has already taken the final batch
    #[error("micro-batcher is stopped")]
    Stopped,

    /// `stop()` was already called on this coordinator
    #[error("micro-batcher stop was already requested")]
    AlreadyStopped,

    /// The result stream has been fully consumed by an earlier call
    #[error("results have already been drained")]
    ResultsAlreadyDrained,

    /// The result stream closed before the requested batch was observed
    #[error("result stream closed before batch {batch_id} was observed")]
    ResultsClosed { batch_id: BatchId },

    /// Nothing is listening to a manual ticker any more
    #[error("ticker is closed")]
    TickerClosed,
}
