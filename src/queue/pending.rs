//! Pending Queue
//!
//! Items are stored in submission order and handed out all at once.
//! Every operation runs under one mutex, so a push can never interleave
//! with a drain in a way that loses or duplicates an item.

use tokio::sync::Mutex;

struct QueueInner<T> {
    items: Vec<T>,
    closed: bool,
}

/// Buffer of not-yet-dispatched items
///
/// Protected by a Mutex for concurrent access. Once closed by shutdown it
/// refuses further pushes.
pub struct PendingQueue<T> {
    inner: Mutex<QueueInner<T>>,
}

impl<T> PendingQueue<T> {
    /// Creates a new empty, open queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Append an item to the tail of the queue
    ///
    /// # Arguments
    /// * `item` - The submitted item
    ///
    /// # Returns
    /// * `Ok(len)` with the queue length after the push
    /// * `Err(item)` handing the item back if the queue is closed
    pub async fn push(&self, item: T) -> Result<usize, T> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(item);
        }
        inner.items.push(item);
        Ok(inner.items.len())
    }

    /// Take everything currently queued, leaving an empty buffer behind
    ///
    /// Returns an empty vector if nothing is pending.
    pub async fn drain(&self) -> Vec<T> {
        let mut inner = self.inner.lock().await;
        std::mem::take(&mut inner.items)
    }

    /// Close the queue and take the remainder in the same critical section
    ///
    /// Any push that loses the race against this call is rejected, so
    /// nothing can be left behind after the final flush.
    pub async fn close_and_drain(&self) -> Vec<T> {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        std::mem::take(&mut inner.items)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
