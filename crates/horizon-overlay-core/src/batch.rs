//! Coalescing batch queue with a scheduled flush.
//!
//! Items posted to a [`BatchQueue`] are held until a flush runs. The first
//! item posted to an idle queue schedules a flush `delay` later; everything
//! posted before that flush fires is handed to the [`BatchProcessor`] in one
//! call. This turns many near-simultaneous requests (for example, every
//! overlay on a page being torn down at once) into a single pass.
//!
//! The flush is driven by a Tokio task, but the queue itself only depends on
//! "run this after a delay", so the processor never observes the timer.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_overlay_core::{BatchProcessor, BatchQueue};
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl BatchProcessor<u32> for Printer {
//!     async fn process(&self, batch: Vec<u32>) {
//!         println!("flushing {batch:?}");
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let queue = BatchQueue::new(Duration::from_millis(50), Printer);
//! queue.enqueue(1);
//! queue.enqueue(2);
//! assert_eq!(queue.flush_now().await, 2);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::logging::targets;

/// Receives the items drained from a [`BatchQueue`] in one flush.
///
/// Processors run on a background task and cannot return errors to whoever
/// enqueued the items; they are expected to log their own failures.
#[async_trait]
pub trait BatchProcessor<T>: Send + Sync {
    /// Process one drained batch. Never called with an empty batch.
    async fn process(&self, batch: Vec<T>);
}

/// Pending items, the handle of the scheduled flush, and the number of
/// batches handed to the processor that have not finished yet.
struct BatchState<T> {
    pending: Vec<T>,
    timer: Option<JoinHandle<()>>,
    in_flight: usize,
    closed: bool,
}

impl<T> BatchState<T> {
    fn timer_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Drain the pending items, counting them as in flight if there are any.
    fn take_batch(&mut self) -> Vec<T> {
        let batch = std::mem::take(&mut self.pending);
        if !batch.is_empty() {
            self.in_flight += 1;
        }
        batch
    }
}

struct BatchQueueInner<T> {
    state: Mutex<BatchState<T>>,
    delay: Duration,
    processor: Arc<dyn BatchProcessor<T>>,
    flush_count: AtomicU64,
    processed_count: AtomicU64,
    idle: Notify,
}

impl<T: Send + 'static> BatchQueueInner<T> {
    /// Process a batch drained with [`BatchState::take_batch`].
    async fn run(&self, batch: Vec<T>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let _in_flight = InFlight(self);
        let len = batch.len();
        let flush = self.flush_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(target: targets::BATCH, flush, items = len, "flushing batch");
        self.processor.process(batch).await;
        self.processed_count.fetch_add(len as u64, Ordering::SeqCst);
        len
    }

    /// Wait until no batch is being processed.
    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.state.lock().in_flight == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Releases one in-flight batch on drop, including when the flush task is
/// cancelled mid-process.
struct InFlight<'a, T>(&'a BatchQueueInner<T>);

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.0.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            self.0.idle.notify_waiters();
        }
    }
}

/// A queue that coalesces posted items into delayed batch flushes.
///
/// Cloning a `BatchQueue` yields another handle to the same queue.
pub struct BatchQueue<T> {
    inner: Arc<BatchQueueInner<T>>,
}

impl<T> Clone for BatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for BatchQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BatchQueue")
            .field("delay", &self.inner.delay)
            .field("pending", &state.pending.len())
            .field("closed", &state.closed)
            .field("flush_count", &self.inner.flush_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T: Send + 'static> BatchQueue<T> {
    /// Create a queue that flushes `delay` after the first item of a batch is posted.
    pub fn new<P>(delay: Duration, processor: P) -> Self
    where
        P: BatchProcessor<T> + 'static,
    {
        Self {
            inner: Arc::new(BatchQueueInner {
                state: Mutex::new(BatchState {
                    pending: Vec::new(),
                    timer: None,
                    in_flight: 0,
                    closed: false,
                }),
                delay,
                processor: Arc::new(processor),
                flush_count: AtomicU64::new(0),
                processed_count: AtomicU64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// The delay between the first post of a batch and its flush.
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Post an item for the next flush.
    ///
    /// Returns `false` if the queue has been closed. When called outside a
    /// Tokio runtime no flush can be scheduled; the item then waits for an
    /// explicit [`flush_now`](Self::flush_now) or [`close`](Self::close).
    pub fn enqueue(&self, item: T) -> bool {
        let mut state = self.inner.state.lock();
        if state.closed {
            tracing::debug!(target: targets::BATCH, "enqueue on closed batch queue ignored");
            return false;
        }
        state.pending.push(item);

        if !state.timer_pending() {
            match Handle::try_current() {
                Ok(handle) => {
                    // Spawned under the state lock so the task cannot clear
                    // `timer` before the handle is stored.
                    let inner = self.inner.clone();
                    state.timer = Some(handle.spawn(async move {
                        tokio::time::sleep(inner.delay).await;
                        let batch = {
                            let mut state = inner.state.lock();
                            state.timer = None;
                            state.take_batch()
                        };
                        inner.run(batch).await;
                    }));
                    tracing::trace!(target: targets::BATCH, delay = ?self.inner.delay, "flush scheduled");
                }
                Err(_) => {
                    tracing::warn!(
                        target: targets::BATCH,
                        "no async runtime available, batch will wait for an explicit flush"
                    );
                }
            }
        }
        true
    }

    /// Number of items waiting for the next flush.
    pub fn queue_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether a flush is currently scheduled.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.state.lock().timer_pending()
    }

    /// Number of non-empty flushes performed so far.
    pub fn flush_count(&self) -> u64 {
        self.inner.flush_count.load(Ordering::SeqCst)
    }

    /// Number of items handed to the processor so far.
    pub fn processed_count(&self) -> u64 {
        self.inner.processed_count.load(Ordering::SeqCst)
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Whether a batch is being processed right now.
    pub fn is_flushing(&self) -> bool {
        self.inner.state.lock().in_flight > 0
    }

    /// Cancel any scheduled flush and process everything pending right now.
    ///
    /// Also waits for a flush that is already running, so every item posted
    /// before the call has been processed when it returns. Returns the number
    /// of items this call processed.
    pub async fn flush_now(&self) -> usize {
        let batch = {
            let mut state = self.inner.state.lock();
            // The timer clears its own handle before draining, so a handle
            // still stored here belongs to a task that has not started work.
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.take_batch()
        };
        let processed = self.inner.run(batch).await;
        self.inner.wait_idle().await;
        processed
    }

    /// Stop accepting items and flush whatever is pending.
    ///
    /// Closing twice is harmless; the second call flushes nothing.
    pub async fn close(&self) -> usize {
        self.inner.state.lock().closed = true;
        self.flush_now().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        batches: Arc<Mutex<Vec<Vec<u32>>>>,
    }

    #[async_trait]
    impl BatchProcessor<u32> for Recorder {
        async fn process(&self, batch: Vec<u32>) {
            self.batches.lock().push(batch);
        }
    }

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_posts_coalesce_into_one_flush() {
        let recorder = Recorder::default();
        let queue = BatchQueue::new(DELAY, recorder.clone());

        assert!(queue.enqueue(1));
        assert!(queue.enqueue(2));
        assert!(queue.enqueue(3));
        assert_eq!(queue.queue_count(), 3);
        assert!(queue.is_flush_scheduled());

        tokio::time::sleep(DELAY / 2).await;
        assert_eq!(queue.flush_count(), 0);

        tokio::time::sleep(DELAY).await;
        assert_eq!(queue.flush_count(), 1);
        assert_eq!(queue.processed_count(), 3);
        assert_eq!(*recorder.batches.lock(), vec![vec![1, 2, 3]]);
        assert_eq!(queue.queue_count(), 0);
        assert!(!queue.is_flush_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_after_flush_schedules_new_batch() {
        let recorder = Recorder::default();
        let queue = BatchQueue::new(DELAY, recorder.clone());

        queue.enqueue(1);
        tokio::time::sleep(DELAY * 2).await;
        queue.enqueue(2);
        tokio::time::sleep(DELAY * 2).await;

        assert_eq!(queue.flush_count(), 2);
        assert_eq!(*recorder.batches.lock(), vec![vec![1], vec![2]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_cancels_timer() {
        let recorder = Recorder::default();
        let queue = BatchQueue::new(DELAY, recorder.clone());

        queue.enqueue(7);
        assert_eq!(queue.flush_now().await, 1);
        assert!(!queue.is_flush_scheduled());

        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(queue.flush_count(), 1);
        assert_eq!(*recorder.batches.lock(), vec![vec![7]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_and_rejects() {
        let recorder = Recorder::default();
        let queue = BatchQueue::new(DELAY, recorder.clone());

        queue.enqueue(1);
        queue.enqueue(2);
        assert_eq!(queue.close().await, 2);
        assert!(queue.is_closed());
        assert!(!queue.enqueue(3));
        assert_eq!(queue.close().await, 0);
        assert_eq!(queue.flush_count(), 1);
    }

    #[derive(Clone, Default)]
    struct Slow {
        batches: Arc<Mutex<Vec<Vec<u32>>>>,
    }

    #[async_trait]
    impl BatchProcessor<u32> for Slow {
        async fn process(&self, batch: Vec<u32>) {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.batches.lock().push(batch);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_waits_for_running_flush() {
        let slow = Slow::default();
        let queue = BatchQueue::new(DELAY, slow.clone());

        queue.enqueue(1);
        queue.enqueue(2);
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        assert!(queue.is_flushing());
        assert_eq!(queue.queue_count(), 0);
        assert!(slow.batches.lock().is_empty());

        assert_eq!(queue.close().await, 0);
        assert!(!queue.is_flushing());
        assert_eq!(*slow.batches.lock(), vec![vec![1, 2]]);
        assert_eq!(queue.processed_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_waits_for_running_flush_and_drains_new_items() {
        let slow = Slow::default();
        let queue = BatchQueue::new(DELAY, slow.clone());

        queue.enqueue(1);
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        queue.enqueue(2);

        assert_eq!(queue.flush_now().await, 1);
        let mut batches = slow.batches.lock().clone();
        batches.sort();
        assert_eq!(batches, vec![vec![1], vec![2]]);
        assert_eq!(queue.flush_count(), 2);
        assert!(!queue.is_flush_scheduled());
    }

    #[tokio::test]
    async fn test_empty_flush_is_not_counted() {
        let queue = BatchQueue::new(DELAY, Recorder::default());
        assert_eq!(queue.flush_now().await, 0);
        assert_eq!(queue.flush_count(), 0);
    }

    #[test]
    fn test_enqueue_without_runtime_waits_for_explicit_flush() {
        let recorder = Recorder::default();
        let queue = BatchQueue::new(DELAY, recorder.clone());
        assert!(queue.enqueue(9));
        assert!(!queue.is_flush_scheduled());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("failed to build runtime");
        assert_eq!(runtime.block_on(queue.flush_now()), 1);
        assert_eq!(*recorder.batches.lock(), vec![vec![9]]);
    }
}
