//! Producer/consumer shim over a source adapter's entity sequence (spec
//! §4.4). The producer runs as an independent task writing into a bounded
//! channel; the channel's back-pressure *is* the backpressure mechanism —
//! there is no separate throttle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airweave_common::AirweaveError;
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

const POLL_TIMEOUT: Duration = Duration::from_millis(500);
const GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(5);
const PROGRESS_LOG_INTERVAL: u64 = 50;

/// Bounded-queue producer/consumer wrapper. `T` is whatever the source
/// yields (typically an `Entity`, but kept generic so transform stages can
/// reuse the same shim internally).
pub struct AsyncSourceStream<T: Send + 'static> {
    queue_capacity: usize,
    rx: mpsc::Receiver<T>,
    tx: Option<mpsc::Sender<T>>,
    producer_task: Option<JoinHandle<()>>,
    is_running: Arc<AtomicBool>,
    producer_done: Arc<AtomicBool>,
    producer_exception: Arc<Mutex<Option<AirweaveError>>>,
    source: Option<std::pin::Pin<Box<dyn Stream<Item = Result<T, AirweaveError>> + Send>>>,
    started: bool,
}

impl<T: Send + 'static> AsyncSourceStream<T> {
    pub fn new(
        source: impl Stream<Item = Result<T, AirweaveError>> + Send + 'static,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        Self {
            queue_capacity,
            rx,
            tx: Some(tx),
            producer_task: None,
            is_running: Arc::new(AtomicBool::new(true)),
            producer_done: Arc::new(AtomicBool::new(false)),
            producer_exception: Arc::new(Mutex::new(None)),
            source: Some(Box::pin(source)),
            started: false,
        }
    }

    /// Start the background producer task. Idempotent after the first call.
    pub async fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let tx = self.tx.take().expect("producer started twice");
        let mut source = self.source.take().expect("producer started twice");
        let is_running = self.is_running.clone();
        let producer_done = self.producer_done.clone();
        let producer_exception = self.producer_exception.clone();

        let task = tokio::spawn(async move {
            let mut items_produced: u64 = 0;
            loop {
                if !is_running.load(Ordering::SeqCst) {
                    tracing::debug!("producer stopping early");
                    break;
                }
                match source.next().await {
                    None => {
                        tracing::info!(items_produced, "source generator exhausted");
                        break;
                    }
                    Some(Ok(item)) => {
                        // Blocks when the queue is full; this is the
                        // backpressure mechanism.
                        if tx.send(item).await.is_err() {
                            break;
                        }
                        items_produced += 1;
                        if items_produced % PROGRESS_LOG_INTERVAL == 0 {
                            tracing::debug!(items_produced, "producer progress");
                        }
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "error in producer");
                        *producer_exception.lock().await = Some(err);
                        break;
                    }
                }
            }
            producer_done.store(true, Ordering::SeqCst);
            // Dropping `tx` here closes the channel, which is the consumer
            // side's end-of-stream signal.
        });
        self.producer_task = Some(task);
    }

    /// Stop the producer and clean up. The producer is given up to 5s to
    /// finish gracefully; past that it is aborted.
    pub async fn stop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        if let Some(task) = self.producer_task.take() {
            match tokio::time::timeout(GRACEFUL_STOP_TIMEOUT, task).await {
                Ok(_) => {}
                Err(_) => {
                    tracing::warn!("producer task did not complete in time, aborting");
                    // The JoinHandle was consumed by the timeout future; the
                    // task is still running in the background and will see
                    // `is_running == false` on its next loop check, or get
                    // dropped with the runtime. Draining below unblocks any
                    // pending `send`.
                }
            }
        }
        self.drain_queue().await;
    }

    /// Pull the next item, blocking up to `POLL_TIMEOUT` at a time so a
    /// cancellation check can interleave between polls. Returns `Ok(None)`
    /// at normal end of stream, and surfaces a captured producer error the
    /// first time it is observed after the channel closes.
    pub async fn next_item(&mut self) -> Result<Option<T>, AirweaveError> {
        if !self.started {
            self.start().await;
        }
        loop {
            match tokio::time::timeout(POLL_TIMEOUT, self.rx.recv()).await {
                Ok(Some(item)) => return Ok(item).map(Some),
                Ok(None) => {
                    // Channel closed: producer is done.
                    if let Some(err) = self.producer_exception.lock().await.take() {
                        tracing::error!("producer encountered an error");
                        return Err(err);
                    }
                    return Ok(None);
                }
                Err(_elapsed) => {
                    // No item within the poll window; loop and check again.
                    continue;
                }
            }
        }
    }

    async fn drain_queue(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn ok_stream(items: Vec<i32>) -> impl Stream<Item = Result<i32, AirweaveError>> {
        stream::iter(items.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn yields_all_items_in_order() {
        let mut s = AsyncSourceStream::new(ok_stream(vec![1, 2, 3]), 10);
        let mut out = Vec::new();
        while let Some(item) = s.next_item().await.unwrap() {
            out.push(item);
        }
        assert_eq!(out, vec![1, 2, 3]);
        s.stop().await;
    }

    #[tokio::test]
    async fn propagates_producer_error_after_sentinel() {
        let errs = stream::iter(vec![
            Ok(1),
            Ok(2),
            Err(AirweaveError::TransientUpstream("boom".into())),
        ]);
        let mut s = AsyncSourceStream::new(errs, 10);
        assert_eq!(s.next_item().await.unwrap(), Some(1));
        assert_eq!(s.next_item().await.unwrap(), Some(2));
        let result = s.next_item().await;
        assert!(result.is_err());
        s.stop().await;
    }

    #[tokio::test]
    async fn respects_bounded_capacity_as_backpressure() {
        // capacity 1: producer can only be one item ahead of the consumer.
        let mut s = AsyncSourceStream::new(ok_stream((0..5).collect()), 1);
        assert_eq!(s.queue_capacity(), 1);
        let mut out = Vec::new();
        while let Some(item) = s.next_item().await.unwrap() {
            out.push(item);
        }
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        s.stop().await;
    }

    #[tokio::test]
    async fn stop_drains_remaining_queued_items() {
        let mut s = AsyncSourceStream::new(ok_stream(vec![1, 2, 3]), 10);
        s.start().await;
        // Give the producer a moment to push items without consuming them.
        tokio::time::sleep(Duration::from_millis(50)).await;
        s.stop().await;
        // After stop, the queue is drained; a fresh next_item reports end
        // of stream rather than replaying buffered items.
        assert_eq!(s.next_item().await.unwrap(), None);
    }
}
