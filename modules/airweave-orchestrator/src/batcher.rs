//! Per-destination batching with a dual flush trigger — every `B` ops or
//! `F` seconds, whichever comes first (spec §4.10 step 7) — built on top
//! of `airweave_destination::bulk_insert_with_shrink`'s all-or-shrink
//! commit policy.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use airweave_common::{AirweaveError, RetryPolicy};
use airweave_destination::{bulk_insert_with_shrink, DestinationAdapter, VectorRecord};

use crate::counters::Counters;

pub enum PendingOp {
    Upsert(VectorRecord),
    Delete(String),
}

pub struct DestinationBatcher {
    adapter: Arc<dyn DestinationAdapter>,
    max_batch_size: usize,
    flush_interval: Duration,
    pending: Mutex<Vec<PendingOp>>,
    last_flush: Mutex<Instant>,
    retry: RetryPolicy,
    counters: Arc<Counters>,
}

impl DestinationBatcher {
    pub fn new(
        adapter: Arc<dyn DestinationAdapter>,
        max_batch_size: usize,
        flush_interval: Duration,
        counters: Arc<Counters>,
    ) -> Self {
        Self {
            adapter,
            max_batch_size,
            flush_interval,
            pending: Mutex::new(Vec::new()),
            last_flush: Mutex::new(Instant::now()),
            retry: RetryPolicy::default(),
            counters,
        }
    }

    /// Enqueue one op, flushing immediately if this push crossed the size
    /// threshold.
    pub async fn push(&self, op: PendingOp) -> Result<(), AirweaveError> {
        let should_flush = {
            let mut pending = self.pending.lock().unwrap();
            pending.push(op);
            pending.len() >= self.max_batch_size
        };
        if should_flush {
            self.flush().await?;
        }
        Ok(())
    }

    /// Called periodically by the orchestrator's main loop; flushes only
    /// if the time trigger has elapsed.
    pub async fn flush_if_due(&self) -> Result<(), AirweaveError> {
        let due = self.last_flush.lock().unwrap().elapsed() >= self.flush_interval;
        if due {
            self.flush().await?;
        }
        Ok(())
    }

    pub async fn flush(&self) -> Result<(), AirweaveError> {
        let ops: Vec<PendingOp> = std::mem::take(&mut *self.pending.lock().unwrap());
        *self.last_flush.lock().unwrap() = Instant::now();
        if ops.is_empty() {
            return Ok(());
        }

        let mut upserts = Vec::new();
        let mut deletes = Vec::new();
        for op in ops {
            match op {
                PendingOp::Upsert(record) => upserts.push(record),
                PendingOp::Delete(entity_id) => deletes.push(entity_id),
            }
        }

        if !upserts.is_empty() {
            let outcome = bulk_insert_with_shrink(self.adapter.as_ref(), upserts, &self.retry).await;
            for (record, err) in outcome.skipped {
                tracing::warn!(entity_id = %record.entity_id, error = %err, "record skipped after batch shrink exhausted retries");
                self.counters.inc_skipped();
            }
        }
        if !deletes.is_empty() {
            self.adapter.bulk_delete(&deletes).await?;
        }
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use airweave_destination::MockDestination;
    use uuid::Uuid;

    use super::*;

    fn record(entity_id: &str) -> VectorRecord {
        VectorRecord {
            db_entity_id: Uuid::new_v4(),
            entity_id: entity_id.to_string(),
            sync_id: Uuid::nil(),
            parent_entity_id: None,
            vector: vec![0.1],
            payload: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn flushes_automatically_once_batch_size_is_reached() {
        let adapter = Arc::new(MockDestination::new());
        let batcher = DestinationBatcher::new(adapter.clone(), 2, Duration::from_secs(3600), Arc::new(Counters::default()));

        batcher.push(PendingOp::Upsert(record("a"))).await.unwrap();
        assert_eq!(adapter.inserted_count(), 0);
        batcher.push(PendingOp::Upsert(record("b"))).await.unwrap();
        assert_eq!(adapter.inserted_count(), 2);
    }

    #[tokio::test]
    async fn flush_if_due_is_a_no_op_before_the_interval_elapses() {
        let adapter = Arc::new(MockDestination::new());
        let batcher = DestinationBatcher::new(adapter.clone(), 100, Duration::from_secs(3600), Arc::new(Counters::default()));
        batcher.push(PendingOp::Upsert(record("a"))).await.unwrap();
        batcher.flush_if_due().await.unwrap();
        assert_eq!(adapter.inserted_count(), 0);
        assert_eq!(batcher.pending_len(), 1);
    }

    #[tokio::test]
    async fn flush_if_due_flushes_once_the_interval_has_elapsed() {
        let adapter = Arc::new(MockDestination::new());
        let batcher = DestinationBatcher::new(adapter.clone(), 100, Duration::from_millis(1), Arc::new(Counters::default()));
        batcher.push(PendingOp::Upsert(record("a"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        batcher.flush_if_due().await.unwrap();
        assert_eq!(adapter.inserted_count(), 1);
    }

    #[tokio::test]
    async fn delete_ops_flush_through_bulk_delete() {
        let adapter = Arc::new(MockDestination::new());
        adapter.bulk_insert(&[record("stale")]).await.unwrap();
        let batcher = DestinationBatcher::new(adapter.clone(), 1, Duration::from_secs(3600), Arc::new(Counters::default()));
        batcher.push(PendingOp::Delete("stale".to_string())).await.unwrap();
        assert!(adapter.inserted_entity_ids().is_empty());
    }
}
