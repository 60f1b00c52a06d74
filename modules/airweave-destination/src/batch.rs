//! Shrink-on-failure batch insert (spec §4.3): a batch commits atomically
//! or the whole batch is retried at a smaller size, down to 1; an item
//! that still fails alone is recorded as skipped rather than failing the
//! job. Grounded in `airweave_common::retry::RetryPolicy` for the
//! exponential backoff leg of each attempt.

use airweave_common::{AirweaveError, retry::RetryPolicy};

use crate::adapter::DestinationAdapter;
use crate::types::VectorRecord;

#[derive(Debug, Default)]
pub struct BulkInsertOutcome {
    pub committed: usize,
    pub skipped: Vec<(VectorRecord, AirweaveError)>,
}

impl BulkInsertOutcome {
    fn merge(mut self, other: BulkInsertOutcome) -> Self {
        self.committed += other.committed;
        self.skipped.extend(other.skipped);
        self
    }
}

/// Insert `records` into `adapter`, retrying transient failures per
/// `policy` and halving the batch on exhausted retries until single items
/// either commit or are recorded as skipped.
pub async fn bulk_insert_with_shrink(
    adapter: &dyn DestinationAdapter,
    records: Vec<VectorRecord>,
    policy: &RetryPolicy,
) -> BulkInsertOutcome {
    if records.is_empty() {
        return BulkInsertOutcome::default();
    }

    let attempt = policy
        .retry(AirweaveError::is_transient, || adapter.bulk_insert(&records))
        .await;

    match attempt {
        Ok(()) => BulkInsertOutcome {
            committed: records.len(),
            skipped: Vec::new(),
        },
        Err(err) if records.len() == 1 => {
            let mut records = records;
            let record = records.pop().expect("len checked above");
            tracing::warn!(entity_id = %record.entity_id, error = %err, "item skipped after batch shrank to size 1");
            BulkInsertOutcome {
                committed: 0,
                skipped: vec![(record, err)],
            }
        }
        Err(err) => {
            tracing::warn!(batch_size = records.len(), error = %err, "batch insert failed, shrinking and retrying");
            let mid = records.len() / 2;
            let mut records = records;
            let second_half = records.split_off(mid);
            let first = Box::pin(bulk_insert_with_shrink(adapter, records, policy)).await;
            let second = Box::pin(bulk_insert_with_shrink(adapter, second_half, policy)).await;
            first.merge(second)
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::mock::MockDestination;

    fn record(entity_id: &str) -> VectorRecord {
        VectorRecord {
            db_entity_id: Uuid::new_v4(),
            entity_id: entity_id.to_string(),
            sync_id: Uuid::nil(),
            parent_entity_id: None,
            vector: vec![0.1, 0.2],
            payload: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn whole_batch_commits_when_adapter_succeeds() {
        let adapter = MockDestination::new();
        let records = vec![record("a"), record("b"), record("c")];
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let outcome = bulk_insert_with_shrink(&adapter, records, &policy).await;
        assert_eq!(outcome.committed, 3);
        assert!(outcome.skipped.is_empty());
        assert_eq!(adapter.inserted_count(), 3);
    }

    #[tokio::test]
    async fn batch_shrinks_and_isolates_the_single_bad_item() {
        let adapter = MockDestination::new();
        adapter.fail_entity_id("bad");
        let records = vec![record("a"), record("bad"), record("c"), record("d")];
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let outcome = bulk_insert_with_shrink(&adapter, records, &policy).await;
        assert_eq!(outcome.committed, 3);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].0.entity_id, "bad");
        assert_eq!(adapter.inserted_count(), 3);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let adapter = MockDestination::new();
        let policy = RetryPolicy::default();
        let outcome = bulk_insert_with_shrink(&adapter, Vec::new(), &policy).await;
        assert_eq!(outcome.committed, 0);
        assert!(outcome.skipped.is_empty());
    }
}
