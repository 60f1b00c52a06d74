//! In-memory `DestinationAdapter` used by the destination crate's own
//! tests and, re-exported, by the orchestrator's tests — the same role
//! the teacher's adapters play behind a trait object in integration
//! tests (`rootsignal-domains`'s adapter tests construct a fake backend
//! rather than hitting the network).

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use airweave_common::AirweaveError;

use crate::adapter::DestinationAdapter;
use crate::types::{DecayConfig, SearchHit, VectorRecord};

#[derive(Default)]
pub struct MockDestination {
    records: Mutex<Vec<VectorRecord>>,
    failing_entity_ids: Mutex<HashSet<String>>,
}

impl MockDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any bulk_insert call whose batch contains this entity_id fails.
    pub fn fail_entity_id(&self, entity_id: &str) {
        self.failing_entity_ids.lock().unwrap().insert(entity_id.to_string());
    }

    pub fn inserted_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn inserted_entity_ids(&self) -> Vec<String> {
        self.records.lock().unwrap().iter().map(|r| r.entity_id.clone()).collect()
    }
}

#[async_trait]
impl DestinationAdapter for MockDestination {
    fn name(&self) -> &str {
        "mock"
    }

    async fn setup_collection(&self, _collection_id: Uuid, _vector_size: usize) -> Result<(), AirweaveError> {
        Ok(())
    }

    async fn bulk_insert(&self, records: &[VectorRecord]) -> Result<(), AirweaveError> {
        let failing = self.failing_entity_ids.lock().unwrap();
        if records.iter().any(|r| failing.contains(&r.entity_id)) {
            return Err(AirweaveError::TransientUpstream("mock destination: induced failure".into()));
        }
        drop(failing);
        self.records.lock().unwrap().extend(records.iter().cloned());
        Ok(())
    }

    async fn bulk_delete(&self, entity_ids: &[String]) -> Result<(), AirweaveError> {
        self.records.lock().unwrap().retain(|r| !entity_ids.contains(&r.entity_id));
        Ok(())
    }

    async fn delete_by_sync_id(&self, sync_id: Uuid) -> Result<(), AirweaveError> {
        self.records.lock().unwrap().retain(|r| r.sync_id != sync_id);
        Ok(())
    }

    async fn bulk_delete_by_parent_id(&self, parent_id: &str) -> Result<(), AirweaveError> {
        self.records
            .lock()
            .unwrap()
            .retain(|r| r.parent_entity_id.as_deref() != Some(parent_id));
        Ok(())
    }

    async fn search(
        &self,
        _query_vector: &[f32],
        _filter: Option<&serde_json::Value>,
        _decay: Option<&DecayConfig>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, AirweaveError> {
        let hits = self
            .records
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .map(|r| SearchHit {
                db_entity_id: r.db_entity_id,
                entity_id: r.entity_id.clone(),
                score: 1.0,
                payload: r.payload.clone(),
            })
            .collect();
        Ok(hits)
    }
}
