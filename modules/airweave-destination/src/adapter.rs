use async_trait::async_trait;
use uuid::Uuid;

use airweave_common::AirweaveError;

use crate::types::{DecayConfig, SearchHit, VectorRecord};

/// Pluggable sink (spec §4.3 / C4). One instance is constructed per
/// destination connection in a sync's DAG; all methods must be safe to
/// call concurrently for different `db_entity_id`s within the same
/// `collection_id` (spec §5's shared-resource note).
#[async_trait]
pub trait DestinationAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Idempotent: calling this against an already-provisioned collection
    /// is a no-op, not an error.
    async fn setup_collection(&self, collection_id: Uuid, vector_size: usize) -> Result<(), AirweaveError>;

    /// Upsert by `db_entity_id`. Callers must not split this into a
    /// partially-committed write — see `crate::batch::bulk_insert_with_shrink`
    /// for the shrink-on-failure policy that gives this all-or-nothing
    /// semantics operationally.
    async fn bulk_insert(&self, records: &[VectorRecord]) -> Result<(), AirweaveError>;

    async fn bulk_delete(&self, entity_ids: &[String]) -> Result<(), AirweaveError>;

    async fn delete_by_sync_id(&self, sync_id: Uuid) -> Result<(), AirweaveError>;

    async fn bulk_delete_by_parent_id(&self, parent_id: &str) -> Result<(), AirweaveError>;

    async fn search(
        &self,
        query_vector: &[f32],
        filter: Option<&serde_json::Value>,
        decay: Option<&DecayConfig>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, AirweaveError>;
}
