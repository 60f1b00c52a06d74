use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an entity came from and which run produced it. `sync_job_id` is
/// carried here rather than on the entity itself precisely so it is easy
/// to exclude from the content hash (invariant 5, spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Provenance {
    pub source_name: String,
    pub sync_id: Uuid,
    pub sync_job_id: Uuid,
    pub source_connection_id: Uuid,
}
