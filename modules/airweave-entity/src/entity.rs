use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::provenance::Provenance;

/// Fields that never participate in the content hash regardless of what a
/// source adapter happens to put in `payload`. `sync_job_id` lives on
/// `Provenance`, not `payload`, so it is excluded by construction; this set
/// additionally protects against a source placing an unstable value (e.g.
/// a ledger-assigned id) directly in the payload map.
pub const UNSTABLE_PAYLOAD_FIELDS: &[&str] = &["db_entity_id", "sync_job_id", "vector"];

/// The pipeline's unit of work (spec §3). Carries typed attributes as a
/// JSON object rather than a Rust struct per field, since `entity_type` is
/// a runtime discriminator spanning arbitrarily many source-defined shapes
/// (`GmailMessage`, `NotionPage`, a polymorphic DB row, ...).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    /// Source-stable identifier; unique within `(sync_id, entity_type)`.
    pub entity_id: String,
    pub entity_type: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub payload: Map<String, Value>,
    /// Payload keys that feed the embedding model.
    pub embeddable_fields: Vec<String>,
    /// Payload key holding a creation timestamp, if any (recency scoring).
    pub created_at_field: Option<String>,
    /// Payload key holding an update timestamp, if any (recency scoring).
    pub updated_at_field: Option<String>,
    pub provenance: Provenance,
    /// Set once this entity has been assigned a ledger row (C8).
    pub db_entity_id: Option<Uuid>,
    /// For chunk/derived entities, the id of the entity they came from.
    pub parent_entity_id: Option<String>,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>, entity_type: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            breadcrumbs: Vec::new(),
            payload: Map::new(),
            embeddable_fields: Vec::new(),
            created_at_field: None,
            updated_at_field: None,
            provenance,
            db_entity_id: None,
            parent_entity_id: None,
        }
    }

    /// SHA-256 over `entity_id`, `entity_type`, `breadcrumbs` and `payload`
    /// (less `UNSTABLE_PAYLOAD_FIELDS`). `provenance.sync_job_id` is never
    /// part of the input, which is what makes invariant 5 (spec §3) and
    /// testable property 2 (spec §8) hold by construction rather than by
    /// convention: job identity simply has no path into the hash.
    pub fn content_hash(&self) -> String {
        let mut stable_payload: Vec<(&String, &Value)> = self
            .payload
            .iter()
            .filter(|(k, _)| !UNSTABLE_PAYLOAD_FIELDS.contains(&k.as_str()))
            .collect();
        stable_payload.sort_by(|a, b| a.0.cmp(b.0));

        let payload_map: Map<String, Value> = stable_payload
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let canonical = serde_json::json!({
            "entity_id": self.entity_id,
            "entity_type": self.entity_type,
            "breadcrumbs": self.breadcrumbs,
            "payload": payload_map,
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Concatenation of the embeddable fields, in declared order, as the
    /// text handed to the embedding model. Missing fields are skipped.
    pub fn embeddable_text(&self) -> String {
        self.embeddable_fields
            .iter()
            .filter_map(|field| self.payload.get(field))
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
