use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A fully embedded, ledger-assigned entity ready for the destination (spec
/// §4.3: "the adapter receives pre-embedded records").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub db_entity_id: Uuid,
    pub entity_id: String,
    pub sync_id: Uuid,
    pub parent_entity_id: Option<String>,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// Field-based decay scoring applied on top of vector similarity (spec
/// §4.3's `search(query_vector, filter, decay_config)`). `scale` and
/// `half_life_seconds` together describe an exponential decay curve
/// keyed on a numeric/date-typed payload field such as an `is_updated_at`
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    pub field: String,
    pub scale: f64,
    pub half_life_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub db_entity_id: Uuid,
    pub entity_id: String,
    pub score: f64,
    pub payload: Map<String, Value>,
}
