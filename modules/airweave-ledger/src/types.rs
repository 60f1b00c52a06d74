use uuid::Uuid;

/// The outcome of diffing one terminal entity against the ledger (spec
/// §4.7). `Keep` means no destination write is needed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Insert,
    Update,
    Keep,
}

#[derive(Debug, Clone)]
pub struct LedgerDiff {
    pub action: LedgerAction,
    pub db_entity_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub entity_id: String,
    pub entity_type: String,
    pub content_hash: String,
    pub db_entity_id: Uuid,
    pub parent_entity_id: Option<String>,
}
