use serde::{Deserialize, Serialize};

/// The full counter snapshot published on every progress update (spec
/// §6's "Progress message format").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncProgressUpdate {
    pub inserted: u64,
    pub updated: u64,
    pub kept: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub entities_encountered: u64,
    pub is_complete: bool,
    pub is_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncProgressUpdate {
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.is_failed
    }
}
