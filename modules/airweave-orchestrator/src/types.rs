//! `Sync`/`SyncJob` records (spec §3: "one execution of a Sync"). Kept
//! deliberately thin — the orchestrator only needs enough of each to drive
//! one run; the rest of their lifecycle (creation, scheduling) belongs to
//! `airweave-workflow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sync {
    pub id: Uuid,
    pub source_connection_id: Uuid,
    pub destination_connection_ids: Vec<Uuid>,
    pub force_full_sync: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: Uuid,
    pub sync_id: Uuid,
    pub status: SyncJobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SyncJob {
    pub fn new(sync_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            sync_id,
            status: SyncJobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}
