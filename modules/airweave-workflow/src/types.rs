//! Request/response types for the `RunSourceConnection` workflow (spec
//! §4.11), journaled via the `impl_restate_serde!` bridge macro defined in
//! `crate::lib` the same way `rootsignal-scout/src/workflows/types.rs`
//! bridges its own request/result structs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use airweave_dag::Dag;
use airweave_orchestrator::SyncJobStatus;

/// Input to `RunSourceConnectionWorkflow::run`. Mirrors the original
/// Temporal workflow's `(sync, sync_job?, dag, ..., force_full_sync)`
/// signature, narrowed to what this workspace actually models: a
/// `collection`/`connection`/`ctx`/`access_token` in the original all
/// resolve, in this crate, to `source_config` plus the per-destination-node
/// maps below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSourceConnectionRequest {
    pub sync_id: Uuid,
    /// Present for a manually-triggered run; absent for a scheduled
    /// trigger, in which case `run` first creates one itself.
    pub sync_job_id: Option<Uuid>,
    pub dag: Dag,
    pub source_short_name: String,
    pub source_config: Value,
    /// DAG destination node id -> registry kind (spec's destination
    /// adapters are resolved the same way source adapters are, by a
    /// registered factory key).
    pub destination_kinds: BTreeMap<String, String>,
    pub destination_configs: BTreeMap<String, Value>,
    pub vector_size: usize,
    pub force_full_sync: bool,
}

/// `None` for `sync_job_id`/`status` means `create_sync_job` found another
/// job already running and the workflow exited gracefully (spec §4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSourceConnectionResult {
    pub sync_job_id: Option<Uuid>,
    pub status: Option<SyncJobStatus>,
    pub error: Option<String>,
}

/// Empty request for the `get_status` shared handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyRequest;

/// Delivered to the `cancel` shared handler, which runs concurrently with
/// `run` and flips the cooperative cancellation flag the orchestrator polls
/// (see `DESIGN.md`'s open-question resolution on cancellation delivery).
/// Callers already hold `sync_job_id` from `run`'s eventual result or from
/// having listed jobs themselves, so it's carried explicitly rather than
/// inferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub sync_job_id: uuid::Uuid,
    pub reason: String,
}

/// Journaled return value of the `create_sync_job` activity step — just
/// the new id, so the step doesn't need `SyncJob` itself to cross the
/// Restate serde bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSyncJob {
    pub id: Uuid,
}

/// Outcome of the `create_sync_job` step. `AlreadyRunning` is a normal,
/// successful journal entry — not an error — so a replay doesn't retry the
/// insert and the workflow's graceful-exit branch is driven by matching on
/// this rather than by inspecting an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CreateSyncJobOutcome {
    Created(CreatedSyncJob),
    AlreadyRunning,
}

/// Journaled return value of the `run_sync` activity step. `SyncJob` itself
/// is defined in `airweave_orchestrator`, and bridging a foreign type to
/// Restate's (also foreign) serde traits from this crate would violate the
/// orphan rule, so the journaled payload is this local, flattened summary;
/// `workflow::run` reconstitutes the full `SyncJob` for persistence from the
/// job it already holds plus this outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSyncOutcome {
    pub status: SyncJobStatus,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
}

crate::impl_restate_serde!(RunSourceConnectionRequest);
crate::impl_restate_serde!(RunSourceConnectionResult);
crate::impl_restate_serde!(EmptyRequest);
crate::impl_restate_serde!(CancelRequest);
crate::impl_restate_serde!(CreatedSyncJob);
crate::impl_restate_serde!(CreateSyncJobOutcome);
crate::impl_restate_serde!(RunSyncOutcome);
