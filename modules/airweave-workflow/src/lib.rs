//! Restate durable workflow for running one sync (spec §4.11).
//!
//! `RunSourceConnectionWorkflow` is the single entry point: it resolves or
//! creates the `sync_job` row, builds an `airweave_orchestrator::SyncOrchestrator`
//! run, journals each side-effecting step via `ctx.run`, and persists the
//! terminal state. A `cancel` shared handler runs concurrently with `run`
//! (Restate's own concurrency model, not a runtime interrupt) and flips a
//! cooperative flag the orchestrator polls.

pub mod activities;
pub mod deps;
pub mod repository;
pub mod types;
pub mod workflow;

pub use deps::{CancellationRegistry, WorkflowDeps};
pub use repository::SyncRepository;
pub use types::{
    CancelRequest, CreateSyncJobOutcome, CreatedSyncJob, EmptyRequest,
    RunSourceConnectionRequest, RunSourceConnectionResult, RunSyncOutcome,
};
pub use workflow::{RunSourceConnectionWorkflow, RunSourceConnectionWorkflowImpl};

// ---------------------------------------------------------------------------
// Restate serde bridge macros (from rootsignal-scout)
// ---------------------------------------------------------------------------

/// Implement Restate SDK serialization traits for types that already have serde derives.
///
/// Bridges `serde::{Serialize, Deserialize}` to Restate's custom serialization traits
/// without needing the `Json<>` wrapper.
#[macro_export]
macro_rules! impl_restate_serde {
    ($type:ty) => {
        impl restate_sdk::serde::Serialize for $type {
            type Error = serde_json::Error;

            fn serialize(&self) -> Result<bytes::Bytes, Self::Error> {
                serde_json::to_vec(self).map(bytes::Bytes::from)
            }
        }

        impl restate_sdk::serde::Deserialize for $type {
            type Error = serde_json::Error;

            fn deserialize(bytes: &mut bytes::Bytes) -> Result<Self, Self::Error> {
                serde_json::from_slice(bytes)
            }
        }

        impl restate_sdk::serde::WithContentType for $type {
            fn content_type() -> &'static str {
                "application/json"
            }
        }
    };
}

/// Read the `status` journal key `run` periodically sets, defaulting to
/// `"pending"` before the first write.
pub async fn read_workflow_status(
    ctx: &restate_sdk::prelude::SharedWorkflowContext<'_>,
) -> Result<String, restate_sdk::prelude::HandlerError> {
    Ok(ctx
        .get::<String>("status")
        .await?
        .unwrap_or_else(|| "pending".to_string()))
}
