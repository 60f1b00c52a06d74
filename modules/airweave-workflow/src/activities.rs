//! The three activity-shaped steps spec §4.11 names, implemented as plain
//! async functions the workflow journals via `ctx.run` — Restate's
//! durability model doesn't need a separate service per activity the way
//! Temporal's does; journaling the closure is enough (see `scrape.rs`'s
//! `ctx.run(|| async { ... })` steps, which follow the same shape).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use airweave_common::AirweaveError;
use airweave_dag::Dag;
use airweave_destination::DestinationAdapter;
use airweave_orchestrator::{OrchestratorContext, Sync, SyncJob};

use crate::deps::WorkflowDeps;
use crate::types::{CreateSyncJobOutcome, CreatedSyncJob, RunSourceConnectionRequest};

/// `create_sync_job_activity`: inserts a new `pending` job for a scheduled
/// (sync_job-less) trigger. Another job already running for this sync is a
/// normal outcome, not an error, since the workflow exits gracefully either
/// way (spec §4.11) and a replay must not retry the insert.
pub async fn create_sync_job(
    deps: &WorkflowDeps,
    sync_id: Uuid,
) -> Result<CreateSyncJobOutcome, AirweaveError> {
    match deps.repository.create_sync_job(sync_id).await {
        Ok(job) => Ok(CreateSyncJobOutcome::Created(CreatedSyncJob { id: job.id })),
        Err(AirweaveError::Config(_)) => Ok(CreateSyncJobOutcome::AlreadyRunning),
        Err(e) => Err(e),
    }
}

/// `mark_sync_job_cancelled_activity`: best-effort DB compensation fired
/// from the `cancel` shared handler so the job's terminal state is
/// recorded even if `run` never reaches its own persistence step.
pub async fn mark_sync_job_cancelled(deps: &WorkflowDeps, sync_job_id: Uuid, reason: &str) -> Result<(), AirweaveError> {
    deps.repository.mark_cancelled(sync_job_id, reason, Utc::now()).await
}

fn resolve_destination_adapters(
    deps: &WorkflowDeps,
    dag: &Dag,
    req: &RunSourceConnectionRequest,
) -> Result<HashMap<String, Arc<dyn DestinationAdapter>>, AirweaveError> {
    use airweave_dag::DagNodeKind;

    let mut adapters = HashMap::new();
    for node in &dag.nodes {
        let DagNodeKind::Destination { connection_id } = &node.kind else {
            continue;
        };
        let connection_id = *connection_id;
        let kind = req.destination_kinds.get(&node.id).ok_or_else(|| {
            AirweaveError::Config(format!("no destination kind given for dag node {}", node.id))
        })?;
        let config = req.destination_configs.get(&node.id).cloned().unwrap_or(serde_json::Value::Null);
        let adapter = deps.destination_registry.create(kind, connection_id, config)?;
        adapters.insert(node.id.clone(), adapter);
    }
    Ok(adapters)
}

/// `run_sync_activity`: builds the per-job `OrchestratorContext` and hands
/// the run to `SyncOrchestrator`. Takes `sync_job` by value and returns it
/// updated — the caller persists it; this function has no DB-writing
/// responsibility of its own beyond what `SyncOrchestrator::run` already
/// does in memory.
pub async fn run_sync(
    deps: &WorkflowDeps,
    req: &RunSourceConnectionRequest,
    sync: &Sync,
    mut sync_job: SyncJob,
    cancelled: Arc<std::sync::atomic::AtomicBool>,
) -> Result<SyncJob, AirweaveError> {
    let destination_adapters = resolve_destination_adapters(deps, &req.dag, req)?;

    let ctx = OrchestratorContext {
        dag: req.dag.clone(),
        source_short_name: req.source_short_name.clone(),
        source_config: req.source_config.clone(),
        source_registry: deps.source_registry.clone(),
        credentials: deps.credentials.clone(),
        destination_adapters,
        transformers: deps.transformers.clone(),
        ledger: deps.ledger.clone(),
        cursor_store: deps.cursor_store.clone(),
        progress: deps.progress.clone(),
        embedder: deps.embedder.clone(),
        max_workers: deps.config.default_max_workers,
        batch_size: 200,
        flush_interval: Duration::from_secs(5),
        vector_size: req.vector_size,
        stream_queue_capacity: deps.config.stream_queue_capacity,
    };

    airweave_orchestrator::SyncOrchestrator::run(ctx, sync, &mut sync_job, cancelled).await?;
    Ok(sync_job)
}
