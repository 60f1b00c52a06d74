//! Assembles and drives one sync job to completion, failure, or
//! cancellation (spec §4.10 / C11). `OrchestratorContext` bundles one
//! job's dependencies the same way `context.py`'s `SyncContext` does, and
//! the cancellation flag is checked the way the teacher's
//! `scrape_pipeline.rs::check_cancelled_flag` checks its `AtomicBool`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use airweave_common::AirweaveError;
use airweave_credentials::CredentialStore;
use airweave_dag::{Dag, DagNodeKind, DagRouter};
use airweave_destination::DestinationAdapter;
use airweave_ledger::{EntityLedgerStore, SyncCursorStore};
use airweave_progress::{ProgressPublisher, SyncProgressUpdate};
use airweave_source::{ProducedEntity, SourceAdapterRegistry};
use airweave_stream::AsyncSourceStream;
use airweave_transform::TransformerRegistry;
use airweave_worker_pool::AsyncWorkerPool;

use crate::batcher::DestinationBatcher;
use crate::counters::Counters;
use crate::embedder::Embedder;
use crate::finalizer::OrchestratorFinalizer;
use crate::types::{Sync, SyncJob, SyncJobStatus};

const WORKER_DRAIN_GRACE: Duration = Duration::from_secs(30);

/// Everything one job run needs, resolved once up front by the caller
/// (`airweave-workflow`'s `run_sync` activity) and handed to
/// `SyncOrchestrator::run`.
pub struct OrchestratorContext {
    pub dag: Dag,
    pub source_short_name: String,
    pub source_config: Value,
    pub source_registry: Arc<SourceAdapterRegistry>,
    pub credentials: Arc<CredentialStore>,
    /// Destination node id -> live adapter for that node.
    pub destination_adapters: HashMap<String, Arc<dyn DestinationAdapter>>,
    pub transformers: Arc<TransformerRegistry>,
    pub ledger: Arc<EntityLedgerStore>,
    pub cursor_store: Arc<SyncCursorStore>,
    pub progress: Arc<ProgressPublisher>,
    pub embedder: Arc<dyn Embedder>,
    pub max_workers: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub vector_size: usize,
    pub stream_queue_capacity: usize,
}

pub struct SyncOrchestrator;

impl SyncOrchestrator {
    /// Runs `sync`/`sync_job` to a terminal state, mutating `sync_job` in
    /// place. Returns `Ok(())` regardless of whether the job ended
    /// `completed`, `failed`, or `cancelled` — `sync_job.status` and
    /// `.error` carry the outcome; the `Err` path is reserved for defects
    /// in the orchestrator's own setup that leave no job to report on.
    pub async fn run(
        ctx: OrchestratorContext,
        sync: &Sync,
        sync_job: &mut SyncJob,
        cancelled: Arc<AtomicBool>,
    ) -> Result<(), AirweaveError> {
        sync_job.status = SyncJobStatus::Running;

        let mut terminal = SyncProgressUpdate::default();
        match Self::run_inner(&ctx, sync, cancelled).await {
            Ok((Outcome::Completed, snapshot)) => {
                sync_job.status = SyncJobStatus::Completed;
                terminal = snapshot;
                terminal.is_complete = true;
            }
            Ok((Outcome::Cancelled(reason), snapshot)) => {
                sync_job.status = SyncJobStatus::Cancelled;
                sync_job.error = Some(reason.clone());
                terminal = snapshot;
                terminal.is_complete = true;
                terminal.error = Some(reason);
            }
            Ok((Outcome::Failed(_), _)) => unreachable!("run_inner never returns Ok with Outcome::Failed"),
            Err(err) => {
                tracing::error!(sync_job_id = %sync_job.id, error = %err, "sync job failed");
                sync_job.status = SyncJobStatus::Failed;
                let message = airweave_common::root_cause(&err);
                sync_job.error = Some(message.clone());
                terminal.is_failed = true;
                terminal.error = Some(message);
            }
        }
        sync_job.completed_at = Some(chrono::Utc::now());

        ctx.progress.publish("sync_job", &sync_job.id.to_string(), &terminal).await?;
        Ok(())
    }

    async fn run_inner(
        ctx: &OrchestratorContext,
        sync: &Sync,
        cancelled: Arc<AtomicBool>,
    ) -> Result<(Outcome, SyncProgressUpdate), AirweaveError> {
        let source_node = ctx
            .dag
            .nodes
            .iter()
            .find(|n| matches!(n.kind, DagNodeKind::Source { .. }))
            .ok_or_else(|| AirweaveError::Config("dag has no source node".into()))?;

        // Step 1: resolve credentials (refreshing first when the source's
        // oauth_type calls for it) and construct the source adapter.
        let credentials = Self::resolve_credentials(ctx, sync.source_connection_id).await?;
        let mut source_adapter =
            ctx.source_registry
                .create(&ctx.source_short_name, credentials, ctx.source_config.clone())?;
        if !source_adapter.validate_auth().await? {
            return Err(AirweaveError::PermissionDenied(format!(
                "credentials for source {} failed validation",
                ctx.source_short_name
            )));
        }

        // Step 2: destinations (already constructed by the caller; just
        // provision their collections).
        for adapter in ctx.destination_adapters.values() {
            adapter.setup_collection(sync.id, ctx.vector_size).await?;
        }

        // Step 3: cursor.
        let cursor = ctx.cursor_store.load(sync.id).await?;
        if let Some(adapter_mut) = Arc::get_mut(&mut source_adapter) {
            adapter_mut.load_cursor(cursor);
        }

        // Step 4 & 5: async source stream over a bounded-concurrency pool.
        let entity_stream = source_adapter.clone().generate_entities();
        let mut stream = AsyncSourceStream::<ProducedEntity>::new(entity_stream, ctx.stream_queue_capacity);
        let mut pool = AsyncWorkerPool::new(ctx.max_workers);

        let counters = Arc::new(Counters::default());
        let batchers: HashMap<String, Arc<DestinationBatcher>> = ctx
            .destination_adapters
            .iter()
            .map(|(node_id, adapter)| {
                (
                    node_id.clone(),
                    Arc::new(DestinationBatcher::new(
                        adapter.clone(),
                        ctx.batch_size,
                        ctx.flush_interval,
                        counters.clone(),
                    )),
                )
            })
            .collect();
        let finalizer = Arc::new(OrchestratorFinalizer::new(
            sync.id,
            ctx.ledger.clone(),
            ctx.embedder.clone(),
            batchers.clone(),
            counters.clone(),
        ));
        let router = Arc::new(DagRouter::new(ctx.dag.clone(), ctx.transformers.clone())?);

        // Step 6: drive the stream.
        let outcome = loop {
            if cancelled.load(Ordering::Relaxed) {
                break Outcome::Cancelled("cancellation flag observed".to_string());
            }

            match stream.next_item().await {
                Ok(None) => break Outcome::Completed,
                Ok(Some(item)) => {
                    let router = router.clone();
                    let finalizer = finalizer.clone();
                    let source_node_id = source_node.id.clone();
                    let counters = counters.clone();
                    pool.submit(async move {
                        let entity = match item {
                            ProducedEntity::Entity(e) => e,
                            ProducedEntity::Lazy(lazy) => match lazy.materialize().await {
                                Ok(entity) => entity,
                                Err(err) => return skip_or_fail(&counters, err),
                            },
                        };
                        match router.route_entity(&source_node_id, entity, finalizer.as_ref()).await {
                            Ok(()) => Ok(()),
                            Err(err) => skip_or_fail(&counters, err),
                        }
                    });
                }
                Err(err) => break Outcome::Failed(err),
            }

            // Step 7: periodic time-triggered flush.
            for batcher in batchers.values() {
                batcher.flush_if_due().await?;
            }
        };

        if let Outcome::Failed(err) = outcome {
            stream.stop().await;
            let _ = tokio::time::timeout(WORKER_DRAIN_GRACE, pool.wait_for_completion()).await;
            return Err(err);
        }

        stream.stop().await;
        let results = match tokio::time::timeout(WORKER_DRAIN_GRACE, pool.wait_for_completion()).await {
            Ok(results) => results,
            Err(_) => {
                tracing::warn!("worker pool did not drain within the grace period");
                Vec::new()
            }
        };
        if let Some(err) = results.into_iter().find_map(|r| r.err()) {
            return Err(err);
        }

        // Flush every batcher unconditionally at job end regardless of the
        // time trigger.
        for batcher in batchers.values() {
            batcher.flush().await?;
        }

        if matches!(outcome, Outcome::Cancelled(_)) {
            // A cancelled job has no cursor of its own to persist; this
            // records how far it got so a later run doesn't silently
            // believe nothing happened.
            let encountered = finalizer.encountered_ids();
            ctx.cursor_store
                .save(sync.id, serde_json::json!({ "cancelled_after_entities": encountered.len() }))
                .await
                .ok();
            return Ok((outcome, counters.snapshot()));
        }

        // Step 8: orphan deletion, only for a stream that exited normally —
        // a partial `encountered` set from a cancelled run must never drive
        // a delete.
        if sync.force_full_sync {
            let encountered_ids = finalizer.encountered_ids();
            let orphans = ctx.ledger.compute_orphans(sync.id, &encountered_ids).await?;
            if !orphans.is_empty() {
                let orphan_ids: Vec<String> = orphans.iter().map(|o| o.entity_id.clone()).collect();
                for adapter in ctx.destination_adapters.values() {
                    adapter.bulk_delete(&orphan_ids).await?;
                }
                ctx.ledger.delete_rows(sync.id, &orphan_ids).await?;
                counters.inc_deleted_by(orphan_ids.len() as u64);
            }
        }

        // Step 9: persist cursor.
        if let Some(new_cursor) = source_adapter.cursor() {
            ctx.cursor_store.save(sync.id, new_cursor).await?;
        }

        Ok((Outcome::Completed, counters.snapshot()))
    }

    /// Direct (no `oauth_type`) and `oauth_access_only` sources never hold a
    /// refresh token (spec §4.9/§6), so `refresh` is skipped entirely for
    /// them rather than forgiven after the fact — calling it would raise
    /// `TokenRefresh` before the source adapter is even constructed.
    async fn resolve_credentials(
        ctx: &OrchestratorContext,
        source_connection_id: Uuid,
    ) -> Result<BTreeMap<String, Value>, AirweaveError> {
        if ctx.credentials.needs_refresh(&ctx.source_short_name) {
            match ctx.credentials.refresh(source_connection_id).await {
                Ok(_) => {}
                Err(AirweaveError::Config(_)) => {}
                Err(AirweaveError::NotFound(_)) => return Ok(BTreeMap::new()),
                Err(other) => return Err(other),
            }
        }
        let credentials = ctx.credentials.decrypted(source_connection_id).await?;
        tracing::debug!(
            source_connection_id = %source_connection_id,
            credentials = %airweave_credentials::safe_summary(&credentials),
            "resolved source credentials"
        );
        Ok(credentials)
    }
}

/// A per-item failure (spec §7: "Log + increment skipped; continue") is
/// swallowed here and counted; every other error still fails the worker
/// task and, through it, the job.
fn skip_or_fail(counters: &Counters, err: AirweaveError) -> Result<(), AirweaveError> {
    match err {
        AirweaveError::PerItemBadData { entity_id, message } => {
            tracing::warn!(entity_id = %entity_id, error = %message, "entity skipped: bad data");
            counters.inc_skipped();
            Ok(())
        }
        other => Err(other),
    }
}

enum Outcome {
    Completed,
    Cancelled(String),
    Failed(AirweaveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_outcome_is_distinguishable_from_failure() {
        let completed = Outcome::Completed;
        let cancelled = Outcome::Cancelled("flag".into());
        assert!(matches!(completed, Outcome::Completed));
        assert!(matches!(cancelled, Outcome::Cancelled(_)));
    }

    #[test]
    fn per_item_bad_data_is_swallowed_and_counted() {
        let counters = Counters::default();
        let err = AirweaveError::PerItemBadData { entity_id: "e1".into(), message: "bad json".into() };
        assert!(skip_or_fail(&counters, err).is_ok());
        assert_eq!(counters.snapshot().skipped, 1);
    }

    #[test]
    fn non_per_item_errors_still_fail() {
        let counters = Counters::default();
        let err = AirweaveError::NotFound("sync 1".into());
        assert!(skip_or_fail(&counters, err).is_err());
        assert_eq!(counters.snapshot().skipped, 0);
    }
}
