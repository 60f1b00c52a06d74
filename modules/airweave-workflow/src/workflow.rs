//! `RunSourceConnectionWorkflow`: the Restate entry point for spec §4.11's
//! sync run. Grounded on `rootsignal-scout/src/workflows/scrape.rs`'s
//! `#[restate_sdk::workflow]` trait/impl shape — `run` journals each
//! side-effecting step via `ctx.run`, `get_status` reads the `"status"`
//! journal key from a `#[shared]` handler.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use restate_sdk::prelude::*;

use airweave_orchestrator::SyncJobStatus;

use crate::activities;
use crate::deps::WorkflowDeps;
use crate::types::{
    CancelRequest, EmptyRequest, RunSourceConnectionRequest, RunSourceConnectionResult,
};

#[restate_sdk::workflow]
#[name = "RunSourceConnectionWorkflow"]
pub trait RunSourceConnectionWorkflow {
    async fn run(
        req: RunSourceConnectionRequest,
    ) -> Result<RunSourceConnectionResult, HandlerError>;
    #[shared]
    async fn get_status(req: EmptyRequest) -> Result<String, HandlerError>;
    #[shared]
    async fn cancel(req: CancelRequest) -> Result<(), HandlerError>;
}

pub struct RunSourceConnectionWorkflowImpl {
    deps: Arc<WorkflowDeps>,
}

impl RunSourceConnectionWorkflowImpl {
    pub fn with_deps(deps: Arc<WorkflowDeps>) -> Self {
        Self { deps }
    }
}

impl RunSourceConnectionWorkflow for RunSourceConnectionWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        req: RunSourceConnectionRequest,
    ) -> Result<RunSourceConnectionResult, HandlerError> {
        ctx.set("status", "resolving sync job".to_string());

        let sync = self
            .deps
            .repository
            .load_sync(req.sync_id)
            .await
            .map_err(|e| TerminalError::new(e.to_string()))?;

        // No job handed to us: this is a scheduled trigger, so create one
        // ourselves. If another job is already running for this sync, that
        // insert fails and the workflow exits gracefully with no job.
        let sync_job = match req.sync_job_id {
            Some(id) => self
                .deps
                .repository
                .load_sync_job(id)
                .await
                .map_err(|e| TerminalError::new(e.to_string()))?,
            None => {
                let deps = self.deps.clone();
                let sync_id = req.sync_id;
                let outcome = ctx
                    .run(|| async move {
                        activities::create_sync_job(&deps, sync_id).await.map_err(
                            |e| -> HandlerError { TerminalError::new(e.to_string()).into() },
                        )
                    })
                    .await?;

                match outcome {
                    crate::types::CreateSyncJobOutcome::Created(created) => self
                        .deps
                        .repository
                        .load_sync_job(created.id)
                        .await
                        .map_err(|e| TerminalError::new(e.to_string()))?,
                    crate::types::CreateSyncJobOutcome::AlreadyRunning => {
                        ctx.set("status", "skipped: another job already running".to_string());
                        return Ok(RunSourceConnectionResult {
                            sync_job_id: None,
                            status: None,
                            error: None,
                        });
                    }
                }
            }
        };

        let sync_job_id = sync_job.id;
        let cancelled = self.deps.cancellations.register(sync_job_id);

        ctx.set("status", "running".to_string());

        let deps = self.deps.clone();
        let req_clone = req.clone();
        let sync_clone = sync.clone();
        let cancelled_clone = cancelled.clone();
        let sync_job_for_run = sync_job.clone();
        let result = ctx
            .run(|| async move {
                let job = activities::run_sync(
                    &deps,
                    &req_clone,
                    &sync_clone,
                    sync_job_for_run,
                    cancelled_clone,
                )
                .await
                .map_err(|e| -> HandlerError { TerminalError::new(e.to_string()).into() })?;
                Ok(crate::types::RunSyncOutcome {
                    status: job.status,
                    completed_at: job.completed_at,
                    error: job.error,
                })
            })
            .await;

        self.deps.cancellations.remove(sync_job_id);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                return Err(e);
            }
        };

        let finished_job = airweave_orchestrator::SyncJob {
            status: outcome.status,
            completed_at: outcome.completed_at,
            error: outcome.error.clone(),
            ..sync_job
        };

        self.deps
            .repository
            .save_sync_job(&finished_job)
            .await
            .map_err(|e| TerminalError::new(e.to_string()))?;

        ctx.set("status", format!("{:?}", finished_job.status));

        let was_cancelled = cancelled.load(Ordering::Relaxed);
        let error = if was_cancelled {
            Some("cancelled".to_string())
        } else {
            finished_job.error.clone()
        };

        Ok(RunSourceConnectionResult {
            sync_job_id: Some(finished_job.id),
            status: Some(finished_job.status),
            error,
        })
    }

    async fn get_status(
        &self,
        ctx: SharedWorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<String, HandlerError> {
        crate::read_workflow_status(&ctx).await
    }

    async fn cancel(
        &self,
        _ctx: SharedWorkflowContext<'_>,
        req: CancelRequest,
    ) -> Result<(), HandlerError> {
        // Best-effort: flip the cooperative flag the orchestrator polls, and
        // shield the DB compensation so it lands even if `run` has already
        // moved past the point where it would persist `Cancelled` itself.
        if self.deps.cancellations.cancel(req.sync_job_id) {
            let _ =
                activities::mark_sync_job_cancelled(&self.deps, req.sync_job_id, &req.reason)
                    .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn status_formatting_is_debug_of_the_enum() {
        assert_eq!(format!("{:?}", SyncJobStatus::Completed), "Completed");
    }

    #[test]
    fn cancellation_flag_defaults_unset() {
        let flag = AtomicBool::new(false);
        assert!(!flag.load(Ordering::Relaxed));
    }
}
