//! Shared dependency container for the workflow layer, mirroring
//! `rootsignal-scout/src/workflows/mod.rs`'s `ScoutDeps`: long-lived,
//! cloneable resources built once at process start and handed to every
//! workflow/service impl.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use airweave_common::Config;
use airweave_credentials::CredentialStore;
use airweave_destination::DestinationAdapterRegistry;
use airweave_ledger::{EntityLedgerStore, SyncCursorStore};
use airweave_orchestrator::Embedder;
use airweave_progress::ProgressPublisher;
use airweave_source::SourceAdapterRegistry;
use airweave_transform::TransformerRegistry;

use crate::repository::SyncRepository;

/// In-process registry of cooperative cancellation flags, keyed by
/// sync_job_id. `RunSourceConnectionWorkflow::run` registers one before
/// starting the orchestrator; the `cancel` shared handler flips it —
/// Restate delivers that as a concurrent invocation on the same workflow
/// instance, not a runtime-level interrupt, so a plain shared flag is the
/// bridge between the two (see `DESIGN.md`'s cancellation-delivery note).
#[derive(Default)]
pub struct CancellationRegistry {
    flags: Mutex<HashMap<Uuid, Arc<AtomicBool>>>,
}

impl CancellationRegistry {
    pub fn register(&self, sync_job_id: Uuid) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.flags.lock().unwrap().insert(sync_job_id, flag.clone());
        flag
    }

    pub fn cancel(&self, sync_job_id: Uuid) -> bool {
        match self.flags.lock().unwrap().get(&sync_job_id) {
            Some(flag) => {
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, sync_job_id: Uuid) {
        self.flags.lock().unwrap().remove(&sync_job_id);
    }
}

pub struct WorkflowDeps {
    pub repository: Arc<SyncRepository>,
    pub source_registry: Arc<SourceAdapterRegistry>,
    pub destination_registry: Arc<DestinationAdapterRegistry>,
    pub transformers: Arc<TransformerRegistry>,
    pub credentials: Arc<CredentialStore>,
    pub ledger: Arc<EntityLedgerStore>,
    pub cursor_store: Arc<SyncCursorStore>,
    pub progress: Arc<ProgressPublisher>,
    pub embedder: Arc<dyn Embedder>,
    pub config: Arc<Config>,
    pub cancellations: CancellationRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_of_an_unregistered_job_reports_not_found() {
        let registry = CancellationRegistry::default();
        assert!(!registry.cancel(Uuid::new_v4()));
    }

    #[test]
    fn registered_flag_flips_when_cancelled() {
        let registry = CancellationRegistry::default();
        let job_id = Uuid::new_v4();
        let flag = registry.register(job_id);
        assert!(!flag.load(Ordering::Relaxed));
        assert!(registry.cancel(job_id));
        assert!(flag.load(Ordering::Relaxed));
    }
}
