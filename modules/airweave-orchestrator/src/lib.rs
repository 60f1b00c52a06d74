//! The Sync Orchestrator component (spec §4.10 / C11): wires the source
//! adapter, DAG router, ledger, worker pool, and destination batchers
//! together and drives one sync job from start to a terminal status.

pub mod batcher;
pub mod counters;
pub mod embedder;
pub mod finalizer;
pub mod orchestrator;
pub mod types;

pub use batcher::{DestinationBatcher, PendingOp};
pub use counters::Counters;
pub use embedder::{Embedder, MockEmbedder};
pub use finalizer::OrchestratorFinalizer;
pub use orchestrator::{OrchestratorContext, SyncOrchestrator};
pub use types::{Sync, SyncJob, SyncJobStatus};
