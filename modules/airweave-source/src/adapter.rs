//! Source Adapter ABI (spec §4.1, §6): "a new adapter instance is created
//! per job; construction receives a decrypted credentials struct and a
//! per-source config struct." The construction step is adapter-specific
//! (see `registry.rs`); this trait is what every adapter exposes once built.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;

use airweave_common::AirweaveError;

use crate::produced::ProducedEntity;

pub type EntityStream = Pin<Box<dyn Stream<Item = Result<ProducedEntity, AirweaveError>> + Send>>;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// For `direct`-auth sources only (spec §4.1): probes the credential
    /// without generating entities. OAuth sources validate implicitly by
    /// virtue of the credential store having refreshed the token already.
    async fn validate_auth(&self) -> Result<bool, AirweaveError> {
        Ok(true)
    }

    /// If the source supports cursored reads, the orchestrator calls this
    /// before `generate_entities` with the value loaded from
    /// `SyncCursorStore` (spec §4.10 step 3). Sources without cursor
    /// support ignore it.
    fn load_cursor(&mut self, _cursor: Option<serde_json::Value>) {}

    /// The opaque cursor value to persist after this job, if the source
    /// produced one. `None` leaves the stored cursor untouched.
    fn cursor(&self) -> Option<serde_json::Value> {
        None
    }

    /// Consumes the adapter and returns its lazy, finite entity sequence.
    /// Adapters are single-use (spec §4.1: "support being consumed once;
    /// restartability is not required").
    fn generate_entities(self: Arc<Self>) -> EntityStream;
}
