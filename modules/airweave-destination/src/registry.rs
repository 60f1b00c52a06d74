//! Adapter construction by destination connection id, mirroring
//! `airweave_source::registry::SourceAdapterRegistry`'s factory-dispatch
//! shape. The spec's Non-goals exclude any concrete vector store
//! integration, so only `MockDestination` ships a factory in this
//! workspace; a real deployment registers one factory per supported
//! destination (Qdrant, pgvector, ...) the same way it would register a
//! source short_name.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use airweave_common::AirweaveError;

use crate::adapter::DestinationAdapter;

pub type DestinationAdapterFactory =
    Arc<dyn Fn(Uuid, Value) -> Result<Arc<dyn DestinationAdapter>, AirweaveError> + Send + Sync>;

#[derive(Default)]
pub struct DestinationAdapterRegistry {
    factories: HashMap<String, DestinationAdapterFactory>,
}

impl DestinationAdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: DestinationAdapterFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Constructs a fresh adapter instance for one job's destination node.
    /// `connection_id` identifies the destination connection row;
    /// `config` is its per-connection config, opaque to the registry.
    pub fn create(
        &self,
        kind: &str,
        connection_id: Uuid,
        config: Value,
    ) -> Result<Arc<dyn DestinationAdapter>, AirweaveError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| AirweaveError::Config(format!("no destination adapter registered for {kind}")))?;
        factory(connection_id, config)
    }
}
