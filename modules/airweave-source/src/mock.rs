use std::sync::Arc;

use async_trait::async_trait;

use airweave_entity::Entity;

use crate::adapter::{EntityStream, SourceAdapter};
use crate::produced::ProducedEntity;

/// A finite in-memory adapter, for orchestrator/ledger/router tests that
/// need a `SourceAdapter` without touching the network.
pub struct MockSourceAdapter {
    name: String,
    entities: Vec<Entity>,
}

impl MockSourceAdapter {
    pub fn new(name: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self { name: name.into(), entities }
    }
}

#[async_trait]
impl SourceAdapter for MockSourceAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_entities(self: Arc<Self>) -> EntityStream {
        let items: Vec<_> = self.entities.clone().into_iter().map(|e| Ok(ProducedEntity::Entity(e))).collect();
        Box::pin(futures::stream::iter(items))
    }
}
