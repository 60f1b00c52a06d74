//! The Transformer component (spec §4.2 / C3): pure functions from one
//! entity to zero-or-more entities, composed along DAG edges by the
//! Transformer ABI (spec §6). Each transformer here is a plain function
//! rather than a stateful object since none of the ported algorithms need
//! per-call setup; `Transformer` exists to give the DAG Router a uniform
//! trait object to hold regardless of which shape a given transformer has.

pub mod entity_field_chunker;
pub mod file_chunker;
pub mod file_converter;
pub mod splitter;
pub mod web_fetcher;

use std::collections::HashMap;
use std::sync::Arc;

use airweave_common::AirweaveError;
use airweave_entity::Entity;
use async_trait::async_trait;

pub use entity_field_chunker::{chunk_entity_fields, ChunkBudget, NON_CHUNKABLE_FIELDS};
pub use file_chunker::{chunk_entity, chunk_file, FileChunkerTransformer, DEFAULT_MAX_CHUNK_SIZE};
pub use file_converter::{ConverterRegistry, CsvConverter, FileConverter, HtmlConverter, JsonConverter, PlainTextConverter};
pub use splitter::split_into_chunks;
pub use web_fetcher::{fetch_as_file_entity, html_to_markdown};

/// A single DAG edge's transform step: takes one entity and produces zero
/// or more entities downstream. Implementations must be idempotent — the
/// orchestrator may invoke the same entity twice after a retry (spec §4.2).
#[async_trait]
pub trait Transformer: Send + Sync {
    /// The short name this transformer is registered under (spec §6).
    fn name(&self) -> &str;

    async fn transform(&self, entity: Entity) -> Result<Vec<Entity>, AirweaveError>;
}

/// Wraps `chunk_entity_fields` as a `Transformer` for DAG wiring.
pub struct EntityFieldChunkerTransformer {
    pub budget: ChunkBudget,
}

impl Default for EntityFieldChunkerTransformer {
    fn default() -> Self {
        Self { budget: ChunkBudget::default() }
    }
}

#[async_trait]
impl Transformer for EntityFieldChunkerTransformer {
    fn name(&self) -> &str {
        "entity_field_chunker"
    }

    async fn transform(&self, entity: Entity) -> Result<Vec<Entity>, AirweaveError> {
        Ok(chunk_entity_fields(entity, self.budget))
    }
}

/// Registry of transformers keyed by name, populated at startup the same
/// way the teacher wires dependencies in `rootsignal-core/src/deps.rs` —
/// a flat lookup table built once, handed to whatever needs to resolve a
/// DAG edge's transformer by name.
#[derive(Default)]
pub struct TransformerRegistry {
    by_name: HashMap<String, Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self { by_name: HashMap::new() }
    }

    pub fn register(&mut self, transformer: Arc<dyn Transformer>) {
        self.by_name.insert(transformer.name().to_string(), transformer);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transformer>> {
        self.by_name.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_entity::Provenance;
    use uuid::Uuid;

    fn provenance() -> Provenance {
        Provenance {
            source_name: "test".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        }
    }

    #[tokio::test]
    async fn registry_resolves_registered_transformer_by_name() {
        let mut registry = TransformerRegistry::new();
        registry.register(Arc::new(EntityFieldChunkerTransformer::default()));

        let transformer = registry.get("entity_field_chunker").expect("registered");
        let entity = Entity::new("e1", "Doc", provenance());
        let out = transformer.transform(entity).await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn unregistered_name_resolves_to_none() {
        let registry = TransformerRegistry::new();
        assert!(registry.get("nonexistent").is_none());
    }
}
