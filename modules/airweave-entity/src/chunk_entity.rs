use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// A derived entity produced by a chunking transformer (spec §4.2). Chunks
/// share their parent's `entity_id` as `parent_entity_id` and carry their
/// position among siblings so a consumer can reassemble order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChunkEntity {
    #[serde(flatten)]
    pub base: Entity,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
}

impl ChunkEntity {
    pub fn new(base: Entity, chunk_index: usize, total_chunks: usize, text: impl Into<String>) -> Self {
        Self {
            base,
            chunk_index,
            total_chunks,
            text: text.into(),
        }
    }
}
