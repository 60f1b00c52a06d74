//! The File Chunker (spec §4.2): converts a materialized file's markdown
//! content into `ChunkEntity` records bounded by a character budget.
//! Ported from `default_file_chunker.py`'s `file_chunker` transformer.

use airweave_common::AirweaveError;
use airweave_entity::{ChunkEntity, Entity, FileEntity};
use async_trait::async_trait;

use crate::splitter::split_into_chunks;
use crate::Transformer;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5000;

/// Split `entity`'s already-converted markdown content into `FileChunk`
/// entities. `markdown_content` is expected to be what an upstream File
/// Converter (or Web Fetcher) produced; this transformer does no format
/// conversion itself. Each chunk's `entity_id` carries the chunk index so
/// it stays unique within `(sync_id, entity_type)` (spec §3 invariant 1)
/// while `parent_entity_id` ties it back to the original file. `chunk_index`
/// and `total_chunks` ride along in `payload` since plain `Entity` has no
/// dedicated fields for them the way `ChunkEntity` does.
pub fn chunk_entity(entity: &Entity, markdown_content: &str, max_chunk_size: usize) -> Vec<Entity> {
    if markdown_content.trim().is_empty() {
        tracing::warn!(entity_id = %entity.entity_id, "no content extracted from file");
        return Vec::new();
    }

    let pieces = split_into_chunks(markdown_content, max_chunk_size);
    let total_chunks = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .filter(|(_, piece)| !piece.trim().is_empty())
        .map(|(index, piece)| {
            let mut chunk = Entity::new(
                format!("{}-chunk-{}", entity.entity_id, index),
                "FileChunk",
                entity.provenance.clone(),
            );
            chunk.breadcrumbs = entity.breadcrumbs.clone();
            chunk.parent_entity_id = Some(entity.entity_id.clone());
            chunk.embeddable_fields = vec!["text".to_string()];
            chunk
                .payload
                .insert("text".to_string(), serde_json::Value::String(piece));
            chunk.payload.insert("chunk_index".to_string(), serde_json::json!(index));
            chunk.payload.insert("total_chunks".to_string(), serde_json::json!(total_chunks));
            chunk
        })
        .collect()
}

/// `FileEntity`/`ChunkEntity`-typed convenience wrapper over [`chunk_entity`]
/// for callers that already hold the specialized struct shapes.
pub fn chunk_file(file: &FileEntity, markdown_content: &str, max_chunk_size: usize) -> Vec<ChunkEntity> {
    chunk_entity(&file.base, markdown_content, max_chunk_size)
        .into_iter()
        .map(|mut chunk| {
            let index = chunk
                .payload
                .remove("chunk_index")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;
            let total = chunk
                .payload
                .remove("total_chunks")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;
            let text = chunk.payload.get("text").and_then(|v| v.as_str()).unwrap_or("").to_string();
            ChunkEntity::new(chunk, index, total, text)
        })
        .collect()
}

/// Wraps [`chunk_entity`] as a `Transformer` so the DAG Router can wire a
/// type-changing file-to-chunks edge (spec §4.2; DESIGN.md open question on
/// type-preserving vs type-changing transformers). Expects the incoming
/// entity's `payload["markdown_content"]` to already hold converted text —
/// produced upstream by a source adapter's lazy download-and-convert step,
/// never by this transformer itself.
pub struct FileChunkerTransformer {
    pub max_chunk_size: usize,
}

impl Default for FileChunkerTransformer {
    fn default() -> Self {
        Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE }
    }
}

#[async_trait]
impl Transformer for FileChunkerTransformer {
    fn name(&self) -> &str {
        "file_chunker"
    }

    async fn transform(&self, entity: Entity) -> Result<Vec<Entity>, AirweaveError> {
        let markdown = entity
            .payload
            .get("markdown_content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(chunk_entity(&entity, &markdown, self.max_chunk_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_entity::Provenance;
    use uuid::Uuid;

    fn file_entity(id: &str) -> FileEntity {
        let prov = Provenance {
            source_name: "drive".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        };
        let base = Entity::new(id, "DriveFile", prov);
        FileEntity::new(base, "https://example.com/doc.pdf", "application/pdf")
    }

    #[test]
    fn small_file_becomes_a_single_chunk() {
        let file = file_entity("f1");
        let chunks = chunk_file(&file, "hello world", DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].base.parent_entity_id.as_deref(), Some("f1"));
    }

    #[test]
    fn large_file_produces_multiple_chunks_within_budget() {
        let file = file_entity("f2");
        let body = (0..50)
            .map(|i| format!("# Section {i}\n\n{}", "lorem ipsum ".repeat(200)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_file(&file, &body, 2000);
        assert!(chunks.len() >= 3, "expected multiple chunks, got {}", chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.total_chunks, chunks.len());
            assert_eq!(chunk.base.entity_id, format!("f2-chunk-{i}"));
        }
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let file = file_entity("f3");
        assert!(chunk_file(&file, "   ", DEFAULT_MAX_CHUNK_SIZE).is_empty());
    }

    #[tokio::test]
    async fn transformer_reads_markdown_content_from_payload() {
        let prov = Provenance {
            source_name: "drive".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        };
        let mut entity = Entity::new("doc-1", "DriveFile", prov);
        entity
            .payload
            .insert("markdown_content".into(), serde_json::Value::String("hello world".into()));

        let transformer = FileChunkerTransformer::default();
        let chunks = transformer.transform(entity).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].entity_type, "FileChunk");
        assert_eq!(chunks[0].parent_entity_id.as_deref(), Some("doc-1"));
        assert_eq!(chunks[0].payload.get("chunk_index"), Some(&serde_json::json!(0)));
    }

    #[tokio::test]
    async fn transformer_with_no_markdown_content_yields_no_chunks() {
        let prov = Provenance {
            source_name: "drive".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        };
        let entity = Entity::new("doc-2", "DriveFile", prov);
        let transformer = FileChunkerTransformer::default();
        let chunks = transformer.transform(entity).await.unwrap();
        assert!(chunks.is_empty());
    }
}
