//! Chunks a single oversized text field of an entity rather than the whole
//! entity (spec §4.2's Entity Field Chunker). Ported from
//! `entity_field_chunker.py`; the one substitution from the original is
//! the semantic chunker (`chonkie.SemanticChunker`, Python-only) which is
//! replaced by the File Chunker's own header/paragraph splitter per
//! `SPEC_FULL.md` §C.4 — there is no equivalent crate in the workspace's
//! dependency set, and reusing the conservative splitter keeps behavior
//! predictable rather than introducing a second bespoke algorithm.

use std::collections::HashMap;

use airweave_entity::Entity;

use crate::splitter::split_into_chunks;

/// System fields that are never chosen as the field to chunk, regardless
/// of size — chunking them would corrupt identity, routing, or ledger
/// linkage.
pub const NON_CHUNKABLE_FIELDS: &[&str] = &[
    "entity_id",
    "breadcrumbs",
    "db_entity_id",
    "source_name",
    "sync_id",
    "sync_job_id",
    "url",
    "sync_metadata",
    "parent_entity_id",
    "vector",
    "chunk_index",
];

/// Conservative stand-in for a real tokenizer: ~4 characters per token,
/// which is the same ballpark the teacher's reference `count_tokens`-style
/// helpers target for English prose without pulling in a tokenizer crate
/// the rest of the workspace has no other use for.
pub fn count_tokens(text: &str) -> usize {
    (text.chars().count() + 3) / 4
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkBudget {
    pub max_chunk_size: usize,
    pub margin_of_error: usize,
    pub metadata_size: usize,
}

impl Default for ChunkBudget {
    fn default() -> Self {
        Self {
            max_chunk_size: 8192,
            margin_of_error: 200,
            metadata_size: 500,
        }
    }
}

fn field_sizes(payload: &serde_json::Map<String, serde_json::Value>) -> HashMap<String, usize> {
    payload
        .iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k.clone(), count_tokens(s))),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Some((k.clone(), count_tokens(&v.to_string())))
            }
            _ => None,
        })
        .collect()
}

fn find_field_to_chunk(
    payload: &serde_json::Map<String, serde_json::Value>,
    sizes: &HashMap<String, usize>,
) -> Option<(String, usize)> {
    let mut best: Option<(String, usize)> = None;
    for (field, size) in sizes {
        if NON_CHUNKABLE_FIELDS.contains(&field.as_str()) {
            continue;
        }
        if !matches!(payload.get(field), Some(serde_json::Value::String(_))) {
            continue;
        }
        if best.as_ref().map(|(_, best_size)| *size > *best_size).unwrap_or(true) {
            best = Some((field.clone(), *size));
        }
    }
    best
}

/// Chunk the single largest chunkable field of `entity`, producing one
/// clone of the entity per chunk with `chunk_index` set and the chunked
/// field replaced by that chunk's slice. Entities already below budget, or
/// entities that are already a chunk (`payload["chunk_index"]` present),
/// pass through unchanged.
pub fn chunk_entity_fields(entity: Entity, budget: ChunkBudget) -> Vec<Entity> {
    if entity.payload.contains_key("chunk_index") {
        return vec![entity];
    }

    let sizes = field_sizes(&entity.payload);
    let total_size: usize = sizes.values().sum();

    if total_size <= budget.max_chunk_size.saturating_sub(budget.margin_of_error) {
        return vec![entity];
    }

    let Some((field, field_size)) = find_field_to_chunk(&entity.payload, &sizes) else {
        tracing::warn!(
            entity_id = %entity.entity_id,
            total_size,
            max = budget.max_chunk_size,
            "entity exceeds max size but no suitable field found for chunking"
        );
        return vec![entity];
    };

    let overhead = total_size.saturating_sub(field_size);
    let target_chunk_size = (budget.max_chunk_size as i64 - overhead as i64 - budget.metadata_size as i64)
        .max(1) as usize;
    let target_chunk_size = if overhead + budget.metadata_size >= budget.max_chunk_size {
        ((budget.max_chunk_size as f64) * 0.2).max(100.0) as usize
    } else {
        target_chunk_size
    };

    let field_text = entity
        .payload
        .get(&field)
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    // Token budget -> approximate character budget for the shared splitter.
    let char_budget = target_chunk_size.saturating_mul(4).max(1);
    let pieces = split_into_chunks(field_text, char_budget);
    if pieces.is_empty() {
        return vec![entity];
    }

    let parent_entity_id = entity.entity_id.clone();
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let mut clone = entity.clone();
            clone.entity_id = format!("{parent_entity_id}-chunk-{i}");
            clone.parent_entity_id = Some(parent_entity_id.clone());
            clone.payload.insert(field.clone(), serde_json::Value::String(piece));
            clone
                .payload
                .insert("chunk_index".to_string(), serde_json::Value::from(i));
            clone
        })
        .collect()
}
