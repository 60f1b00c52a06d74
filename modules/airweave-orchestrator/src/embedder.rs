//! Embedding is explicitly out of scope (spec's Non-goals exclude
//! "a specific embedding model/provider integration"); this is the opaque
//! vectorizer seam the orchestrator calls through, shaped after the
//! teacher pack's `TextEmbedder` trait
//! (`rootsignal-scout/src/infra/embedder.rs`).

use async_trait::async_trait;

use airweave_common::AirweaveError;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AirweaveError>;

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AirweaveError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(&text).await?);
        }
        Ok(out)
    }
}

/// Deterministic embedder for orchestrator tests: hashes each character's
/// byte value into a fixed-size vector so equal text always embeds to an
/// equal vector without pulling in a real model.
pub struct MockEmbedder {
    pub dims: usize,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dims: 8 }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AirweaveError> {
        let mut vector = vec![0.0f32; self.dims];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dims] += byte as f32;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::default();
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn embed_batch_default_impl_embeds_each_text() {
        let embedder = MockEmbedder::default();
        let batch = embedder.embed_batch(vec!["a".into(), "b".into()]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_ne!(batch[0], batch[1]);
    }
}
