// file: src/embeddings/mod.rs
// description: embedding provider abstraction, factory and vector math
// reference: internal module structure

pub mod hash;
pub mod local;
pub mod openai;

pub use hash::HashEmbeddingProvider;
pub use local::FastEmbedProvider;
pub use openai::OpenAiEmbeddingClient;

use crate::config::{EmbeddingBackend, LlmConfig};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no embedding".to_string()))
    }
}

pub fn create_provider(
    backend: EmbeddingBackend,
    model: &str,
    max_length: usize,
    batch_size: usize,
    llm: &LlmConfig,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match backend {
        EmbeddingBackend::Local => Ok(Arc::new(FastEmbedProvider::new(
            model, max_length, batch_size,
        )?)),
        EmbeddingBackend::OpenAi => {
            let api_key = llm.api_key.clone().ok_or_else(|| {
                RagError::Config("the openai embedding provider needs an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiEmbeddingClient::new(
                api_key,
                llm.base_url.clone(),
                model.to_string(),
                batch_size,
            )))
        }
        EmbeddingBackend::Hash => Ok(Arc::new(HashEmbeddingProvider::new(
            hash::DEFAULT_DIMENSION,
            max_length,
        ))),
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_openai_provider_requires_key() {
        let config = Config::default_config();
        let result = create_provider(
            EmbeddingBackend::OpenAi,
            "text-embedding-3-small",
            512,
            16,
            &config.llm,
        );
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[tokio::test]
    async fn test_embed_one_through_trait_object() {
        let config = Config::default_config();
        let provider =
            create_provider(EmbeddingBackend::Hash, "hash", 128, 8, &config.llm).unwrap();
        let vector = provider.embed_one("lawful processing").await.unwrap();
        assert_eq!(vector.len(), hash::DEFAULT_DIMENSION);
    }
}
