// file: src/embeddings/hash.rs
// description: deterministic offline embeddings from hashed, mean-pooled tokens
// reference: fallback embedding generation without a model

use super::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

pub const DEFAULT_DIMENSION: usize = 256;

/// Maps every token to a pseudo-random vector derived from its hash and
/// mean-pools the first `max_length` tokens. Identical texts always map to
/// identical vectors; texts sharing vocabulary land close together.
pub struct HashEmbeddingProvider {
    dimension: usize,
    max_length: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize, max_length: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            max_length: max_length.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.dimension);
        let mut block = 0u32;

        while values.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            hasher.update(block.to_le_bytes());
            for byte in hasher.finalize() {
                if values.len() == self.dimension {
                    break;
                }
                values.push(byte as f32 / 127.5 - 1.0);
            }
            block += 1;
        }

        values
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut pooled = vec![0.0f32; self.dimension];
        let mut count = 0usize;

        for token in Self::tokenize(text).take(self.max_length) {
            for (slot, value) in pooled.iter_mut().zip(self.token_vector(&token)) {
                *slot += value;
            }
            count += 1;
        }

        if count > 0 {
            for slot in pooled.iter_mut() {
                *slot /= count as f32;
            }
        }
        pooled
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn model_name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
