// file: src/embeddings/local.rs
// description: in-process sentence embeddings through fastembed ONNX models
// reference: https://docs.rs/fastembed

use super::EmbeddingProvider;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tracing::{debug, info};

/// Accepts Hugging Face ids with or without a `local:` prefix.
pub fn resolve_embedding_model(name: &str) -> Result<EmbeddingModel> {
    let normalized = name.trim().trim_start_matches("local:").to_lowercase();
    let short = normalized.rsplit('/').next().unwrap_or(&normalized);

    let model = match short {
        "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "all-minilm-l12-v2" => EmbeddingModel::AllMiniLML12V2,
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        "nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
        "multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        _ => {
            return Err(RagError::Config(format!(
                "Unsupported local embedding model: {}",
                name
            )));
        }
    };
    Ok(model)
}

pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    batch_size: usize,
}

impl FastEmbedProvider {
    pub fn new(model_name: &str, max_length: usize, batch_size: usize) -> Result<Self> {
        let model = resolve_embedding_model(model_name)?;
        info!(
            "Loading local embedding model {} (max_length {})",
            model_name, max_length
        );

        let options = InitOptions::new(model)
            .with_max_length(max_length)
            .with_show_download_progress(true);

        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            RagError::Embedding(format!("Failed to load model {}: {}", model_name, e))
        })?;

        Ok(Self {
            model: Arc::new(embedding),
            model_name: model_name.to_string(),
            batch_size: batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with {}", texts.len(), self.model_name);

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || model.embed(texts, Some(batch_size)))
            .await
            .map_err(|e| RagError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| RagError::Embedding(e.to_string()))
    }
}
