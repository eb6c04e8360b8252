// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{RagError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub matcher: MatcherConfig,
    pub retrieval: RetrievalConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub pdf_path: PathBuf,
    pub articles_dir: PathBuf,
    pub metadata_path: PathBuf,
    pub index_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    pub max_tokens: u32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// Which backend turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// fastembed ONNX models run in-process
    Local,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// deterministic token hashing, no model download
    Hash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub batch_size: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatcherConfig {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub top_k: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub chunk_sizes: Vec<usize>,
    pub similarity_top_k: usize,
    pub merge_ratio: f32,
    pub rerank_model: String,
    pub rerank_top_n: usize,
    pub max_context_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    pub enabled: bool,
    pub model: String,
    pub app_id: String,
    #[serde(default)]
    pub records_path: Option<PathBuf>,
}

fn default_max_length() -> usize {
    128
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GDPR_RAG")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| RagError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            paths: PathsConfig {
                pdf_path: PathBuf::from("data/GDPR Art 1-21.pdf"),
                articles_dir: PathBuf::from("data/articles"),
                metadata_path: PathBuf::from("data/metadata.txt"),
                index_dir: PathBuf::from("merging_index"),
            },
            llm: LlmConfig {
                model: "gpt-3.5-turbo".to_string(),
                temperature: 0.1,
                base_url: "https://api.openai.com/v1".to_string(),
                max_tokens: 512,
                api_key: None,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingBackend::Local,
                model: "BAAI/bge-small-en-v1.5".to_string(),
                batch_size: 32,
                max_length: 512,
            },
            matcher: MatcherConfig {
                provider: EmbeddingBackend::Local,
                model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                top_k: 3,
                max_length: 128,
            },
            retrieval: RetrievalConfig {
                chunk_sizes: vec![2048, 512, 128],
                similarity_top_k: 12,
                merge_ratio: 0.5,
                rerank_model: "BAAI/bge-reranker-base".to_string(),
                rerank_top_n: 6,
                max_context_chars: 12_000,
            },
            evaluation: EvaluationConfig {
                enabled: true,
                model: "gpt-3.5-turbo".to_string(),
                app_id: "Automerging Query Engine".to_string(),
                records_path: None,
            },
        }
    }

    /// Returns the API key, looking at the config value, then the
    /// environment, then (when `interactive`) the terminal.
    pub fn resolve_api_key(&mut self, interactive: bool) -> Result<String> {
        if let Some(key) = self.llm.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        let key = match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                debug!("Using API key from {}", API_KEY_ENV);
                key
            }
            _ if interactive => dialoguer::Password::new()
                .with_prompt("Please enter your OpenAI API Key")
                .interact()
                .map_err(|e| RagError::Config(format!("Failed to read API key: {}", e)))?,
            _ => {
                return Err(RagError::Config(format!(
                    "{} is not set and no api_key is configured",
                    API_KEY_ENV
                )));
            }
        };

        self.llm.api_key = Some(key.clone());
        Ok(key)
    }

    pub fn validate(&self) -> Result<()> {
        if self.matcher.top_k == 0 {
            return Err(RagError::Config(
                "matcher.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.similarity_top_k == 0 || self.retrieval.rerank_top_n == 0 {
            return Err(RagError::Config(
                "retrieval.similarity_top_k and retrieval.rerank_top_n must be greater than 0"
                    .to_string(),
            ));
        }

        Validator::validate_chunk_sizes(&self.retrieval.chunk_sizes)
            .map_err(|e| RagError::Config(format!("retrieval.chunk_sizes: {}", e)))?;
        Validator::validate_ratio("retrieval.merge_ratio", self.retrieval.merge_ratio)
            .map_err(|e| RagError::Config(e.to_string()))?;

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(RagError::Config(
                "llm.temperature must be between 0 and 2".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(RagError::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.max_length == 0 || self.matcher.max_length == 0 {
            return Err(RagError::Config(
                "max_length must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.max_context_chars == 0 {
            return Err(RagError::Config(
                "retrieval.max_context_chars must be greater than 0".to_string(),
            ));
        }

        Validator::validate_url(&self.llm.base_url)
            .map_err(|e| RagError::Config(format!("llm.base_url: {}", e)))?;

        Ok(())
    }
}
