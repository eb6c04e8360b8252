// file: src/matcher.rs
// description: semantic top-k lookup of article keys by their summaries
// reference: cosine similarity over sentence embeddings

use crate::embeddings::{EmbeddingProvider, cosine_similarity};
use crate::error::{RagError, Result};
use crate::parser::ArticleSummaries;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Holds one embedding per summary for its whole lifetime. Build a new
/// matcher when the summaries change.
pub struct SummaryMatcher {
    k: usize,
    embedder: Arc<dyn EmbeddingProvider>,
    doc_names: Vec<String>,
    summaries: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl SummaryMatcher {
    pub async fn new(
        k: usize,
        embedder: Arc<dyn EmbeddingProvider>,
        summaries: &ArticleSummaries,
    ) -> Result<Self> {
        if summaries.is_empty() {
            return Err(RagError::Config(
                "article summaries are required to build the summary matcher".to_string(),
            ));
        }

        if k == 0 {
            return Err(RagError::Config(
                "the summary matcher needs k greater than 0".to_string(),
            ));
        }

        let k = if k > summaries.len() {
            warn!(
                "Requested {} matches but only {} summaries exist, returning at most {}",
                k,
                summaries.len(),
                summaries.len()
            );
            summaries.len()
        } else {
            k
        };

        let (doc_names, texts): (Vec<String>, Vec<String>) = summaries
            .iter()
            .map(|(key, summary)| (key.to_string(), summary.to_string()))
            .unzip();

        info!(
            "Encoding {} summaries with {}",
            texts.len(),
            embedder.model_name()
        );
        let embeddings = embedder.embed(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} summary embeddings, received {}",
                texts.len(),
                embeddings.len()
            )));
        }

        Ok(Self {
            k,
            embedder,
            doc_names,
            summaries: texts,
            embeddings,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.doc_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_names.is_empty()
    }

    pub fn summary(&self, doc_name: &str) -> Option<&str> {
        self.doc_names
            .iter()
            .position(|name| name == doc_name)
            .map(|index| self.summaries[index].as_str())
    }

    /// Every article key with its similarity to `query`, most similar first.
    pub async fn compute_scores(&self, query: &str) -> Result<Vec<(String, f32)>> {
        let query_embedding = self.embedder.embed_one(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .map(|embedding| cosine_similarity(&query_embedding, embedding))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .map(|(index, score)| (self.doc_names[index].clone(), score))
            .collect())
    }

    /// The `k` article keys whose summaries are closest to `query`.
    pub async fn compute_similarity(&self, query: &str) -> Result<Vec<String>> {
        let top: Vec<String> = self
            .compute_scores(query)
            .await?
            .into_iter()
            .take(self.k)
            .map(|(name, _)| name)
            .collect();

        debug!("Top {} articles for query: {:?}", self.k, top);
        Ok(top)
    }
}
