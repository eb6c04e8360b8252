// file: src/retrieval/rerank.rs
// description: cross-encoder reranking of retrieved nodes
// reference: https://docs.rs/fastembed

use crate::error::{RagError, Result};
use crate::models::{ScoredNode, sort_by_score};
use async_trait::async_trait;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    /// Rescores `nodes` against `query` and keeps the best `top_n`.
    async fn rerank(&self, query: &str, nodes: Vec<ScoredNode>, top_n: usize)
    -> Result<Vec<ScoredNode>>;
}

/// Keeps retrieval scores and truncates to `top_n`.
pub struct ScoreOrderReranker;

#[async_trait]
impl Reranker for ScoreOrderReranker {
    fn name(&self) -> &str {
        "none"
    }

    async fn rerank(
        &self,
        _query: &str,
        mut nodes: Vec<ScoredNode>,
        top_n: usize,
    ) -> Result<Vec<ScoredNode>> {
        sort_by_score(&mut nodes);
        nodes.truncate(top_n);
        Ok(nodes)
    }
}

pub fn resolve_reranker_model(name: &str) -> Result<RerankerModel> {
    let normalized = name.trim().to_lowercase();
    let short = normalized.rsplit('/').next().unwrap_or(&normalized);

    match short {
        "bge-reranker-base" => Ok(RerankerModel::BGERerankerBase),
        "bge-reranker-v2-m3" => Ok(RerankerModel::BGERerankerV2M3),
        "jina-reranker-v1-turbo-en" => Ok(RerankerModel::JINARerankerV1TurboEn),
        _ => Err(RagError::Config(format!(
            "Unsupported rerank model: {}",
            name
        ))),
    }
}

pub struct FastEmbedReranker {
    model: Arc<TextRerank>,
    model_name: String,
}

impl FastEmbedReranker {
    pub fn new(model_name: &str) -> Result<Self> {
        let model = resolve_reranker_model(model_name)?;
        info!("Loading rerank model {}", model_name);

        let options = RerankInitOptions::new(model).with_show_download_progress(true);
        let rerank = TextRerank::try_new(options).map_err(|e| {
            RagError::Embedding(format!("Failed to load rerank model {}: {}", model_name, e))
        })?;

        Ok(Self {
            model: Arc::new(rerank),
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl Reranker for FastEmbedReranker {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn rerank(
        &self,
        query: &str,
        nodes: Vec<ScoredNode>,
        top_n: usize,
    ) -> Result<Vec<ScoredNode>> {
        if nodes.is_empty() {
            return Ok(nodes);
        }

        let model = Arc::clone(&self.model);
        let query = query.to_string();
        let texts: Vec<String> = nodes.iter().map(|n| n.text().to_string()).collect();

        let results = tokio::task::spawn_blocking(move || {
            let documents: Vec<&str> = texts.iter().map(String::as_str).collect();
            model.rerank(query.as_str(), documents, false, None)
        })
        .await
        .map_err(|e| RagError::Embedding(format!("Rerank task failed: {}", e)))?
        .map_err(|e| RagError::Embedding(format!("Rerank failed: {}", e)))?;

        let mut slots: Vec<Option<ScoredNode>> = nodes.into_iter().map(Some).collect();
        let mut reranked = Vec::with_capacity(results.len());
        for result in results {
            if let Some(mut node) = slots.get_mut(result.index).and_then(Option::take) {
                node.score = result.score;
                reranked.push(node);
            }
        }

        sort_by_score(&mut reranked);
        reranked.truncate(top_n);
        debug!("Reranked to {} nodes with {}", reranked.len(), self.model_name);
        Ok(reranked)
    }
}

/// `"none"` disables cross-encoder scoring.
pub fn create_reranker(model_name: &str) -> Result<Arc<dyn Reranker>> {
    if model_name.trim().eq_ignore_ascii_case("none") {
        return Ok(Arc::new(ScoreOrderReranker));
    }
    Ok(Arc::new(FastEmbedReranker::new(model_name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextNode;
    use std::collections::BTreeMap;

    fn scored(position: usize, score: f32) -> ScoredNode {
        ScoredNode::new(
            TextNode::new("doc", 2, position, format!("node {}", position), None, BTreeMap::new()),
            score,
        )
    }

    #[tokio::test]
    async fn test_score_order_truncates() {
        let nodes = vec![scored(0, 0.1), scored(1, 0.9), scored(2, 0.5)];
        let reranked = ScoreOrderReranker.rerank("q", nodes, 2).await.unwrap();

        let scores: Vec<f32> = reranked.iter().map(|n| n.score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[test]
    fn test_resolve_reranker_model() {
        assert!(resolve_reranker_model("BAAI/bge-reranker-base").is_ok());
        assert!(resolve_reranker_model("jinaai/jina-reranker-v1-turbo-en").is_ok());
        assert!(matches!(
            resolve_reranker_model("cross-encoder/ms-marco"),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn test_none_creates_passthrough() {
        let reranker = create_reranker("None").unwrap();
        assert_eq!(reranker.name(), "none");
    }
}
