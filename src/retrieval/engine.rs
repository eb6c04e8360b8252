// file: src/retrieval/engine.rs
// description: query engine chaining retrieval, reranking and synthesis
// reference: internal module structure

use crate::error::Result;
use crate::models::QueryResponse;
use crate::retrieval::auto_merging::AutoMergingRetriever;
use crate::retrieval::rerank::Reranker;
use crate::retrieval::synthesizer::ResponseSynthesizer;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RetrieverQueryEngine {
    retriever: AutoMergingRetriever,
    reranker: Arc<dyn Reranker>,
    synthesizer: ResponseSynthesizer,
    rerank_top_n: usize,
}

impl RetrieverQueryEngine {
    pub fn new(
        retriever: AutoMergingRetriever,
        reranker: Arc<dyn Reranker>,
        synthesizer: ResponseSynthesizer,
        rerank_top_n: usize,
    ) -> Self {
        Self {
            retriever,
            reranker,
            synthesizer,
            rerank_top_n,
        }
    }

    /// Answers `query` from nodes of the given articles, or from the whole
    /// index when `article_keys` is empty.
    pub async fn query(&self, query: &str, article_keys: &[String]) -> Result<QueryResponse> {
        let retrieved = self.retriever.retrieve(query, article_keys).await?;
        let source_nodes = self
            .reranker
            .rerank(query, retrieved, self.rerank_top_n)
            .await?;

        info!(
            "Answering from {} nodes reranked by {}",
            source_nodes.len(),
            self.reranker.name()
        );
        for node in &source_nodes {
            debug!("{}", node.format_summary(120));
        }

        let answer = self.synthesizer.synthesize(query, &source_nodes).await?;
        Ok(QueryResponse {
            answer,
            source_nodes,
        })
    }
}
