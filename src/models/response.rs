// file: src/models/response.rs
// description: retrieval and answer models with similarity scores
// reference: Used for vector similarity search results

use serde::{Deserialize, Serialize};

use super::node::TextNode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: TextNode,

    /// Similarity score (higher is more similar)
    pub score: f32,
}

impl ScoredNode {
    pub fn new(node: TextNode, score: f32) -> Self {
        Self { node, score }
    }

    pub fn node_id(&self) -> &str {
        &self.node.node_id
    }

    pub fn text(&self) -> &str {
        &self.node.text
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = match self.node.text.char_indices().nth(max_content_len) {
            Some((cut, _)) => format!("{}...", &self.node.text[..cut]),
            None => self.node.text.clone(),
        };

        format!(
            "Score: {:.4} | {}\n{}\n",
            self.score,
            self.node.article_number().unwrap_or("unknown article"),
            content_preview
        )
    }
}

/// Highest score first; equal scores keep their relative order.
pub fn sort_by_score(nodes: &mut [ScoredNode]) {
    nodes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Synthesized answer plus the nodes it was generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub source_nodes: Vec<ScoredNode>,
}

impl QueryResponse {
    pub fn top_source(&self) -> Option<&ScoredNode> {
        self.source_nodes.first()
    }

    pub fn source_texts(&self) -> Vec<&str> {
        self.source_nodes.iter().map(ScoredNode::text).collect()
    }
}

impl std::fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.answer)
    }
}
