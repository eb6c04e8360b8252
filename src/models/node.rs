// file: src/models/node.rs
// description: hierarchical text node model shared by the parser, docstore and retriever
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::document::{META_ARTICLE_NUMBER, META_ARTICLE_SUMMARY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub node_id: String,
    pub doc_id: String,
    pub text: String,
    /// 0 is the coarsest tier; leaves carry the highest level.
    pub level: usize,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TextNode {
    pub fn new(
        doc_id: &str,
        level: usize,
        position: usize,
        text: String,
        parent_id: Option<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        let node_id = Self::compute_id(doc_id, level, position, &text);
        Self {
            node_id,
            doc_id: doc_id.to_string(),
            text,
            level,
            parent_id,
            child_ids: Vec::new(),
            metadata,
        }
    }

    fn compute_id(doc_id: &str, level: usize, position: usize, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(level.to_le_bytes());
        hasher.update(position.to_le_bytes());
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn is_leaf(&self) -> bool {
        self.child_ids.is_empty()
    }

    pub fn article_number(&self) -> Option<&str> {
        self.metadata.get(META_ARTICLE_NUMBER).map(String::as_str)
    }

    pub fn article_summary(&self) -> Option<&str> {
        self.metadata.get(META_ARTICLE_SUMMARY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_depends_on_position() {
        let a = TextNode::new("doc", 1, 0, "same".to_string(), None, BTreeMap::new());
        let b = TextNode::new("doc", 1, 1, "same".to_string(), None, BTreeMap::new());
        let c = TextNode::new("doc", 1, 0, "same".to_string(), None, BTreeMap::new());
        assert_ne!(a.node_id, b.node_id);
        assert_eq!(a.node_id, c.node_id);
        assert!(a.is_leaf());
    }
}
