// file: src/index/docstore.rs
// description: in-memory node store persisted as JSON next to the vector table
// reference: https://docs.rs/serde_json

use crate::error::{RagError, Result};
use crate::models::TextNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const DOCSTORE_FILE: &str = "docstore.json";

/// Model that produced the stored vectors, checked when the index is reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingInfo {
    pub model: String,
    pub dimension: usize,
}

#[derive(Serialize, Deserialize)]
struct PersistedDocStore {
    embedding: Option<EmbeddingInfo>,
    nodes: Vec<TextNode>,
}

/// Every node of every tier, keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct DocStore {
    nodes: HashMap<String, TextNode>,
    order: Vec<String>,
    embedding: Option<EmbeddingInfo>,
}

impl DocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = TextNode>) {
        for node in nodes {
            if !self.nodes.contains_key(&node.node_id) {
                self.order.push(node.node_id.clone());
            }
            self.nodes.insert(node.node_id.clone(), node);
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&TextNode> {
        self.nodes.get(node_id)
    }

    pub fn require(&self, node_id: &str) -> Result<&TextNode> {
        self.get(node_id)
            .ok_or_else(|| RagError::Index(format!("Node {} missing from docstore", node_id)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_leaf()).count()
    }

    pub fn embedding(&self) -> Option<&EmbeddingInfo> {
        self.embedding.as_ref()
    }

    pub fn set_embedding(&mut self, info: EmbeddingInfo) {
        self.embedding = Some(info);
    }

    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| RagError::file(dir, e))?;
        let path = dir.join(DOCSTORE_FILE);

        let persisted = PersistedDocStore {
            embedding: self.embedding.clone(),
            nodes: self.iter().cloned().collect(),
        };
        let json = serde_json::to_string(&persisted)?;
        fs::write(&path, json).map_err(|e| RagError::file(&path, e))?;

        info!("Persisted {} nodes to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DOCSTORE_FILE);
        let json = fs::read_to_string(&path).map_err(|e| RagError::file(&path, e))?;
        let persisted: PersistedDocStore = serde_json::from_str(&json)?;

        let mut store = Self::new();
        store.embedding = persisted.embedding;
        store.add_nodes(persisted.nodes);

        debug!("Loaded {} nodes from {}", store.len(), path.display());
        Ok(store)
    }
}
