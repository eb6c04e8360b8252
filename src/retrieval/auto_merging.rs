// file: src/retrieval/auto_merging.rs
// description: leaf retrieval with promotion to parent nodes when most siblings match
// reference: hierarchical auto-merging retrieval

use crate::database::article_filter;
use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::index::{AutoMergingIndex, DocStore};
use crate::models::{ScoredNode, sort_by_score};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AutoMergingRetriever {
    index: Arc<AutoMergingIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    similarity_top_k: usize,
    merge_ratio: f32,
}

impl AutoMergingRetriever {
    pub fn new(
        index: Arc<AutoMergingIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        similarity_top_k: usize,
        merge_ratio: f32,
    ) -> Self {
        Self {
            index,
            embedder,
            similarity_top_k,
            merge_ratio,
        }
    }

    /// Retrieves leaves for `query`, restricted to `article_keys` when any
    /// are given, then merges them into parents.
    pub async fn retrieve(&self, query: &str, article_keys: &[String]) -> Result<Vec<ScoredNode>> {
        let embedding = self.embedder.embed_one(query).await?;
        let filter = article_filter(article_keys);

        let hits = self
            .index
            .client()
            .vector_search(embedding, self.similarity_top_k, filter.as_deref())
            .await?;

        let docstore = self.index.docstore();
        let mut leaves = Vec::with_capacity(hits.len());
        for hit in hits {
            match docstore.get(&hit.node_id) {
                Some(node) => leaves.push(ScoredNode::new(node.clone(), hit.score)),
                None => warn!("Vector hit {} is not in the docstore", hit.node_id),
            }
        }

        let retrieved = leaves.len();
        let merged = merge_nodes(leaves, docstore, self.merge_ratio);
        debug!(
            "Retrieved {} leaves, {} nodes after merging",
            retrieved,
            merged.len()
        );
        Ok(merged)
    }
}

/// Replaces groups of sibling nodes with their parent whenever the group
/// covers more than `merge_ratio` of the parent's children. The parent
/// scores the mean of the merged children. Repeats until no group qualifies,
/// so merges can climb several tiers.
pub fn merge_nodes(nodes: Vec<ScoredNode>, docstore: &DocStore, merge_ratio: f32) -> Vec<ScoredNode> {
    let mut nodes = nodes;

    loop {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, scored) in nodes.iter().enumerate() {
            if let Some(parent_id) = scored.node.parent_id.as_deref() {
                groups.entry(parent_id).or_default().push(index);
            }
        }

        let mut merges: Vec<(String, Vec<usize>)> = groups
            .into_iter()
            .filter_map(|(parent_id, members)| {
                let parent = docstore.get(parent_id)?;
                let total = parent.child_ids.len();
                if total == 0 {
                    return None;
                }
                let ratio = members.len() as f32 / total as f32;
                (ratio > merge_ratio).then(|| (parent_id.to_string(), members))
            })
            .collect();

        if merges.is_empty() {
            break;
        }

        merges.sort_by_key(|(_, members)| members[0]);

        let mut consumed = vec![false; nodes.len()];
        let mut parents = Vec::with_capacity(merges.len());
        for (parent_id, members) in merges {
            let Some(parent) = docstore.get(&parent_id) else {
                continue;
            };
            let score =
                members.iter().map(|&i| nodes[i].score).sum::<f32>() / members.len() as f32;
            for &i in &members {
                consumed[i] = true;
            }
            debug!(
                "Merging {} of {} children into {}",
                members.len(),
                parent.child_ids.len(),
                parent_id
            );
            parents.push(ScoredNode::new(parent.clone(), score));
        }

        nodes = nodes
            .into_iter()
            .zip(consumed)
            .filter_map(|(node, used)| (!used).then_some(node))
            .chain(parents)
            .collect();
    }

    sort_by_score(&mut nodes);
    nodes
}
