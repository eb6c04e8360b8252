// file: src/index/parser.rs
// description: hierarchical node parser producing parent/child chunks per document
// reference: multi-granularity chunking for auto-merging retrieval

use crate::models::{ArticleDocument, TextNode};
use crate::parser::patterns::SENTENCE_END;
use tracing::debug;

pub const DEFAULT_CHUNK_SIZES: [usize; 3] = [2048, 512, 128];

/// Splits documents into a tree of chunks, one tier per chunk size
/// (largest first). Sizes count whitespace-separated tokens.
#[derive(Debug, Clone)]
pub struct HierarchicalNodeParser {
    chunk_sizes: Vec<usize>,
}

impl HierarchicalNodeParser {
    pub fn new(chunk_sizes: Vec<usize>) -> Self {
        Self { chunk_sizes }
    }

    pub fn from_defaults() -> Self {
        Self::new(DEFAULT_CHUNK_SIZES.to_vec())
    }

    pub fn chunk_sizes(&self) -> &[usize] {
        &self.chunk_sizes
    }

    pub fn get_nodes_from_documents(&self, documents: &[ArticleDocument]) -> Vec<TextNode> {
        let mut nodes = Vec::new();
        for document in documents {
            let before = nodes.len();
            self.parse_document(document, &mut nodes);
            debug!(
                "Parsed {} nodes from {}",
                nodes.len() - before,
                document.file_name().unwrap_or(&document.doc_id)
            );
        }
        nodes
    }

    fn parse_document(&self, document: &ArticleDocument, nodes: &mut Vec<TextNode>) {
        let Some((&root_size, finer)) = self.chunk_sizes.split_first() else {
            return;
        };

        let mut level_start = nodes.len();
        for (position, chunk) in split_text(&document.text, root_size).into_iter().enumerate() {
            nodes.push(TextNode::new(
                &document.doc_id,
                0,
                position,
                chunk,
                None,
                document.metadata.clone(),
            ));
        }

        for (offset, &size) in finer.iter().enumerate() {
            let level = offset + 1;
            let level_end = nodes.len();
            let mut position = 0;

            for parent_index in level_start..level_end {
                let parent_id = nodes[parent_index].node_id.clone();
                let chunks = split_text(&nodes[parent_index].text, size);

                for chunk in chunks {
                    let child = TextNode::new(
                        &document.doc_id,
                        level,
                        position,
                        chunk,
                        Some(parent_id.clone()),
                        document.metadata.clone(),
                    );
                    nodes[parent_index].child_ids.push(child.node_id.clone());
                    nodes.push(child);
                    position += 1;
                }
            }

            level_start = level_end;
        }
    }
}

pub fn get_leaf_nodes(nodes: &[TextNode]) -> Vec<TextNode> {
    nodes.iter().filter(|node| node.is_leaf()).cloned().collect()
}

pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        result.push(&text[start..boundary.end()]);
        start = boundary.end();
    }
    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}

/// Packs whole sentences into chunks of at most `max_tokens` tokens;
/// a sentence longer than that is cut on word boundaries.
pub fn split_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_tokens = max_tokens.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |current: &mut Vec<&str>, chunks: &mut Vec<String>| {
        if !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
        }
    };

    for sentence in sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        if words.len() > max_tokens {
            flush(&mut current, &mut chunks);
            for piece in words.chunks(max_tokens) {
                chunks.push(piece.join(" "));
            }
            continue;
        }

        if current.len() + words.len() > max_tokens {
            flush(&mut current, &mut chunks);
        }
        current.extend(words);
    }

    flush(&mut current, &mut chunks);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::META_ARTICLE_NUMBER;
    use std::collections::{BTreeMap, HashMap};

    fn document(text: &str) -> ArticleDocument {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            META_ARTICLE_NUMBER.to_string(),
            "Article 6 - Lawfulness of processing".to_string(),
        );
        ArticleDocument::new("Article 6.txt", text.to_string(), metadata)
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {} covers lawful processing of data.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_split_text_respects_limit() {
        let chunks = split_text(&long_text(20), 20);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| token_count(chunk) <= 20));
    }

    #[test]
    fn test_split_text_keeps_sentences_whole() {
        let chunks = split_text("One two three. Four five six. Seven eight.", 6);
        assert_eq!(chunks, vec!["One two three. Four five six.", "Seven eight."]);
    }

    #[test]
    fn test_split_text_cuts_long_sentence() {
        let chunks = split_text("a b c d e f g", 3);
        assert_eq!(chunks, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(split_text("   ", 10).is_empty());
        let parser = HierarchicalNodeParser::new(vec![64, 16]);
        assert!(parser.get_nodes_from_documents(&[document("")]).is_empty());
    }

    #[test]
    fn test_hierarchy_links() {
        let parser = HierarchicalNodeParser::new(vec![120, 40, 10]);
        let nodes = parser.get_nodes_from_documents(&[document(&long_text(40))]);
        let by_id: HashMap<&str, &TextNode> =
            nodes.iter().map(|n| (n.node_id.as_str(), n)).collect();

        assert_eq!(by_id.len(), nodes.len());

        for node in &nodes {
            match &node.parent_id {
                None => assert_eq!(node.level, 0),
                Some(parent_id) => {
                    let parent = by_id[parent_id.as_str()];
                    assert_eq!(parent.level + 1, node.level);
                    assert!(parent.child_ids.contains(&node.node_id));
                }
            }
            assert_eq!(
                node.article_number(),
                Some("Article 6 - Lawfulness of processing")
            );
        }

        let leaves = get_leaf_nodes(&nodes);
        assert!(!leaves.is_empty());
        assert!(leaves.iter().all(|leaf| leaf.level == 2));
        assert!(leaves.iter().all(|leaf| token_count(&leaf.text) <= 10));
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let parser = HierarchicalNodeParser::new(vec![60, 15]);
        let docs = [document(&long_text(10))];
        assert_eq!(
            parser.get_nodes_from_documents(&docs),
            parser.get_nodes_from_documents(&docs)
        );
    }
}
