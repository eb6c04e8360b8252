// file: src/retrieval/synthesizer.rs
// description: compact-and-refine answer synthesis over retrieved nodes
// reference: internal prompt pipeline

use crate::error::Result;
use crate::llm::ChatModel;
use crate::llm::prompts::{QA_SYSTEM_PROMPT, refine_prompt, text_qa_prompt};
use crate::models::ScoredNode;
use std::sync::Arc;
use tracing::debug;

pub const EMPTY_RESPONSE: &str = "Empty Response";

pub struct ResponseSynthesizer {
    llm: Arc<dyn ChatModel>,
    max_context_chars: usize,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn ChatModel>, max_context_chars: usize) -> Self {
        Self {
            llm,
            max_context_chars: max_context_chars.max(1),
        }
    }

    /// Packs node texts into as few prompts as fit, answers from the first
    /// and refines the answer with each following one.
    pub async fn synthesize(&self, query: &str, nodes: &[ScoredNode]) -> Result<String> {
        let texts: Vec<&str> = nodes.iter().map(ScoredNode::text).collect();
        let chunks = compact_chunks(&texts, self.max_context_chars);

        let Some((first, rest)) = chunks.split_first() else {
            return Ok(EMPTY_RESPONSE.to_string());
        };

        debug!("Synthesizing over {} context chunks", chunks.len());

        let mut answer = self
            .llm
            .complete(QA_SYSTEM_PROMPT, &text_qa_prompt(first, query))
            .await?;

        for chunk in rest {
            answer = self
                .llm
                .complete(QA_SYSTEM_PROMPT, &refine_prompt(query, &answer, chunk))
                .await?;
        }

        Ok(answer.trim().to_string())
    }
}

/// Joins texts with blank lines into chunks of at most `max_chars`
/// characters; a single oversized text is cut on char boundaries.
pub fn compact_chunks(texts: &[&str], max_chars: usize) -> Vec<String> {
    const SEPARATOR: &str = "\n\n";
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for text in texts.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let text_chars = text.chars().count();

        if text_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = text.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            text_chars
        } else {
            current_chars + SEPARATOR.len() + text_chars
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push_str(SEPARATOR);
            current_chars += SEPARATOR.len();
        }
        current.push_str(text);
        current_chars += text_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
