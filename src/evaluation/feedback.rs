// file: src/evaluation/feedback.rs
// description: LLM-judged relevance and groundedness feedback functions
// reference: LLM-as-judge scoring on a 0-10 scale normalised to [0, 1]

use crate::error::Result;
use crate::llm::ChatModel;
use crate::llm::prompts::{
    answer_relevance_prompt, answer_relevance_system, context_relevance_prompt,
    context_relevance_system, groundedness_prompt, groundedness_system,
};
use crate::parser::patterns::{JUDGE_SCORE, SENTENCE_END};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    AnswerRelevance,
    ContextRelevance,
    Groundedness,
}

impl FeedbackKind {
    pub const ALL: [FeedbackKind; 3] = [
        FeedbackKind::AnswerRelevance,
        FeedbackKind::ContextRelevance,
        FeedbackKind::Groundedness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeedbackKind::AnswerRelevance => "Answer Relevance",
            FeedbackKind::ContextRelevance => "Context Relevance",
            FeedbackKind::Groundedness => "Groundedness",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub name: String,
    /// In `[0, 1]`.
    pub result: f32,
    /// Raw judge replies, one per call.
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Reads a 0-10 judge reply as a score in `[0, 1]`. A number following
/// "score" wins over any other number in the reply.
pub fn parse_judge_score(reply: &str) -> Option<f32> {
    let mut fallback = None;

    for captures in JUDGE_SCORE.captures_iter(reply) {
        if let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<f32>().ok()) {
            return Some(normalize(value));
        }
        if fallback.is_none() {
            fallback = captures.get(2).and_then(|m| m.as_str().parse::<f32>().ok());
        }
    }

    fallback.map(normalize)
}

fn normalize(value: f32) -> f32 {
    (value / 10.0).clamp(0.0, 1.0)
}

fn statements(answer: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(answer) {
        result.push(answer[start..boundary.end()].trim().to_string());
        start = boundary.end();
    }
    result.push(answer[start..].trim().to_string());
    result.retain(|s| !s.is_empty());
    result
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

pub struct LlmJudge {
    llm: Arc<dyn ChatModel>,
}

impl LlmJudge {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    async fn score(&self, system: &str, prompt: &str) -> Result<(f32, String)> {
        let reply = self.llm.complete(system, prompt).await?;
        let score = parse_judge_score(&reply).unwrap_or_else(|| {
            warn!("Judge reply had no score, counting as 0: {:?}", reply);
            0.0
        });
        debug!("Judge score {:.2}", score);
        Ok((score, reply))
    }

    pub async fn answer_relevance(&self, question: &str, answer: &str) -> Result<FeedbackResult> {
        let (score, reason) = self
            .score(
                &answer_relevance_system(),
                &answer_relevance_prompt(question, answer),
            )
            .await?;

        Ok(FeedbackResult {
            name: FeedbackKind::AnswerRelevance.name().to_string(),
            result: score,
            reasons: vec![reason],
        })
    }

    /// Mean relevance of each source text to the question.
    pub async fn context_relevance(
        &self,
        question: &str,
        contexts: &[&str],
    ) -> Result<FeedbackResult> {
        let mut scores = Vec::with_capacity(contexts.len());
        let mut reasons = Vec::with_capacity(contexts.len());

        for context in contexts {
            let (score, reason) = self
                .score(
                    &context_relevance_system(),
                    &context_relevance_prompt(question, context),
                )
                .await?;
            scores.push(score);
            reasons.push(reason);
        }

        Ok(FeedbackResult {
            name: FeedbackKind::ContextRelevance.name().to_string(),
            result: mean(&scores),
            reasons,
        })
    }

    /// Mean support of each answer sentence by the joined sources.
    pub async fn groundedness(&self, contexts: &[&str], answer: &str) -> Result<FeedbackResult> {
        let source = contexts.join("\n\n");
        let mut scores = Vec::new();
        let mut reasons = Vec::new();

        for statement in statements(answer) {
            let (score, reason) = self
                .score(&groundedness_system(), &groundedness_prompt(&source, &statement))
                .await?;
            scores.push(score);
            reasons.push(reason);
        }

        Ok(FeedbackResult {
            name: FeedbackKind::Groundedness.name().to_string(),
            result: mean(&scores),
            reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_labelled_score() {
        assert_eq!(parse_judge_score("Score: 7\nSupporting Evidence: ok"), Some(0.7));
        assert_eq!(parse_judge_score("1. Criteria met\nscore = 9"), Some(0.9));
    }

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(parse_judge_score("8/10"), Some(0.8));
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        assert_eq!(parse_judge_score("Score: 15"), Some(1.0));
    }

    #[test]
    fn test_parse_without_number() {
        assert_eq!(parse_judge_score("not sure"), None);
    }

    #[test]
    fn test_statements_split_sentences() {
        assert_eq!(
            statements("Consent is required. It can be withdrawn!  "),
            vec!["Consent is required.", "It can be withdrawn!"]
        );
    }

    #[test]
    fn test_mean_of_nothing() {
        assert_eq!(mean(&[]), 0.0);
    }
}
