// file: src/evaluation/evaluator.rs
// description: scores a query response with every feedback and records the result
// reference: internal module structure

use crate::error::Result;
use crate::evaluation::feedback::LlmJudge;
use crate::evaluation::recorder::{EvaluationRecord, RecordStore};
use crate::llm::ChatModel;
use crate::models::QueryResponse;
use std::sync::Arc;
use tracing::info;

pub struct Evaluator {
    judge: LlmJudge,
    app_id: String,
    store: Option<RecordStore>,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn ChatModel>, app_id: impl Into<String>) -> Self {
        Self {
            judge: LlmJudge::new(llm),
            app_id: app_id.into(),
            store: None,
        }
    }

    pub fn with_store(mut self, store: RecordStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Clears earlier records so a session starts from an empty store.
    pub fn reset_records(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.reset(),
            None => Ok(()),
        }
    }

    pub async fn evaluate(&self, query: &str, response: &QueryResponse) -> Result<EvaluationRecord> {
        let contexts = response.source_texts();

        let feedback = vec![
            self.judge.answer_relevance(query, &response.answer).await?,
            self.judge.context_relevance(query, &contexts).await?,
            self.judge.groundedness(&contexts, &response.answer).await?,
        ];

        let record = EvaluationRecord::new(&self.app_id, query, &response.answer, feedback);

        if let Some(store) = &self.store {
            store.append(&record)?;
        }

        info!("Evaluated response for app {}", self.app_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::feedback::FeedbackKind;
    use crate::llm::ChatMessage;
    use crate::models::{ScoredNode, TextNode};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    struct FixedJudge;

    #[async_trait]
    impl ChatModel for FixedJudge {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            let system = &messages[0].content;
            let reply = if system.contains("INFORMATION OVERLAP") {
                "Score: 6"
            } else if system.contains("CONTEXT") {
                "Score: 4"
            } else {
                "Score: 9"
            };
            Ok(reply.to_string())
        }
    }

    fn response() -> QueryResponse {
        let node = |position: usize, text: &str| {
            ScoredNode::new(
                TextNode::new("doc", 2, position, text.to_string(), None, BTreeMap::new()),
                0.5,
            )
        };
        QueryResponse {
            answer: "Consent must be freely given. It can be withdrawn.".to_string(),
            source_nodes: vec![node(0, "Article 7 text"), node(1, "Article 4 text")],
        }
    }

    #[tokio::test]
    async fn test_evaluate_produces_three_feedbacks() {
        let evaluator = Evaluator::new(Arc::new(FixedJudge), "Automerging Query Engine");
        let record = evaluator.evaluate("what is consent?", &response()).await.unwrap();

        let names: Vec<&str> = record.feedback.iter().map(|f| f.name.as_str()).collect();
        let expected: Vec<&str> = FeedbackKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, expected);

        assert!((record.feedback[0].result - 0.9).abs() < 1e-6);
        assert!((record.feedback[1].result - 0.4).abs() < 1e-6);
        assert_eq!(record.feedback[1].reasons.len(), 2);
        assert!((record.feedback[2].result - 0.6).abs() < 1e-6);
        assert_eq!(record.feedback[2].reasons.len(), 2);
        assert!(record.feedback.iter().all(|f| (0.0..=1.0).contains(&f.result)));
    }

    #[tokio::test]
    async fn test_records_appended_to_store() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("eval.jsonl"));
        let evaluator =
            Evaluator::new(Arc::new(FixedJudge), "app").with_store(store.clone());

        evaluator.reset_records().unwrap();
        evaluator.evaluate("q", &response()).await.unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].app_id, "app");
    }
}
