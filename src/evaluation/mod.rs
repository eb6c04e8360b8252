// file: src/evaluation/mod.rs
// description: response evaluation module exports
// reference: internal module structure

pub mod evaluator;
pub mod feedback;
pub mod recorder;

pub use evaluator::Evaluator;
pub use feedback::{FeedbackKind, FeedbackResult, LlmJudge, parse_judge_score};
pub use recorder::{EvaluationRecord, RecordStore};
