// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod orchestrator;
pub mod progress;
pub mod query;

pub use orchestrator::{IngestOrchestrator, IngestReport};
pub use progress::{IndexStats, ProgressTracker};
pub use query::{QueryRunner, QueryTurn};
