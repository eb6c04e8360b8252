// file: src/evaluation/recorder.rs
// description: evaluation records and their JSON-lines store
// reference: https://jsonlines.org

use crate::error::{RagError, Result};
use crate::evaluation::feedback::FeedbackResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub record_id: Uuid,
    pub app_id: String,
    pub input: String,
    pub output: String,
    pub feedback: Vec<FeedbackResult>,
    pub recorded_at: DateTime<Utc>,
}

impl EvaluationRecord {
    pub fn new(app_id: &str, input: &str, output: &str, feedback: Vec<FeedbackResult>) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            app_id: app_id.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            feedback,
            recorded_at: Utc::now(),
        }
    }
}

/// Appends one JSON object per line to `path`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the store, creating it and its directory if needed.
    pub fn reset(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RagError::file(parent, e))?;
        }
        fs::write(&self.path, "").map_err(|e| RagError::file(&self.path, e))?;
        info!("Reset evaluation records at {}", self.path.display());
        Ok(())
    }

    pub fn append(&self, record: &EvaluationRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RagError::file(&self.path, e))?;
        writeln!(file, "{}", line).map_err(|e| RagError::file(&self.path, e))?;
        debug!("Recorded evaluation {}", record.record_id);
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<EvaluationRecord>> {
        let content = fs::read_to_string(&self.path).map_err(|e| RagError::file(&self.path, e))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(RagError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(input: &str) -> EvaluationRecord {
        EvaluationRecord::new(
            "Automerging Query Engine",
            input,
            "answer",
            vec![FeedbackResult {
                name: "Answer Relevance".to_string(),
                result: 0.8,
                reasons: vec![],
            }],
        )
    }

    #[test]
    fn test_append_and_load() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("records/eval.jsonl"));
        store.reset().unwrap();

        store.append(&record("first")).unwrap();
        store.append(&record("second")).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].input, "second");
        assert_ne!(records[0].record_id, records[1].record_id);
    }

    #[test]
    fn test_reset_truncates() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("eval.jsonl"));
        store.append(&record("old")).unwrap();

        store.reset().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
