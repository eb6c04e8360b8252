// file: src/ingest/reader.rs
// description: reads split article files into documents with file metadata
// reference: https://docs.rs/walkdir

use crate::error::{RagError, Result};
use crate::models::ArticleDocument;
use crate::models::document::{META_FILE_NAME, META_FILE_PATH, META_FILE_SIZE, META_LAST_MODIFIED};
use crate::utils::Validator;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Loads every visible file directly inside a directory, sorted by name.
/// Symlinked files are read through their target; an entry that cannot be
/// read fails the whole load.
pub struct DocumentReader {
    input_dir: PathBuf,
}

impl DocumentReader {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    pub fn load_data(&self) -> Result<Vec<ArticleDocument>> {
        Validator::validate_directory(&self.input_dir)?;
        info!("Reading documents from {}", self.input_dir.display());

        let mut documents = Vec::new();

        for entry in WalkDir::new(&self.input_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                RagError::Validation(format!(
                    "Cannot read entry in {}: {}",
                    self.input_dir.display(),
                    e
                ))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if Self::is_hidden(path) {
                debug!("Skipping hidden file: {}", path.display());
                continue;
            }

            documents.push(Self::read_document(path)?);
        }

        info!("Loaded {} documents", documents.len());
        Ok(documents)
    }

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }

    fn read_document(path: &Path) -> Result<ArticleDocument> {
        let bytes = fs::read(path).map_err(|e| RagError::file(path, e))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let file_metadata = fs::metadata(path).map_err(|e| RagError::file(path, e))?;

        let file_path = path.display().to_string();
        let mut metadata = BTreeMap::new();
        metadata.insert(
            META_FILE_NAME.to_string(),
            path.file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        metadata.insert(META_FILE_PATH.to_string(), file_path.clone());
        metadata.insert(META_FILE_SIZE.to_string(), file_metadata.len().to_string());

        if let Ok(modified) = file_metadata.modified() {
            let modified: DateTime<Utc> = modified.into();
            metadata.insert(
                META_LAST_MODIFIED.to_string(),
                modified.format("%Y-%m-%d").to_string(),
            );
        }

        Ok(ArticleDocument::new(&file_path, text, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_visible_files_sorted() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Article 2.txt"), "two").unwrap();
        fs::write(temp.path().join("Article 1.txt"), "one").unwrap();
        fs::write(temp.path().join(".DS_Store"), "junk").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/Article 3.txt"), "three").unwrap();

        let documents = DocumentReader::new(temp.path()).load_data().unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].file_name(), Some("Article 1.txt"));
        assert_eq!(documents[0].text, "one");
        assert_eq!(documents[1].metadata.get(META_FILE_SIZE).unwrap(), "3");
        assert!(documents[1].metadata.contains_key(META_LAST_MODIFIED));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entry_fails_load() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Article 1.txt"), "one").unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("gone.txt"),
            temp.path().join("Article 2.txt"),
        )
        .unwrap();

        let result = DocumentReader::new(temp.path()).load_data();
        assert!(matches!(result, Err(RagError::Validation(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_article_is_read() {
        let temp = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("Article 4.txt"), "definitions").unwrap();
        std::os::unix::fs::symlink(
            source.path().join("Article 4.txt"),
            temp.path().join("Article 4.txt"),
        )
        .unwrap();

        let documents = DocumentReader::new(temp.path()).load_data().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].text, "definitions");
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(DocumentReader::new(temp.path().join("absent")).load_data().is_err());
    }
}
