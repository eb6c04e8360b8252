// file: src/models/document.rs
// description: article document model produced by the splitter and directory reader
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const META_FILE_NAME: &str = "file_name";
pub const META_FILE_PATH: &str = "file_path";
pub const META_FILE_SIZE: &str = "file_size";
pub const META_LAST_MODIFIED: &str = "last_modified_date";
pub const META_ARTICLE_NUMBER: &str = "article_number";
pub const META_ARTICLE_SUMMARY: &str = "article_summary";

/// Text of one article as cut out of the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleText {
    pub number: String,
    pub text: String,
}

impl ArticleText {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            text: String::new(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("Article {}.txt", self.number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub doc_id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl ArticleDocument {
    pub fn new(file_path: &str, text: String, metadata: BTreeMap<String, String>) -> Self {
        Self {
            doc_id: Self::compute_id(file_path),
            text,
            metadata,
        }
    }

    fn compute_id(file_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(file_path.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get(META_FILE_NAME).map(String::as_str)
    }

    /// `"Article 5.txt"` -> `"Article 5"`: the file name up to its first period.
    pub fn article_label(&self) -> Option<&str> {
        self.file_name()
            .and_then(|name| name.split('.').next())
            .filter(|label| !label.is_empty())
    }

    pub fn article_number(&self) -> Option<&str> {
        self.metadata.get(META_ARTICLE_NUMBER).map(String::as_str)
    }

    pub fn article_summary(&self) -> Option<&str> {
        self.metadata.get(META_ARTICLE_SUMMARY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(file_name: &str) -> ArticleDocument {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_FILE_NAME.to_string(), file_name.to_string());
        ArticleDocument::new(
            &format!("data/articles/{}", file_name),
            "text".to_string(),
            metadata,
        )
    }

    #[test]
    fn test_article_label_from_file_name() {
        assert_eq!(document("Article 5.txt").article_label(), Some("Article 5"));
        assert_eq!(document("Article 12").article_label(), Some("Article 12"));
        assert_eq!(document(".hidden").article_label(), None);
    }

    #[test]
    fn test_doc_id_is_stable() {
        assert_eq!(document("Article 1.txt").doc_id, document("Article 1.txt").doc_id);
        assert_ne!(document("Article 1.txt").doc_id, document("Article 2.txt").doc_id);
    }

    #[test]
    fn test_article_text_file_name() {
        assert_eq!(ArticleText::new("17").file_name(), "Article 17.txt");
    }
}
