// file: src/parser/metadata.rs
// description: article summary metadata file parsing
// reference: **Article N - Title**: summary line format

use crate::error::{RagError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::patterns::ARTICLE_KEY;

const KEY_MARKER: &str = "**";

/// Article key -> summary, in file order. Re-inserting a key replaces its
/// value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleSummaries {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl ArticleSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, summary: String) {
        match self.positions.get(&key) {
            Some(&position) => self.entries[position].1 = summary,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, summary));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, summary)| (key.as_str(), summary.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Every entry whose key names article `number`.
    pub fn find_by_article_number(&self, number: u32) -> Vec<(&str, &str)> {
        self.iter()
            .filter(|(key, _)| article_number_of_key(key) == Some(number))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArticleSummaries {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut summaries = Self::new();
        for (key, value) in iter {
            summaries.insert(key.into(), value.into());
        }
        summaries
    }
}

/// `"Article 17 - Right to erasure"` -> `Some(17)`.
pub fn article_number_of_key(key: &str) -> Option<u32> {
    ARTICLE_KEY
        .captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// `"Article 17"` -> `Some(17)`.
pub fn article_number_of_label(label: &str) -> Option<u32> {
    label
        .trim()
        .strip_prefix("Article")
        .and_then(|rest| rest.trim().parse().ok())
}

pub fn parse_summary_line(line: &str, line_number: usize) -> Result<(String, String)> {
    let (key_part, value) = line.split_once(':').ok_or_else(|| RagError::MetadataParse {
        line: line_number,
        message: "missing ':' separator".to_string(),
    })?;

    let mut pieces = key_part.splitn(3, KEY_MARKER);
    let key = match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(_), Some(key), Some(_)) => key,
        _ => {
            return Err(RagError::MetadataParse {
                line: line_number,
                message: format!("key must be wrapped in '{}' markers", KEY_MARKER),
            });
        }
    };

    Ok((key.to_string(), value.trim().to_string()))
}

pub fn parse_article_summaries(content: &str) -> Result<ArticleSummaries> {
    let mut summaries = ArticleSummaries::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = parse_summary_line(line, index + 1)?;
        if summaries.get(&key).is_some() {
            debug!("Duplicate summary key '{}' on line {}, overwriting", key, index + 1);
        }
        summaries.insert(key, value);
    }

    Ok(summaries)
}

pub fn load_article_summaries(path: &Path) -> Result<ArticleSummaries> {
    let content = fs::read_to_string(path).map_err(|e| RagError::file(path, e))?;
    let summaries = parse_article_summaries(&content)?;
    info!(
        "Loaded {} article summaries from {}",
        summaries.len(),
        path.display()
    );
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_two_lines_and_a_blank() {
        let content = "**Article 1 - Subject-matter and objectives**: Lays down rules.\n\n\
                       **Article 2 - Material scope**: Applies to processing.\n";
        let summaries = parse_article_summaries(content).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries.get("Article 1 - Subject-matter and objectives"),
            Some("Lays down rules.")
        );
    }

    #[test]
    fn test_missing_colon_is_an_error() {
        let content = "**Article 1 - Subject-matter**: ok\n**Article 2 - Material scope** no colon\n";
        let err = parse_article_summaries(content).unwrap_err();
        assert!(matches!(err, RagError::MetadataParse { line: 2, .. }));
    }

    #[test]
    fn test_single_marker_is_an_error() {
        let err = parse_summary_line("**Article 3 - Territorial scope: text", 1).unwrap_err();
        assert!(matches!(err, RagError::MetadataParse { line: 1, .. }));
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let (key, value) =
            parse_summary_line("**Article 4 - Definitions**: terms: data, processing", 1).unwrap();
        assert_eq!(key, "Article 4 - Definitions");
        assert_eq!(value, "terms: data, processing");
    }

    #[test]
    fn test_duplicate_keys_overwrite_in_place() {
        let content = "**Article 1 - A**: first\n**Article 2 - B**: second\n**Article 1 - A**: third\n";
        let summaries = parse_article_summaries(content).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries.get("Article 1 - A"), Some("third"));
        assert_eq!(
            summaries.keys().collect::<Vec<_>>(),
            vec!["Article 1 - A", "Article 2 - B"]
        );
    }

    #[test]
    fn test_article_numbers() {
        assert_eq!(article_number_of_key("Article 17 - Right to erasure"), Some(17));
        assert_eq!(article_number_of_key("Article 17 Right to erasure"), None);
        assert_eq!(article_number_of_label("Article 5"), Some(5));
        assert_eq!(article_number_of_label("Annex"), None);
    }

    #[test]
    fn test_find_by_article_number_is_exact() {
        let summaries: ArticleSummaries = vec![
            ("Article 1 - Subject-matter", "one"),
            ("Article 11 - Processing without identification", "eleven"),
        ]
        .into_iter()
        .collect();

        let found = summaries.find_by_article_number(1);
        assert_eq!(found, vec![("Article 1 - Subject-matter", "one")]);
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("metadata.txt");
        fs::write(&path, "**Article 6 - Lawfulness of processing**: Lists the bases.\n").unwrap();

        let summaries = load_article_summaries(&path).unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(load_article_summaries(&temp.path().join("missing.txt")).is_err());
    }
}
