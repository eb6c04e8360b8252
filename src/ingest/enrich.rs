// file: src/ingest/enrich.rs
// description: attaches article summaries to documents by article number
// reference: internal data structures

use crate::error::{RagError, Result};
use crate::models::ArticleDocument;
use crate::models::document::{META_ARTICLE_NUMBER, META_ARTICLE_SUMMARY};
use crate::parser::ArticleSummaries;
use crate::parser::metadata::article_number_of_label;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub enriched: usize,
    pub unmatched: usize,
}

/// Replaces a document's metadata with `{article_number, article_summary}`
/// when exactly one summary carries the document's article number.
/// Documents without a match keep their metadata; several matches for one
/// article are rejected.
pub fn enrich_documents_with_summaries(
    documents: &mut [ArticleDocument],
    summaries: &ArticleSummaries,
) -> Result<EnrichmentStats> {
    let mut stats = EnrichmentStats::default();

    for document in documents.iter_mut() {
        let Some(number) = document.article_label().and_then(article_number_of_label) else {
            debug!(
                "No article number in file name {:?}, metadata left unchanged",
                document.file_name()
            );
            stats.unmatched += 1;
            continue;
        };

        let matches = summaries.find_by_article_number(number);
        match matches.as_slice() {
            [] => {
                debug!("No summary for Article {}, metadata left unchanged", number);
                stats.unmatched += 1;
            }
            [(key, summary)] => {
                let mut metadata = BTreeMap::new();
                metadata.insert(META_ARTICLE_NUMBER.to_string(), key.to_string());
                metadata.insert(META_ARTICLE_SUMMARY.to_string(), summary.to_string());
                document.metadata = metadata;
                stats.enriched += 1;
            }
            several => {
                let keys: Vec<&str> = several.iter().map(|(key, _)| *key).collect();
                return Err(RagError::Validation(format!(
                    "Article {} has {} summaries: {}",
                    number,
                    several.len(),
                    keys.join(", ")
                )));
            }
        }
    }

    info!(
        "Enriched {} documents with summaries ({} without a summary)",
        stats.enriched, stats.unmatched
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::META_FILE_NAME;
    use pretty_assertions::assert_eq;

    fn document(file_name: &str) -> ArticleDocument {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_FILE_NAME.to_string(), file_name.to_string());
        ArticleDocument::new(file_name, format!("text of {}", file_name), metadata)
    }

    #[test]
    fn test_matching_summary_replaces_metadata() {
        let summaries: ArticleSummaries =
            vec![("Article 5 - Right to erasure", "Erase data on request.")]
                .into_iter()
                .collect();
        let mut documents = vec![document("Article 5.txt")];

        let stats = enrich_documents_with_summaries(&mut documents, &summaries).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert(
            META_ARTICLE_NUMBER.to_string(),
            "Article 5 - Right to erasure".to_string(),
        );
        expected.insert(
            META_ARTICLE_SUMMARY.to_string(),
            "Erase data on request.".to_string(),
        );
        assert_eq!(documents[0].metadata, expected);
        assert_eq!(stats, EnrichmentStats { enriched: 1, unmatched: 0 });
    }

    #[test]
    fn test_unmatched_document_keeps_metadata() {
        let summaries: ArticleSummaries =
            vec![("Article 15 - Right of access", "Access.")].into_iter().collect();
        let mut documents = vec![document("Article 1.txt")];
        let before = documents[0].metadata.clone();

        let stats = enrich_documents_with_summaries(&mut documents, &summaries).unwrap();

        assert_eq!(documents[0].metadata, before);
        assert_eq!(stats.unmatched, 1);
    }

    #[test]
    fn test_ambiguous_summaries_rejected() {
        let summaries: ArticleSummaries = vec![
            ("Article 9 - Special categories", "one"),
            ("Article 9 - Sensitive data", "two"),
        ]
        .into_iter()
        .collect();
        let mut documents = vec![document("Article 9.txt")];

        let result = enrich_documents_with_summaries(&mut documents, &summaries);
        assert!(matches!(result, Err(RagError::Validation(_))));
    }
}
