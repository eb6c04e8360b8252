// file: src/parser/splitter.rs
// description: splits the GDPR PDF into one text file per article
// reference: https://docs.rs/pdf-extract

use crate::error::{RagError, Result};
use crate::models::ArticleText;
use crate::utils::Validator;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::patterns::ARTICLE_MARKER;

/// Cuts page texts into articles at every `EN\nArticle N.` marker.
///
/// Text before the first marker is dropped. Once an article is open, the
/// whole text of every following page is appended to it, including the page
/// that holds the next marker, so an article can carry the head of the next
/// one. Several markers on one page close the earlier articles with whatever
/// they held at that point.
pub fn split_pages<I, S>(pages: I) -> Vec<ArticleText>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut articles = Vec::new();
    let mut current: Option<ArticleText> = None;

    for (page_index, page) in pages.into_iter().enumerate() {
        let text = page.as_ref();

        for caps in ARTICLE_MARKER.captures_iter(text) {
            if let Some(finished) = current.take() {
                articles.push(finished);
            }
            debug!("Article {} starts on page {}", &caps[1], page_index + 1);
            current = Some(ArticleText::new(&caps[1]));
        }

        if let Some(article) = current.as_mut() {
            article.text.push_str(text);
        }
    }

    if let Some(finished) = current {
        articles.push(finished);
    }

    articles
}

pub struct ArticleSplitter {
    output_dir: PathBuf,
}

impl ArticleSplitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn split_pdf(&self, pdf_path: &Path) -> Result<Vec<PathBuf>> {
        Validator::validate_file_path(pdf_path)?;
        Validator::validate_pdf_extension(pdf_path)?;

        info!("Extracting text from {}", pdf_path.display());
        let pages = pdf_extract::extract_text_by_pages(pdf_path)
            .map_err(|e| RagError::Pdf(format!("{}: {}", pdf_path.display(), e)))?;
        info!("Extracted {} pages", pages.len());

        let articles = split_pages(&pages);
        self.write_articles(&articles)
    }

    pub fn write_articles(&self, articles: &[ArticleText]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| RagError::file(&self.output_dir, e))?;

        let mut saved = Vec::with_capacity(articles.len());
        for article in articles {
            saved.push(self.save_article(article)?);
        }

        info!(
            "Saved {} articles to {}",
            saved.len(),
            self.output_dir.display()
        );
        Ok(saved)
    }

    fn save_article(&self, article: &ArticleText) -> Result<PathBuf> {
        let path = self.output_dir.join(article.file_name());
        fs::write(&path, &article.text).map_err(|e| RagError::file(&path, e))?;
        debug!("Wrote {} ({} bytes)", path.display(), article.text.len());
        Ok(path)
    }
}
