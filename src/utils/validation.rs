// file: src/utils/validation.rs
// description: path, url and chunking parameter checks shared by config and ingestion
// reference: input validation patterns

use crate::error::{RagError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(RagError::Validation(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(RagError::Validation(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(RagError::Validation(format!(
                "Not a directory: {}",
                path.display()
            )));
        }
        Ok(())
    }

    pub fn validate_pdf_extension(path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Ok(()),
            _ => Err(RagError::Validation(format!(
                "Expected a .pdf file: {}",
                path.display()
            ))),
        }
    }

    /// Chunk tiers run from the coarsest to the finest, so every size must
    /// be positive and strictly smaller than the one before it.
    pub fn validate_chunk_sizes(sizes: &[usize]) -> Result<()> {
        if sizes.is_empty() {
            return Err(RagError::Validation(
                "at least one chunk size is required".to_string(),
            ));
        }

        if sizes.contains(&0) {
            return Err(RagError::Validation(format!(
                "chunk sizes must be positive: {:?}",
                sizes
            )));
        }

        if sizes.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(RagError::Validation(format!(
                "chunk sizes must be strictly decreasing: {:?}",
                sizes
            )));
        }

        Ok(())
    }

    /// Accepts ratios in `(0, 1]`.
    pub fn validate_ratio(name: &str, value: f32) -> Result<()> {
        if value > 0.0 && value <= 1.0 {
            Ok(())
        } else {
            Err(RagError::Validation(format!(
                "{} must be in (0, 1], got {}",
                name, value
            )))
        }
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RagError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }
}
