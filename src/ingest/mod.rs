// file: src/ingest/mod.rs
// description: document loading and enrichment module exports
// reference: internal module structure

pub mod enrich;
pub mod reader;

pub use enrich::{EnrichmentStats, enrich_documents_with_summaries};
pub use reader::DocumentReader;
