// file: src/parser/mod.rs
// description: pdf splitting and metadata parsing module exports
// reference: internal module structure

pub mod metadata;
pub mod patterns;
pub mod splitter;

pub use metadata::{ArticleSummaries, load_article_summaries, parse_article_summaries};
pub use splitter::{ArticleSplitter, split_pages};
