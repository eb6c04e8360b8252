// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod node;
pub mod response;

pub use document::{ArticleDocument, ArticleText};
pub use node::TextNode;
pub use response::{QueryResponse, ScoredNode, sort_by_score};
