// file: src/retrieval/mod.rs
// description: retrieval, reranking and answer synthesis module exports
// reference: internal module structure

pub mod auto_merging;
pub mod engine;
pub mod rerank;
pub mod synthesizer;

pub use auto_merging::{AutoMergingRetriever, merge_nodes};
pub use engine::RetrieverQueryEngine;
pub use rerank::{FastEmbedReranker, Reranker, ScoreOrderReranker, create_reranker};
pub use synthesizer::{EMPTY_RESPONSE, ResponseSynthesizer};
