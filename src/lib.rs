// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod console;
pub mod database;
pub mod embeddings;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod retrieval;
pub mod utils;

pub use config::Config;
pub use database::{BatchInserter, InsertStats, LanceDbClient, SchemaManager};
pub use embeddings::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use evaluation::{EvaluationRecord, Evaluator, FeedbackResult};
pub use index::{AutoMergingIndex, DocStore, HierarchicalNodeParser};
pub use ingest::{DocumentReader, enrich_documents_with_summaries};
pub use llm::{ChatMessage, ChatModel, OpenAiChatClient};
pub use matcher::SummaryMatcher;
pub use models::{ArticleDocument, ArticleText, QueryResponse, ScoredNode, TextNode};
pub use parser::{ArticleSplitter, ArticleSummaries, load_article_summaries, split_pages};
pub use pipeline::{IndexStats, IngestOrchestrator, QueryRunner};
pub use retrieval::{AutoMergingRetriever, ResponseSynthesizer, RetrieverQueryEngine};
pub use utils::Validator;
