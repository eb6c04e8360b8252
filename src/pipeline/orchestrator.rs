// file: src/pipeline/orchestrator.rs
// description: coordinates document loading, enrichment and index construction
// reference: orchestrates the load-or-build ingestion workflow

use crate::config::Config;
use crate::embeddings::{EmbeddingProvider, create_provider};
use crate::error::{RagError, Result};
use crate::index::{AutoMergingIndex, BuildOptions, HierarchicalNodeParser};
use crate::ingest::{DocumentReader, enrich_documents_with_summaries};
use crate::parser::load_article_summaries;
use crate::pipeline::progress::IndexStats;
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

pub struct IngestOrchestrator {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    colored: bool,
    show_progress: bool,
}

/// The ready index, plus build statistics when it was built by this run.
pub struct IngestReport {
    pub index: AutoMergingIndex,
    pub stats: Option<IndexStats>,
}

impl IngestOrchestrator {
    pub fn new(config: Config) -> Result<Self> {
        let embedder = create_provider(
            config.embedding.provider,
            &config.embedding.model,
            config.embedding.max_length,
            config.embedding.batch_size,
            &config.llm,
        )?;
        Ok(Self::with_embedder(config, embedder))
    }

    pub fn with_embedder(config: Config, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            colored: true,
            show_progress: true,
        }
    }

    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Loads the persisted index when its directory exists, otherwise builds
    /// it from the article files. `rebuild` deletes the directory first.
    pub async fn run(&self, rebuild: bool) -> Result<IngestReport> {
        let index_dir = &self.config.paths.index_dir;

        if rebuild && index_dir.exists() {
            warn!("Removing existing index at {}", index_dir.display());
            fs::remove_dir_all(index_dir).map_err(|e| RagError::file(index_dir, e))?;
        }

        if AutoMergingIndex::exists(index_dir) {
            let index = self.open().await?;
            info!(
                "Loaded index with {} nodes from {}",
                index.docstore().len(),
                index_dir.display()
            );
            return Ok(IngestReport { index, stats: None });
        }

        let (index, stats) = self.build().await?;
        self.log_final_stats(&stats);
        Ok(IngestReport {
            index,
            stats: Some(stats),
        })
    }

    /// Opens the persisted index without building it.
    pub async fn open(&self) -> Result<AutoMergingIndex> {
        let index_dir = &self.config.paths.index_dir;

        if !AutoMergingIndex::exists(index_dir) {
            return Err(RagError::Index(format!(
                "no index at {}; run `gdpr_rag ingest` first",
                index_dir.display()
            )));
        }

        let index = AutoMergingIndex::load(index_dir).await?;
        index.check_embedder(self.embedder.as_ref());
        Ok(index)
    }

    async fn build(&self) -> Result<(AutoMergingIndex, IndexStats)> {
        info!("Building index at {}", self.config.paths.index_dir.display());

        let summaries = load_article_summaries(&self.config.paths.metadata_path)?;
        let mut documents = DocumentReader::new(&self.config.paths.articles_dir).load_data()?;

        if documents.is_empty() {
            return Err(RagError::Validation(format!(
                "no article files in {}",
                self.config.paths.articles_dir.display()
            )));
        }

        let enrichment = enrich_documents_with_summaries(&mut documents, &summaries)?;

        let parser = HierarchicalNodeParser::new(self.config.retrieval.chunk_sizes.clone());
        let options = BuildOptions {
            batch_size: self.config.embedding.batch_size,
            show_progress: self.show_progress,
            colored: self.colored,
        };

        let (index, mut stats) = AutoMergingIndex::build(
            &documents,
            &parser,
            self.embedder.as_ref(),
            &self.config.paths.index_dir,
            &options,
        )
        .await?;

        stats.documents_enriched = enrichment.enriched;
        Ok((index, stats))
    }

    fn log_final_stats(&self, stats: &IndexStats) {
        info!("=== Ingestion Summary ===");
        info!("Duration: {} seconds", stats.duration_secs);
        info!(
            "Documents loaded: {} ({} enriched, {:.1}%)",
            stats.documents_loaded,
            stats.documents_enriched,
            stats.enrichment_rate()
        );
        info!("Nodes created: {}", stats.nodes_created);
        info!(
            "Leaf nodes embedded: {} in {} batches ({:.2} nodes/sec)",
            stats.leaf_nodes_embedded,
            stats.batches_written,
            stats.nodes_per_second()
        );
    }
}
