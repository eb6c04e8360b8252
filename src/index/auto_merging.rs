// file: src/index/auto_merging.rs
// description: persisted hierarchical index over leaf vectors and a node docstore
// reference: https://docs.rs/lancedb

use crate::database::{BatchInserter, DEFAULT_TABLE_NAME, LanceDbClient, SchemaManager};
use crate::embeddings::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::docstore::{DocStore, EmbeddingInfo};
use crate::index::parser::{HierarchicalNodeParser, get_leaf_nodes};
use crate::models::ArticleDocument;
use crate::pipeline::progress::{IndexStats, ProgressTracker};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const VECTOR_DIR: &str = "vectors";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub batch_size: usize,
    pub show_progress: bool,
    pub colored: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            show_progress: true,
            colored: true,
        }
    }
}

/// Leaf vectors live in LanceDB under `<dir>/vectors`; every tier of nodes
/// lives in `<dir>/docstore.json`.
#[derive(Clone)]
pub struct AutoMergingIndex {
    client: LanceDbClient,
    docstore: Arc<DocStore>,
    persist_dir: PathBuf,
}

impl AutoMergingIndex {
    pub fn exists(persist_dir: &Path) -> bool {
        persist_dir.exists()
    }

    fn vector_uri(persist_dir: &Path) -> String {
        persist_dir.join(VECTOR_DIR).display().to_string()
    }

    /// Sibling directory a build writes into before it is moved into place.
    pub fn staging_dir(persist_dir: &Path) -> PathBuf {
        match persist_dir.file_name() {
            Some(name) => {
                persist_dir.with_file_name(format!("{}.building", name.to_string_lossy()))
            }
            None => persist_dir.join(".building"),
        }
    }

    /// Builds the index under [`Self::staging_dir`] and renames it to
    /// `persist_dir` once the docstore is written. A failed build removes
    /// the staging directory and leaves `persist_dir` untouched.
    pub async fn build(
        documents: &[ArticleDocument],
        parser: &HierarchicalNodeParser,
        embedder: &dyn EmbeddingProvider,
        persist_dir: &Path,
        options: &BuildOptions,
    ) -> Result<(Self, IndexStats)> {
        let staging = Self::staging_dir(persist_dir);
        if staging.exists() {
            warn!("Removing leftover build directory {}", staging.display());
            fs::remove_dir_all(&staging).map_err(|e| RagError::file(&staging, e))?;
        }

        let (docstore, stats) =
            match Self::write_index(documents, parser, embedder, &staging, options).await {
                Ok(built) => built,
                Err(e) => {
                    if staging.exists()
                        && let Err(cleanup) = fs::remove_dir_all(&staging)
                    {
                        warn!("Failed to remove {}: {}", staging.display(), cleanup);
                    }
                    return Err(e);
                }
            };

        if persist_dir.exists() {
            warn!("Replacing existing index at {}", persist_dir.display());
            fs::remove_dir_all(persist_dir).map_err(|e| RagError::file(persist_dir, e))?;
        }
        fs::rename(&staging, persist_dir).map_err(|e| RagError::file(persist_dir, e))?;

        let client = LanceDbClient::new(&Self::vector_uri(persist_dir), DEFAULT_TABLE_NAME).await?;
        info!("Index persisted to {}", persist_dir.display());

        Ok((
            Self {
                client,
                docstore: Arc::new(docstore),
                persist_dir: persist_dir.to_path_buf(),
            },
            stats,
        ))
    }

    async fn write_index(
        documents: &[ArticleDocument],
        parser: &HierarchicalNodeParser,
        embedder: &dyn EmbeddingProvider,
        dir: &Path,
        options: &BuildOptions,
    ) -> Result<(DocStore, IndexStats)> {
        let nodes = parser.get_nodes_from_documents(documents);
        let leaves = get_leaf_nodes(&nodes);

        if leaves.is_empty() {
            return Err(RagError::Index(
                "documents produced no nodes to index".to_string(),
            ));
        }

        info!(
            "Building index from {} documents: {} nodes, {} leaves",
            documents.len(),
            nodes.len(),
            leaves.len()
        );

        fs::create_dir_all(dir).map_err(|e| RagError::file(dir, e))?;
        let client = LanceDbClient::new(&Self::vector_uri(dir), DEFAULT_TABLE_NAME).await?;
        SchemaManager::new(&client).drop_all_tables().await?;

        let tracker = if options.show_progress {
            ProgressTracker::with_color(leaves.len(), options.colored)
        } else {
            ProgressTracker::hidden()
        };

        tracker.set_message(format!("Embedding leaves with {}", embedder.model_name()));

        let inserter = BatchInserter::new(&client);
        let mut dimension = 0;

        for batch in leaves.chunks(options.batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|node| node.text.clone()).collect();
            let embeddings = embedder.embed(&texts).await?;
            if let Some(first) = embeddings.first() {
                dimension = first.len();
            }
            inserter.insert_nodes(batch, &embeddings).await?;
            tracker.inc_batch(batch.len());
        }
        tracker.finish();

        let mut docstore = DocStore::new();
        docstore.set_embedding(EmbeddingInfo {
            model: embedder.model_name().to_string(),
            dimension,
        });
        let nodes_created = nodes.len();
        docstore.add_nodes(nodes);
        docstore.persist(dir)?;

        let stats = IndexStats {
            documents_loaded: documents.len(),
            documents_enriched: 0,
            nodes_created,
            leaf_nodes_embedded: tracker.nodes_embedded(),
            batches_written: tracker.batches_written(),
            duration_secs: tracker.elapsed_secs(),
        };

        Ok((docstore, stats))
    }

    pub async fn load(persist_dir: &Path) -> Result<Self> {
        info!("Loading index from {}", persist_dir.display());

        let docstore = DocStore::load(persist_dir)?;
        let client = LanceDbClient::new(&Self::vector_uri(persist_dir), DEFAULT_TABLE_NAME).await?;

        let Some(dimension) = SchemaManager::new(&client).vector_dimension().await? else {
            return Err(RagError::Index(format!(
                "{} has no vector table; rebuild the index",
                persist_dir.display()
            )));
        };

        if let Some(info) = docstore.embedding()
            && info.dimension != dimension
        {
            return Err(RagError::Index(format!(
                "docstore records {}-dimensional embeddings but the vector table holds {}; rebuild the index",
                info.dimension, dimension
            )));
        }

        Ok(Self {
            client,
            docstore: Arc::new(docstore),
            persist_dir: persist_dir.to_path_buf(),
        })
    }

    pub fn docstore(&self) -> &DocStore {
        &self.docstore
    }

    pub fn client(&self) -> &LanceDbClient {
        &self.client
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    pub async fn vector_count(&self) -> Result<u64> {
        self.client.count_rows().await
    }

    /// Warns when queries are embedded with a different model than the one
    /// that produced the stored vectors.
    pub fn check_embedder(&self, embedder: &dyn EmbeddingProvider) {
        if let Some(info) = self.docstore.embedding()
            && info.model != embedder.model_name()
        {
            warn!(
                "Index was built with {} but queries use {}; rebuild with --rebuild",
                info.model,
                embedder.model_name()
            );
        }
    }
}
