// file: src/database/insert.rs
// description: LanceDB batch insertion of leaf nodes with their vectors
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::database::schema::SchemaManager;
use crate::error::{RagError, Result};
use crate::models::TextNode;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BatchInserter<'a> {
    client: &'a LanceDbClient,
}

#[derive(Debug, Clone, Default)]
pub struct InsertStats {
    pub nodes_inserted: usize,
    pub batches: usize,
}

impl<'a> BatchInserter<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    /// Writes one batch of nodes; the table is created on the first call.
    pub async fn insert_nodes(
        &self,
        nodes: &[TextNode],
        embeddings: &[Vec<f32>],
    ) -> Result<InsertStats> {
        if nodes.is_empty() {
            return Ok(InsertStats::default());
        }

        if nodes.len() != embeddings.len() {
            return Err(RagError::Index(format!(
                "{} nodes but {} embeddings",
                nodes.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
            return Err(RagError::Embedding(
                "Embeddings in a batch must share one non-zero dimension".to_string(),
            ));
        }

        let schema = SchemaManager::get_leaf_nodes_schema(dimension);
        let record_batch = Self::create_record_batch(schema.clone(), nodes, embeddings, dimension)?;
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            self.client
                .get_connection()
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(record_batch)], schema.clone()),
                )
                .execute()
                .await
                .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?;
            info!("Created new table: {}", table_name);
        } else {
            let table = self.client.get_table(table_name).await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(record_batch)], schema))
                .execute()
                .await
                .map_err(|e| RagError::Database(format!("Failed to insert nodes: {}", e)))?;
        }

        debug!("Inserted {} nodes into {}", nodes.len(), table_name);
        Ok(InsertStats {
            nodes_inserted: nodes.len(),
            batches: 1,
        })
    }

    fn create_record_batch(
        schema: Arc<arrow_schema::Schema>,
        nodes: &[TextNode],
        embeddings: &[Vec<f32>],
        dimension: usize,
    ) -> Result<RecordBatch> {
        let node_ids: StringArray = nodes.iter().map(|n| Some(n.node_id.as_str())).collect();
        let doc_ids: StringArray = nodes.iter().map(|n| Some(n.doc_id.as_str())).collect();
        let texts: StringArray = nodes.iter().map(|n| Some(n.text.as_str())).collect();
        let parent_ids: StringArray = nodes.iter().map(|n| n.parent_id.as_deref()).collect();
        let article_numbers: StringArray = nodes.iter().map(|n| n.article_number()).collect();
        let article_summaries: StringArray = nodes.iter().map(|n| n.article_summary()).collect();

        let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            embeddings
                .iter()
                .map(|embedding| Some(embedding.iter().copied().map(Some).collect::<Vec<_>>())),
            dimension as i32,
        );

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(node_ids),
                Arc::new(doc_ids),
                Arc::new(texts),
                Arc::new(parent_ids),
                Arc::new(article_numbers),
                Arc::new(article_summaries),
                Arc::new(vectors),
            ],
        )
        .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }
}
