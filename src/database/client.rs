// file: src/database/client.rs
// description: LanceDB client wrapper with connection management and vector search
// reference: https://docs.rs/lancedb

use crate::database::schema::{COL_ARTICLE_NUMBER, COL_NODE_ID};
use crate::error::{RagError, Result};
use arrow_array::{Array, Float32Array, StringArray};
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table, connect};
use tracing::{debug, info, warn};

pub const DEFAULT_TABLE_NAME: &str = "leaf_nodes";

/// One row returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub node_id: String,
    pub article_number: Option<String>,
    /// Cosine similarity, `1 - distance`.
    pub score: f32,
    pub distance: Option<f32>,
}

#[derive(Clone)]
pub struct LanceDbClient {
    connection: Connection,
    uri: String,
    table_name: String,
}

impl LanceDbClient {
    pub async fn new(uri: &str, table_name: &str) -> Result<Self> {
        info!("Connecting to LanceDB at {}", uri);

        let connection = connect(uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            uri: uri.to_string(),
            table_name: table_name.to_string(),
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking LanceDB connection");

        match self.connection.table_names().execute().await {
            Ok(_) => Ok(true),
            Err(e) => Err(RagError::Database(format!(
                "LanceDB connection failed: {}",
                e
            ))),
        }
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    pub async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table {}: {}", table_name, e)))
    }

    pub async fn count_rows(&self) -> Result<u64> {
        if !self.table_exists(&self.table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(&self.table_name).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Nearest leaf nodes to `query_embedding` by cosine distance, closest
    /// first. `filter` is a SQL predicate applied before ranking.
    pub async fn vector_search(
        &self,
        query_embedding: Vec<f32>,
        limit: usize,
        filter: Option<&str>,
    ) -> Result<Vec<VectorHit>> {
        if !self.table_exists(&self.table_name).await? {
            warn!("Table does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.get_table(&self.table_name).await?;

        debug!("Performing vector search with limit {}", limit);

        let mut query = table
            .vector_search(query_embedding)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(limit);

        if let Some(filter) = filter {
            query = query.only_if(filter);
            debug!("Applied filter: {}", filter);
        }

        let mut results_stream = query
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Vector search failed: {}", e)))?;

        let mut hits = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result
                .map_err(|e| RagError::Database(format!("Failed to read result batch: {}", e)))?;

            let node_ids = string_column(&batch, COL_NODE_ID)?;
            let article_numbers = string_column(&batch, COL_ARTICLE_NUMBER)?;

            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let distance = distances.map(|d| d.value(i));
                let article_number = if article_numbers.is_null(i) {
                    None
                } else {
                    Some(article_numbers.value(i).to_string())
                };

                hits.push(VectorHit {
                    node_id: node_ids.value(i).to_string(),
                    article_number,
                    score: distance.map(|d| 1.0 - d).unwrap_or(1.0),
                    distance,
                });
            }
        }

        debug!("Vector search returned {} hits", hits.len());
        Ok(hits)
    }
}

fn string_column<'b>(
    batch: &'b arrow_array::RecordBatch,
    name: &str,
) -> Result<&'b StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid '{}' column type", name)))
}

/// SQL predicate restricting a search to the given article keys.
/// Returns `None` when there is nothing to restrict to.
pub fn article_filter(article_keys: &[String]) -> Option<String> {
    if article_keys.is_empty() {
        return None;
    }

    let values: Vec<String> = article_keys
        .iter()
        .map(|key| format!("'{}'", key.replace('\'', "''")))
        .collect();

    Some(format!("{} IN ({})", COL_ARTICLE_NUMBER, values.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_filter() {
        let filter = article_filter(&[
            "Article 6 - Lawfulness of processing".to_string(),
            "Article 7 - Conditions for consent".to_string(),
        ])
        .unwrap();
        assert_eq!(
            filter,
            "article_number IN ('Article 6 - Lawfulness of processing', 'Article 7 - Conditions for consent')"
        );
    }

    #[test]
    fn test_article_filter_escapes_quotes() {
        let filter = article_filter(&["Article 8 - Child's consent".to_string()]).unwrap();
        assert_eq!(filter, "article_number IN ('Article 8 - Child''s consent')");
    }

    #[test]
    fn test_empty_filter() {
        assert!(article_filter(&[]).is_none());
    }
}
