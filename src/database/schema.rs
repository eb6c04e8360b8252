// file: src/database/schema.rs
// description: LanceDB schema management for leaf node vectors
// reference: https://docs.rs/lancedb

use crate::database::client::LanceDbClient;
use crate::error::{RagError, Result};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use tracing::{info, warn};

pub const COL_NODE_ID: &str = "node_id";
pub const COL_DOC_ID: &str = "doc_id";
pub const COL_TEXT: &str = "text";
pub const COL_PARENT_ID: &str = "parent_id";
pub const COL_ARTICLE_NUMBER: &str = "article_number";
pub const COL_ARTICLE_SUMMARY: &str = "article_summary";
pub const COL_VECTOR: &str = "vector";

pub struct SchemaManager<'a> {
    client: &'a LanceDbClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a LanceDbClient) -> Self {
        Self { client }
    }

    /// Width of the stored vector column, or `None` when the leaf table has
    /// not been written yet.
    pub async fn vector_dimension(&self) -> Result<Option<usize>> {
        let table_name = self.client.table_name();

        if !self.client.table_exists(table_name).await? {
            warn!("Table '{}' does not exist", table_name);
            return Ok(None);
        }

        let schema = self
            .client
            .get_table(table_name)
            .await?
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read schema of {}: {}", table_name, e)))?;

        Self::dimension_of(&schema).map(Some)
    }

    fn dimension_of(schema: &Schema) -> Result<usize> {
        let field = schema.field_with_name(COL_VECTOR).map_err(|_| {
            RagError::Index(format!("leaf table has no '{}' column", COL_VECTOR))
        })?;

        match field.data_type() {
            DataType::FixedSizeList(_, size) if *size > 0 => Ok(*size as usize),
            other => Err(RagError::Index(format!(
                "column '{}' has type {:?}, expected a fixed size list of floats",
                COL_VECTOR, other
            ))),
        }
    }

    /// Arrow schema of the leaf node table. Only leaves are embedded; their
    /// ancestors live in the docstore.
    pub fn get_leaf_nodes_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(COL_NODE_ID, DataType::Utf8, false),
            Field::new(COL_DOC_ID, DataType::Utf8, false),
            Field::new(COL_TEXT, DataType::Utf8, false),
            Field::new(COL_PARENT_ID, DataType::Utf8, true),
            // Filterable article metadata
            Field::new(COL_ARTICLE_NUMBER, DataType::Utf8, true),
            Field::new(COL_ARTICLE_SUMMARY, DataType::Utf8, true),
            Field::new(
                COL_VECTOR,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    pub async fn drop_all_tables(&self) -> Result<()> {
        let table_name = self.client.table_name();

        if self.client.table_exists(table_name).await? {
            warn!("Dropping table {}", table_name);
            self.client
                .get_connection()
                .drop_table(table_name)
                .await
                .map_err(|e| {
                    RagError::Database(format!("Failed to drop table {}: {}", table_name, e))
                })?;
            info!("Dropped table: {}", table_name);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema = SchemaManager::get_leaf_nodes_schema(384);
        assert_eq!(schema.fields().len(), 7);

        let vector_field = schema.field_with_name(COL_VECTOR).unwrap();
        assert!(matches!(vector_field.data_type(), DataType::FixedSizeList(_, 384)));
        assert!(schema.field_with_name(COL_ARTICLE_NUMBER).unwrap().is_nullable());
    }

    #[test]
    fn test_dimension_of_leaf_schema() {
        let schema = SchemaManager::get_leaf_nodes_schema(64);
        assert_eq!(SchemaManager::dimension_of(&schema).unwrap(), 64);

        let without_vectors = Schema::new(vec![Field::new(COL_NODE_ID, DataType::Utf8, false)]);
        assert!(matches!(
            SchemaManager::dimension_of(&without_vectors),
            Err(RagError::Index(_))
        ));
    }
}
