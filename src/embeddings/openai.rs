// file: src/embeddings/openai.rs
// description: OpenAI-compatible API integration for text embeddings
// reference: https://platform.openai.com/docs/api-reference/embeddings

use super::EmbeddingProvider;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

pub struct OpenAiEmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    batch_size: usize,
}

impl OpenAiEmbeddingClient {
    pub fn new(api_key: String, base_url: String, model: String, batch_size: usize) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            batch_size: batch_size.max(1),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        debug!("Requesting {} embeddings from {}", texts.len(), url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to send embedding request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::Embedding(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            RagError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        into_ordered_vectors(body, texts.len())
    }
}

fn into_ordered_vectors(body: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if body.data.len() != expected {
        return Err(RagError::Embedding(format!(
            "Expected {} embeddings, received {}",
            expected,
            body.data.len()
        )));
    }

    let mut data = body.data;
    data.sort_by_key(|item| item.index);
    Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(chunk).await?);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_reordered_by_index() {
        let body: EmbeddingResponse = serde_json::from_str(
            r#"{"data":[{"embedding":[0.2],"index":1},{"embedding":[0.1],"index":0}]}"#,
        )
        .unwrap();

        let vectors = into_ordered_vectors(body, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1], vec![0.2]]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1],"index":0}]}"#).unwrap();
        assert!(into_ordered_vectors(body, 2).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiEmbeddingClient::new(
            "key".to_string(),
            "https://api.openai.com/v1/".to_string(),
            "text-embedding-3-small".to_string(),
            0,
        );
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.batch_size, 1);
    }
}
