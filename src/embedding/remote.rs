// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote embedding provider for OpenAI-compatible `/embeddings` endpoints.
//!
//! One request per text, no internal retry. Failures surface as
//! [`RetrievalError::Provider`] so the caller decides what to do next.

use anyhow::anyhow;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use super::provider::{EmbeddingProvider, RemoteConfig};
use super::vector::{l2_normalize, EmbeddingVector};
use crate::errors::{RetrievalError, Result};

/// Blocking client for a remote embedding endpoint.
pub struct RemoteEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: Option<usize>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl RemoteEmbedder {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(RetrievalError::config("missing embedding API key"));
        }
        if config.model.trim().is_empty() {
            return Err(RetrievalError::config("missing embedding model name"));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| RetrievalError::config("embedding API key is not a valid header value"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| {
                RetrievalError::Configuration(format!("failed to build HTTP client: {}", err))
            })?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model,
            dimensions: config.dimensions,
        })
    }

    fn request(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|err| {
                let message = if err.is_timeout() {
                    "embedding request timed out".to_string()
                } else {
                    "embedding request failed".to_string()
                };
                RetrievalError::provider_with_source(message, err.into())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RetrievalError::provider(format!(
                "embedding endpoint returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let parsed: Value = response.json().map_err(|err| {
            RetrievalError::provider_with_source("embedding response is not JSON", err.into())
        })?;
        parse_embedding(&parsed)
            .map_err(|err| RetrievalError::provider_with_source("malformed embedding response", err))
    }
}

impl EmbeddingProvider for RemoteEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let mut vector = self.request(text)?;
        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(RetrievalError::provider(format!(
                    "endpoint returned {} dimensions, expected {}",
                    vector.len(),
                    expected
                )));
            }
        }
        l2_normalize(&mut vector);
        Ok(EmbeddingVector::new(vector, self.model.clone()))
    }
}

/// Extracts the first embedding from an OpenAI-style, `{"embedding": [...]}`
/// or bare-array response body.
fn parse_embedding(body: &Value) -> anyhow::Result<Vec<f32>> {
    let row = match body {
        Value::Array(_) => body,
        Value::Object(obj) => {
            if let Some(data) = obj.get("data") {
                data.get(0)
                    .and_then(|entry| entry.get("embedding"))
                    .ok_or_else(|| anyhow!("'data' holds no embedding"))?
            } else if let Some(value) = obj.get("embedding") {
                value
            } else {
                anyhow::bail!("response missing 'data' or 'embedding' field");
            }
        }
        _ => anyhow::bail!("response must be a JSON array or object"),
    };

    let values = row
        .as_array()
        .ok_or_else(|| anyhow!("embedding must be a JSON array"))?;
    if values.is_empty() {
        anyhow::bail!("embedding array is empty");
    }

    values
        .iter()
        .map(|value| {
            value
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| anyhow!("embedding value must be a number"))
        })
        .collect()
}
