//! Embedding provider adapter
//!
//! The rest of the server only ever sees [`EmbeddingProvider::embed`], which
//! answers with a vector or with nothing. Transport errors, provider errors and
//! malformed payloads all stop here and become a warning in the logs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::EmbeddingConfig;
use crate::server::models::case::EMBEDDING_DIMENSION;

#[derive(Error, Debug)]
pub enum EmbeddingError {
  #[error("Embedding provider is not configured: {0}")]
  NotConfigured(String),

  #[error("Embedding request failed: {0}")]
  Transport(String),

  #[error("Embedding provider returned status {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Malformed embedding response: {0}")]
  Malformed(String),

  #[error("Embedding has {actual} components, expected {expected}")]
  Dimension { expected: usize, actual: usize },
}

/// Raw access to a remote embedding API, one request per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
  async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Two-outcome embedding capability used by the retrieval engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  /// `None` means "no embedding for this call", never an error
  async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

// OpenAI-compatible HTTP backend
// ==============================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  input: Vec<&'a str>,
  model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
}

/// Backend for OpenRouter and any other `/embeddings` compatible endpoint
pub struct OpenRouterBackend {
  client: reqwest::Client,
  base_url: String,
  model: String,
  api_key: String,
}

impl OpenRouterBackend {
  pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
    let api_key = config
      .api_key
      .clone()
      .filter(|key| !key.trim().is_empty())
      .ok_or_else(|| EmbeddingError::NotConfigured("OPENROUTER_API_KEY is not set".to_string()))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      api_key,
    })
  }

  pub fn endpoint(&self) -> String {
    format!("{}/embeddings", self.base_url)
  }
}

#[async_trait]
impl EmbeddingBackend for OpenRouterBackend {
  async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let request = EmbeddingRequest { input: vec![text], model: &self.model };

    let response = self
      .client
      .post(self.endpoint())
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(EmbeddingError::Status { status: status.as_u16(), body });
    }

    let parsed: EmbeddingResponse =
      response.json().await.map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

    parsed
      .data
      .into_iter()
      .next()
      .map(|data| data.embedding)
      .ok_or_else(|| EmbeddingError::Malformed("response contained no embeddings".to_string()))
  }
}

// Adapter
// =======

/// Absorbs every backend failure and enforces the embedding dimension
pub struct EmbeddingAdapter {
  backend: Option<Box<dyn EmbeddingBackend>>,
  dimension: usize,
}

impl EmbeddingAdapter {
  pub fn new<B: EmbeddingBackend + 'static>(backend: B) -> Self {
    Self { backend: Some(Box::new(backend)), dimension: EMBEDDING_DIMENSION }
  }

  /// An adapter without a provider; every call answers `None`
  pub fn disabled() -> Self {
    Self { backend: None, dimension: EMBEDDING_DIMENSION }
  }

  /// Build the OpenRouter-backed adapter, or a disabled one if it is not configured
  pub fn from_config(config: &EmbeddingConfig) -> Self {
    match OpenRouterBackend::new(config) {
      Ok(backend) => {
        bentley::info!("Embedding provider: {} ({})", backend.endpoint(), config.model);
        Self::new(backend)
      }
      Err(e) => {
        bentley::warn!("{e}; searches will use text matching only");
        Self::disabled()
      }
    }
  }

  pub fn with_dimension(mut self, dimension: usize) -> Self {
    self.dimension = dimension;
    self
  }

  pub fn is_enabled(&self) -> bool {
    self.backend.is_some()
  }

  async fn request(&self, backend: &dyn EmbeddingBackend, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = backend.create_embedding(text).await?;
    if embedding.len() != self.dimension {
      return Err(EmbeddingError::Dimension { expected: self.dimension, actual: embedding.len() });
    }
    Ok(embedding)
  }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingAdapter {
  async fn embed(&self, text: &str) -> Option<Vec<f32>> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
      return None;
    }

    let backend = self.backend.as_deref()?;
    match self.request(backend, &normalized).await {
      Ok(embedding) => Some(embedding),
      Err(e) => {
        bentley::warn!("Embedding unavailable: {e}");
        None
      }
    }
  }
}

/// Newlines become spaces, surrounding whitespace is dropped
pub fn normalize_text(text: &str) -> String {
  text.replace(['\r', '\n'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockall::predicate::eq;

  #[tokio::test]
  async fn test_empty_text_skips_the_backend() {
    let mut backend = MockEmbeddingBackend::new();
    backend.expect_create_embedding().times(0);

    let adapter = EmbeddingAdapter::new(backend);
    assert!(adapter.embed("").await.is_none());
    assert!(adapter.embed("  \n \n ").await.is_none());
  }

  #[tokio::test]
  async fn test_text_is_normalized_before_the_call() {
    let mut backend = MockEmbeddingBackend::new();
    backend
      .expect_create_embedding()
      .with(eq("ruido al frenar en bajada"))
      .times(1)
      .returning(|_| Ok(vec![0.25; EMBEDDING_DIMENSION]));

    let adapter = EmbeddingAdapter::new(backend);
    let embedding = adapter.embed("  ruido al frenar\nen bajada \n").await.unwrap();
    assert_eq!(embedding.len(), EMBEDDING_DIMENSION);
  }

  #[tokio::test]
  async fn test_backend_failure_is_absorbed_with_a_single_attempt() {
    let mut backend = MockEmbeddingBackend::new();
    backend
      .expect_create_embedding()
      .times(1)
      .returning(|_| Err(EmbeddingError::Status { status: 503, body: "overloaded".to_string() }));

    let adapter = EmbeddingAdapter::new(backend);
    assert!(adapter.embed("motor no arranca").await.is_none());
  }

  #[tokio::test]
  async fn test_wrong_dimension_counts_as_unavailable() {
    let mut backend = MockEmbeddingBackend::new();
    backend.expect_create_embedding().times(1).returning(|_| Ok(vec![0.1; 384]));

    let adapter = EmbeddingAdapter::new(backend);
    assert!(adapter.embed("vibración en volante").await.is_none());
  }

  #[tokio::test]
  async fn test_custom_dimension() {
    let mut backend = MockEmbeddingBackend::new();
    backend.expect_create_embedding().returning(|_| Ok(vec![1.0, 0.0, 0.0]));

    let adapter = EmbeddingAdapter::new(backend).with_dimension(3);
    assert_eq!(adapter.embed("x").await, Some(vec![1.0, 0.0, 0.0]));
  }

  #[tokio::test]
  async fn test_disabled_adapter_never_embeds() {
    let adapter = EmbeddingAdapter::disabled();
    assert!(!adapter.is_enabled());
    assert!(adapter.embed("frenos").await.is_none());
  }

  #[test]
  fn test_backend_requires_api_key() {
    let config = EmbeddingConfig::default();
    assert!(matches!(OpenRouterBackend::new(&config), Err(EmbeddingError::NotConfigured(_))));

    let config = EmbeddingConfig { api_key: Some("   ".to_string()), ..EmbeddingConfig::default() };
    assert!(OpenRouterBackend::new(&config).is_err());
    assert!(!EmbeddingAdapter::from_config(&config).is_enabled());
  }

  #[test]
  fn test_endpoint_joins_base_url() {
    let config = EmbeddingConfig {
      api_key: Some("sk-test".to_string()),
      base_url: "https://example.test/api/v1/".to_string(),
      ..EmbeddingConfig::default()
    };
    let backend = OpenRouterBackend::new(&config).unwrap();
    assert_eq!(backend.endpoint(), "https://example.test/api/v1/embeddings");
  }

  #[tokio::test]
  async fn test_unreachable_provider_degrades() {
    let config = EmbeddingConfig {
      api_key: Some("sk-test".to_string()),
      base_url: "http://127.0.0.1:1".to_string(),
      timeout_secs: 2,
      ..EmbeddingConfig::default()
    };
    let adapter = EmbeddingAdapter::from_config(&config);
    assert!(adapter.is_enabled());
    assert!(adapter.embed("luz de check engine").await.is_none());
  }
}
