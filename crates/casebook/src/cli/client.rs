//! HTTP client for the casebook REST API
//!
//! Thin wrapper used by the CLI; every command goes through the server so
//! the CLI never touches a store directly.

use anyhow::{anyhow, Result};
use clap::Args;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::DEFAULT_SERVER_URL;
use crate::server::auth::encode_basic;
use crate::server::models::case::{Case, ConstructionGroup, NewCase, SearchResult};
use crate::server::types::{
  BaseResponse, CaseData, GroupsResponse, HealthResponse, SearchRequest, SearchResponse,
};

/// Configuration for the casebook HTTP client
#[derive(Debug, Clone, Args)]
pub struct ClientConfig {
  /// Base URL of the casebook server
  #[arg(long = "server", env = "CASEBOOK_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
  pub base_url: String,

  /// Request timeout in seconds
  #[arg(long = "timeout", env = "CASEBOOK_TIMEOUT_SECS", default_value_t = 30, global = true)]
  pub timeout_secs: u64,

  /// Basic auth username
  #[arg(long, env = "API_USERNAME", global = true)]
  pub username: Option<String>,

  /// Basic auth password
  #[arg(long, env = "API_PASSWORD", hide_env_values = true, global = true)]
  pub password: Option<String>,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_SERVER_URL.to_string(), timeout_secs: 30, username: None, password: None }
  }
}

/// HTTP client for the casebook REST API
pub struct CasebookClient {
  client: Client,
  config: ClientConfig,
}

impl CasebookClient {
  pub fn with_config(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {e}"))?;

    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str {
    self.config.base_url.trim_end_matches('/')
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url())
  }

  fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
    match (&self.config.username, &self.config.password) {
      (Some(username), Some(password)) => {
        request.header(reqwest::header::AUTHORIZATION, encode_basic(username, password))
      }
      _ => request,
    }
  }

  pub async fn health(&self) -> Result<HealthResponse> {
    let response = self.client.get(self.url("/health")).send().await?;
    parse(response, "check server health").await
  }

  pub async fn create_case(&self, new_case: &NewCase) -> Result<Case> {
    let request = self.authorized(self.client.post(self.url("/api/cases")).json(new_case));
    let result: BaseResponse<CaseData> = parse(request.send().await?, "create case").await?;
    Ok(result.data.case)
  }

  pub async fn search(
    &self,
    query: &str,
    model_filter: Option<String>,
    construction_group: Option<ConstructionGroup>,
  ) -> Result<Vec<SearchResult>> {
    let body = SearchRequest { query: query.to_string(), model_filter, construction_group };
    let request = self.authorized(self.client.post(self.url("/api/cases/search")).json(&body));
    let result: BaseResponse<SearchResponse> = parse(request.send().await?, "search cases").await?;
    Ok(result.data.results)
  }

  pub async fn get_case(&self, id: i64) -> Result<Case> {
    let request = self.authorized(self.client.get(self.url(&format!("/api/cases/{id}"))));
    let result: BaseResponse<CaseData> = parse(request.send().await?, "get case").await?;
    Ok(result.data.case)
  }

  pub async fn groups(&self) -> Result<Vec<ConstructionGroup>> {
    let response = self.client.get(self.url("/api/cases/groups")).send().await?;
    let result: BaseResponse<GroupsResponse> = parse(response, "list construction groups").await?;
    Ok(result.data.groups)
  }
}

async fn parse<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
  let status = response.status();
  if !status.is_success() {
    let error_text = response.text().await.unwrap_or_default();
    return Err(anyhow!("Failed to {action} ({status}): {}", error_message(&error_text)));
  }
  Ok(response.json().await?)
}

/// Pull the first error message out of an error envelope, falling back to the raw body
pub fn error_message(body: &str) -> String {
  serde_json::from_str::<BaseResponse<serde_json::Value>>(body)
    .ok()
    .and_then(|envelope| envelope.errors.into_iter().next())
    .map(|error| error.message)
    .unwrap_or_else(|| body.to_string())
}
