//! REST API types with schemars annotations for OpenAPI generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::models::case::{Case, ConstructionGroup, SearchResult};

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  #[serde(default)]
  pub stack: Vec<String>,

  #[serde(default)]
  pub context: serde_json::Value,
}

// Status Endpoints
// ================

/// Response for /health
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
  pub status: String,
  pub service: String,
}

/// Response for the authenticated root endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RootResponse {
  pub message: String,
  pub version: String,
}

// Logs Endpoint
// =============

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Newest entries to return (default 100)
  pub limit: Option<usize>,
  /// Only entries of this level
  pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<LogEntry>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::daemon_logs::LogEntry;

// Case Endpoints
// ==============

/// Request for POST /api/cases
pub type CreateCaseRequest = crate::server::models::case::NewCase;

/// Response carrying a single case, embedding included
#[derive(Debug, Serialize, Deserialize)]
pub struct CaseData {
  pub case: Case,
}

/// Request for POST /api/cases/search
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
  /// Free-text description of the fault
  pub query: String,

  /// Case-insensitive substring of the vehicle model
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model_filter: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub construction_group: Option<ConstructionGroup>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
  pub results: Vec<SearchResult>,
  pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GroupsResponse {
  pub groups: Vec<ConstructionGroup>,
}

// Helper Functions
// ================

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

impl<T> BaseResponse<T> {
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self {
      key: key.to_string(),
      message: message.to_string(),
      stack: Vec::new(),
      context: serde_json::Value::Null,
    }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }
}
