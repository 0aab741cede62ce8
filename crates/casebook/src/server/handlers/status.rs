//! Health and root endpoint handlers

use axum::response::Json;
use uuid::Uuid;

use crate::server::types::{BaseResponse, HealthResponse, RootResponse};

pub const SERVICE_NAME: &str = "casebook";

/// GET /health - Liveness probe, no authentication
pub async fn health() -> Json<HealthResponse> {
  Json(HealthResponse { status: "ok".to_string(), service: SERVICE_NAME.to_string() })
}

/// GET / - Confirms the caller is authorized
pub async fn root() -> Json<BaseResponse<RootResponse>> {
  let response = RootResponse {
    message: "Authorized access: diagnostic case knowledge base".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
  };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}
