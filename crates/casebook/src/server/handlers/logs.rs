//! Logs endpoint handler

use axum::{
  extract::{Extension, Query},
  http::StatusCode,
  response::Json,
};
use bentley::daemon_logs::{Level, LogQuery};
use uuid::Uuid;

use crate::server::{
  middleware::RequestContext,
  types::{ApiError, BaseResponse, LogsQuery, LogsResponse},
};

const DEFAULT_LOG_LIMIT: usize = 100;

/// GET /logs - Newest server log entries
pub async fn get_logs(
  Extension(context): Extension<RequestContext>,
  Query(params): Query<LogsQuery>,
) -> Result<Json<BaseResponse<LogsResponse>>, (StatusCode, Json<BaseResponse<()>>)> {
  let transaction_id = Uuid::new_v4();

  let level = match params.level.as_deref().map(str::parse::<Level>).transpose() {
    Ok(level) => level,
    Err(e) => {
      let error = ApiError::new("invalid_log_level", &e);
      return Err((StatusCode::BAD_REQUEST, Json(BaseResponse::<()>::error(vec![error], transaction_id))));
    }
  };

  let query = LogQuery { limit: Some(params.limit.unwrap_or(DEFAULT_LOG_LIMIT)), level };
  match context.logger.get_logs(query).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, transaction_id))),
    Err(e) => {
      context.log_error(&format!("Failed to read logs: {e}"), "logs-api").await;
      let error = ApiError::new("logs_read_failed", &format!("Failed to read logs: {e}"));
      Err((StatusCode::INTERNAL_SERVER_ERROR, Json(BaseResponse::<()>::error(vec![error], transaction_id))))
    }
  }
}
