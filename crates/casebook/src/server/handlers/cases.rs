//! Diagnostic case endpoint handlers

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, Path, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use serde_json::json;
use uuid::Uuid;

use crate::server::errors::CaseError;
use crate::server::middleware::RequestContext;
use crate::server::models::case::SearchQuery;
use crate::server::state::AppState;
use crate::server::types::{
  ApiError, BaseResponse, CaseData, CreateCaseRequest, GroupsResponse, SearchRequest, SearchResponse,
};

type ErrorResponse = (StatusCode, ResponseJson<BaseResponse<()>>);

/// POST /api/cases - Register a new diagnostic case
pub async fn create_case(
  Extension(context): Extension<RequestContext>,
  State(state): State<AppState>,
  payload: Result<Json<CreateCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<BaseResponse<CaseData>>), ErrorResponse> {
  let transaction_id = Uuid::new_v4();
  let Json(request) = payload.map_err(|rejection| body_rejected(rejection, transaction_id))?;

  match state.engine.create_case(request).await {
    Ok(case) => {
      let message = if case.has_embedding() {
        format!("Created case {} with embedding", case.id)
      } else {
        format!("Created case {} without embedding", case.id)
      };
      context.log_success(&message, "cases-api").await;

      Ok((StatusCode::CREATED, ResponseJson(BaseResponse::success(CaseData { case }, transaction_id))))
    }
    Err(e) => Err(case_error(&context, e, transaction_id).await),
  }
}

/// POST /api/cases/search - Hybrid search over stored cases
pub async fn search_cases(
  Extension(context): Extension<RequestContext>,
  State(state): State<AppState>,
  payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<ResponseJson<BaseResponse<SearchResponse>>, ErrorResponse> {
  let transaction_id = Uuid::new_v4();
  let Json(request) = payload.map_err(|rejection| body_rejected(rejection, transaction_id))?;
  let query = SearchQuery {
    text: request.query,
    model_filter: request.model_filter,
    construction_group: request.construction_group,
  };

  match state.engine.search_cases(&query).await {
    Ok(results) => {
      context.log_info(&format!("Search returned {} result(s)", results.len()), "cases-api").await;
      let count = results.len();
      Ok(ResponseJson(BaseResponse::success(SearchResponse { results, count }, transaction_id)))
    }
    Err(e) => Err(case_error(&context, e, transaction_id).await),
  }
}

/// GET /api/cases/groups - Construction groups accepted by the API
pub async fn list_groups(State(state): State<AppState>) -> ResponseJson<BaseResponse<GroupsResponse>> {
  let groups = state.engine.construction_groups();
  ResponseJson(BaseResponse::success(GroupsResponse { groups }, Uuid::new_v4()))
}

/// GET /api/cases/{id} - Fetch one case
pub async fn get_case(
  Extension(context): Extension<RequestContext>,
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> Result<ResponseJson<BaseResponse<CaseData>>, ErrorResponse> {
  let transaction_id = Uuid::new_v4();

  match state.engine.get_case(id).await {
    Ok(Some(case)) => Ok(ResponseJson(BaseResponse::success(CaseData { case }, transaction_id))),
    Ok(None) => {
      let error =
        ApiError::new("case_not_found", &format!("Case {id} not found")).with_context(json!({ "id": id }));
      Err((StatusCode::NOT_FOUND, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id))))
    }
    Err(e) => Err(case_error(&context, e, transaction_id).await),
  }
}

/// Map a domain failure onto its HTTP status and error envelope
pub fn case_error_status(error: &CaseError) -> (StatusCode, &'static str) {
  match error {
    CaseError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
    CaseError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failed"),
  }
}

/// Malformed or mistyped request bodies are validation failures
fn body_rejected(rejection: JsonRejection, transaction_id: Uuid) -> ErrorResponse {
  let error = ApiError::new("validation_failed", &rejection.body_text())
    .with_context(json!({ "rejection_status": rejection.status().as_u16() }));
  (StatusCode::UNPROCESSABLE_ENTITY, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

async fn case_error(context: &RequestContext, error: CaseError, transaction_id: Uuid) -> ErrorResponse {
  let (status, key) = case_error_status(&error);
  let message = match &error {
    CaseError::Validation { message } => message.clone(),
    CaseError::Persistence(_) => error.to_string(),
  };

  if status.is_server_error() {
    context.log_error(&message, "cases-api").await;
  } else {
    context.log_warn(&message, "cases-api").await;
  }

  let api_error = ApiError::new(key, &message);
  (status, ResponseJson(BaseResponse::<()>::error(vec![api_error], transaction_id)))
}
