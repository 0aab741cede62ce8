//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::auth::require_basic_auth;
use crate::server::handlers::{cases, logs, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  // Protected routes - require Basic authentication
  let protected = Router::new()
    .route("/", get(status::root))
    .route("/logs", get(logs::get_logs))
    .route("/api/cases", post(cases::create_case))
    .route("/api/cases/search", post(cases::search_cases))
    .route("/api/cases/{id}", get(cases::get_case))
    .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

  let public = Router::new()
    .route("/health", get(status::health))
    .route("/api/cases/groups", get(cases::list_groups));

  protected
    .merge(public)
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
