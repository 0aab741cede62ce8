//! HTTP Basic authentication for the protected routes
//!
//! Credentials come from `API_USERNAME` / `API_PASSWORD`. A server started
//! without them refuses protected requests with a 500 instead of serving
//! them unauthenticated.

use axum::{
  extract::{Request, State},
  http::{header, HeaderMap, HeaderValue, StatusCode},
  middleware::Next,
  response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::server::types::{ApiError, BaseResponse};

/// Configured username and password
#[derive(Clone)]
pub struct Credentials {
  username: String,
  password: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials").field("username", &self.username).finish_non_exhaustive()
  }
}

impl Credentials {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self { username: username.into(), password: password.into() }
  }

  /// Compare both halves without short-circuiting on the first mismatch
  pub fn verify(&self, username: &str, password: &str) -> bool {
    let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
    let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
    bool::from(user_ok & pass_ok)
  }
}

pub fn encode_basic(username: &str, password: &str) -> String {
  format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Extract `(username, password)` from an `Authorization: Basic ...` header
pub fn parse_basic(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, encoded) = value.split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("basic") {
    return None;
  }

  let decoded = STANDARD.decode(encoded.trim()).ok()?;
  let decoded = String::from_utf8(decoded).ok()?;
  let (username, password) = decoded.split_once(':')?;
  Some((username.to_string(), password.to_string()))
}

/// Middleware guarding the protected routes
pub async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
  let Some(credentials) = state.credentials.as_ref() else {
    bentley::error!("Rejecting request: API_USERNAME / API_PASSWORD are not configured");
    return auth_failure(
      StatusCode::INTERNAL_SERVER_ERROR,
      "security_not_configured",
      "Server security configuration error: credentials are not set",
    );
  };

  let authorized = parse_basic(request.headers())
    .map(|(username, password)| credentials.verify(&username, &password))
    .unwrap_or(false);

  if !authorized {
    let mut response =
      auth_failure(StatusCode::UNAUTHORIZED, "unauthorized", "Incorrect username or password");
    response.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
    return response;
  }

  next.run(request).await
}

fn auth_failure(status: StatusCode, key: &str, message: &str) -> Response {
  let error = ApiError::new(key, message);
  (status, Json(BaseResponse::<()>::error(vec![error], Uuid::new_v4()))).into_response()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn test_verify_requires_both_halves() {
    let credentials = Credentials::new("taller", "s3cret");
    assert!(credentials.verify("taller", "s3cret"));
    assert!(!credentials.verify("taller", "s3cret!"));
    assert!(!credentials.verify("Taller", "s3cret"));
    assert!(!credentials.verify("", ""));
  }

  #[test]
  fn test_parse_basic_round_trips() {
    let headers = headers_with(&encode_basic("taller", "pa:ss"));
    assert_eq!(parse_basic(&headers), Some(("taller".to_string(), "pa:ss".to_string())));
  }

  #[test]
  fn test_parse_basic_rejects_other_schemes() {
    assert_eq!(parse_basic(&headers_with("Bearer abc")), None);
    assert_eq!(parse_basic(&headers_with("Basic !!!")), None);
    assert_eq!(parse_basic(&HeaderMap::new()), None);
  }

  #[test]
  fn test_debug_hides_password() {
    let rendered = format!("{:?}", Credentials::new("taller", "s3cret"));
    assert!(rendered.contains("taller"));
    assert!(!rendered.contains("s3cret"));
  }
}
