//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<drip_campaign::Error> for ApiError {
  fn from(e: drip_campaign::Error) -> Self {
    match e {
      drip_campaign::Error::Core(e) => ApiError::BadRequest(e.to_string()),
      drip_campaign::Error::AlreadyRegistered(email) => {
        ApiError::Conflict(format!("{email} is already registered"))
      }
      drip_campaign::Error::Store(e) => ApiError::Store(e),
      other => ApiError::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(_) | ApiError::Internal(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong; please try again later".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
