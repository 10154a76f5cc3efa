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
  #[error(transparent)]
  League(#[from] league_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  /// Lift any backend error into the league taxonomy.
  pub fn from_backend<E: Into<league_core::Error>>(e: E) -> Self { Self::League(e.into()) }

  pub fn status(&self) -> StatusCode {
    use league_core::Error as E;
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::League(e) => match e {
        E::NotFound { .. } => StatusCode::NOT_FOUND,
        E::Validation(_) | E::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        E::Conflict(_) => StatusCode::CONFLICT,
        E::Upstream(_) => StatusCode::BAD_GATEWAY,
        E::Storage(_) | E::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::BadRequest(_) => "validation",
      Self::League(e) => e.code(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "code": self.code() });
    (status, Json(body)).into_response()
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use league_core::{Error, lifecycle::MatchStatus};

  use super::*;

  #[test]
  fn statuses_follow_the_taxonomy() {
    let cases = [
      (Error::not_found("paper", "x"), StatusCode::NOT_FOUND),
      (Error::Validation("bad".into()), StatusCode::BAD_REQUEST),
      (
        Error::InvalidTransition { from: MatchStatus::Completed, to: MatchStatus::Error },
        StatusCode::BAD_REQUEST,
      ),
      (Error::Conflict("dup".into()), StatusCode::CONFLICT),
      (Error::Upstream("503".into()), StatusCode::BAD_GATEWAY),
      (Error::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (e, status) in cases {
      assert_eq!(ApiError::from(e).status(), status);
    }
  }

  #[test]
  fn bad_request_reports_validation_code() {
    let e = ApiError::BadRequest("limit".into());
    assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    assert_eq!(e.code(), "validation");
  }
}
