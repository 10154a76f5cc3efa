//! Error type for `league-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] league_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unrecognised column value: {0}")]
  Decode(String),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },
}

impl Error {
  /// `true` for UNIQUE, CHECK and foreign-key violations.
  pub fn is_constraint_violation(&self) -> bool {
    matches!(
      self,
      Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
  }
}

impl From<Error> for league_core::Error {
  fn from(e: Error) -> Self {
    if e.is_constraint_violation() {
      return league_core::Error::Conflict(e.to_string());
    }
    match e {
      Error::Core(core) => core,
      Error::NotFound { entity, id } => league_core::Error::not_found(entity, id),
      Error::Json(json) => league_core::Error::Serialization(json),
      other => league_core::Error::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
