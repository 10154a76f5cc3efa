//! Error type for `league-providers`.

use league_core::agent::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{service} returned {status}: {message}")]
  Status {
    service: &'static str,
    status:  u16,
    message: String,
  },

  #[error("no API key configured for {0}")]
  MissingApiKey(Provider),

  #[error("{0} returned no text")]
  EmptyResponse(&'static str),

  #[error("xml error: {0}")]
  Xml(String),
}

impl From<Error> for league_core::Error {
  fn from(e: Error) -> Self {
    match e {
      // Retrying cannot fix missing configuration.
      Error::MissingApiKey(_) => league_core::Error::Validation(e.to_string()),
      other => league_core::Error::Upstream(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
