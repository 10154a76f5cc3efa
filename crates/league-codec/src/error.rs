//! Error types for the league codecs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("YAML error: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

impl From<Error> for league_core::Error {
  fn from(e: Error) -> Self { league_core::Error::Validation(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
