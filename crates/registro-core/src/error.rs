//! Error types for `registro-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(i64),

  #[error("person {0} has no offender record")]
  NoOffenderRecord(i64),

  #[error("person {0} is already registered as an offender")]
  AlreadyOffender(i64),

  #[error("crime not found: {0}")]
  CrimeNotFound(i64),

  #[error("unknown facility id: {0} (catalog keys are 1..=10)")]
  UnknownFacility(u8),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
