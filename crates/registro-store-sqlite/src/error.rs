//! Error type for `registro-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] registro_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  #[error("person not found: {0}")]
  PersonNotFound(i64),

  /// Attempted an offender or custody operation for a person with no
  /// offender record.
  #[error("person {0} has no offender record")]
  NoOffenderRecord(i64),

  #[error("person {0} is already registered as an offender")]
  AlreadyOffender(i64),

  #[error("crime not found: {0}")]
  CrimeNotFound(i64),

  #[error("offender {person_id} is already linked to crime {crime_id}")]
  AlreadyLinked { person_id: i64, crime_id: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
