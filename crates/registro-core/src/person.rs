//! Person — the root identity record.
//!
//! Everything else in the registry (offender record, custody status, crime
//! links) hangs off a person's store-assigned numeric identifier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered person. The offender/civilian distinction is never stored
/// on this row; it is derived from the presence of an
/// [`OffenderRecord`](crate::offender::OffenderRecord).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  /// Assigned by the store on creation.
  pub id:               i64,
  pub first_name:       String,
  pub paternal_surname: String,
  pub maternal_surname: String,
  pub birth_date:       NaiveDate,
  /// Record-closure date; strictly after `birth_date` when present.
  pub end_date:         Option<NaiveDate>,
}

impl Person {
  /// Display name in the order the registry prints it.
  pub fn full_name(&self) -> String {
    format!(
      "{} {} {}",
      self.first_name, self.paternal_surname, self.maternal_surname
    )
  }
}

/// Input to [`crate::store::RecordStore::create_person`].
/// The `id` is always assigned by the store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
  pub first_name:       String,
  pub paternal_surname: String,
  pub maternal_surname: String,
  pub birth_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
}
