//! Offender extension records: the offender registration itself, the
//! custody status, crimes, and the offender↔crime association.
//!
//! `OffenderRecord` and `CustodyStatus` are 1:1 extensions keyed by the
//! parent person's identifier; they have no lifecycle of their own. A crime
//! is an independent entity shared between offenders through `CrimeLink`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::facility::FacilityId;

// ─── Offender registration ───────────────────────────────────────────────────

/// The row whose mere presence classifies a person as an offender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenderRecord {
  pub person_id:       i64,
  /// Date the person was entered into the offender registry ("alta").
  /// At most `detained_on` when both are present.
  pub registered_on:   NaiveDate,
  pub alias:           Option<String>,
  /// Free-text background notes.
  pub background:      Option<String>,
  pub detained_on:     Option<NaiveDate>,
  pub detention_place: Option<String>,
}

/// Offender fields without the parent key; the target person is named by
/// the store call that carries this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOffenderRecord {
  pub registered_on:   NaiveDate,
  pub alias:           Option<String>,
  pub background:      Option<String>,
  pub detained_on:     Option<NaiveDate>,
  pub detention_place: Option<String>,
}

impl NewOffenderRecord {
  pub fn into_record(self, person_id: i64) -> OffenderRecord {
    OffenderRecord {
      person_id,
      registered_on: self.registered_on,
      alias: self.alias,
      background: self.background,
      detained_on: self.detained_on,
      detention_place: self.detention_place,
    }
  }
}

// ─── Custody status ──────────────────────────────────────────────────────────

/// Incarceration state for an offender. Keyed by the same person id;
/// reachable only through an existing [`OffenderRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyStatus {
  pub person_id:        i64,
  /// Catalog reference; absent when the holding facility is not yet known.
  pub facility:         Option<FacilityId>,
  /// Cell identifier within the facility; free text.
  pub cell:             String,
  /// Strictly before `expected_release` when both are present.
  pub admitted_on:      NaiveDate,
  pub expected_release: Option<NaiveDate>,
  pub released_on:      Option<NaiveDate>,
  pub reason:           String,
}

/// Custody fields without the parent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustodyStatus {
  pub facility:         Option<FacilityId>,
  pub cell:             String,
  pub admitted_on:      NaiveDate,
  pub expected_release: Option<NaiveDate>,
  pub released_on:      Option<NaiveDate>,
  pub reason:           String,
}

impl NewCustodyStatus {
  pub fn into_status(self, person_id: i64) -> CustodyStatus {
    CustodyStatus {
      person_id,
      facility: self.facility,
      cell: self.cell,
      admitted_on: self.admitted_on,
      expected_release: self.expected_release,
      released_on: self.released_on,
      reason: self.reason,
    }
  }
}

// ─── Crimes ──────────────────────────────────────────────────────────────────

/// An independent crime entity, shared (not owned) by offenders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crime {
  pub id:          i64,
  pub description: String,
  pub occurred_on: NaiveDate,
  pub location:    Option<String>,
}

/// Input to [`crate::store::RecordStore::create_crime`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCrime {
  pub description: String,
  pub occurred_on: NaiveDate,
  pub location:    Option<String>,
}

/// Many-to-many association between an offender and a crime. A crime may be
/// linked to several offenders; nothing here assumes exclusivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeLink {
  pub person_id:       i64,
  pub crime_id:        i64,
  pub participated_on: Option<NaiveDate>,
  /// Role label, e.g. "autor material".
  pub role:            Option<String>,
}

// ─── List row ────────────────────────────────────────────────────────────────

/// One row of the offender roster: person identity joined with the offender
/// record and whatever custody data exists. Produced by the store so the
/// roster screen needs a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenderListRow {
  pub person_id:        i64,
  pub first_name:       String,
  pub paternal_surname: String,
  pub maternal_surname: String,
  pub alias:            Option<String>,
  pub detained_on:      Option<NaiveDate>,
  pub facility:         Option<FacilityId>,
  pub cell:             Option<String>,
  pub admitted_on:      Option<NaiveDate>,
}
