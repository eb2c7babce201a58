//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Calendar dates are stored as ISO 8601 strings (`YYYY-MM-DD`); facility
//! references as the raw integer catalog key.

use chrono::NaiveDate;
use registro_core::{
  facility::FacilityId,
  offender::{Crime, CustodyStatus, OffenderListRow, OffenderRecord},
  person::Person,
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── Facility ────────────────────────────────────────────────────────────────

pub fn decode_facility(key: i64) -> Result<FacilityId> {
  let key = u8::try_from(key)
    .map_err(|_| registro_core::Error::UnknownFacility(u8::MAX))?;
  Ok(FacilityId::new(key)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub id:               i64,
  pub first_name:       String,
  pub paternal_surname: String,
  pub maternal_surname: String,
  pub birth_date:       String,
  pub end_date:         Option<String>,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:               self.id,
      first_name:       self.first_name,
      paternal_surname: self.paternal_surname,
      maternal_surname: self.maternal_surname,
      birth_date:       decode_date(&self.birth_date)?,
      end_date:         decode_opt_date(self.end_date.as_deref())?,
    })
  }
}

/// Raw strings read directly from an `offenders` row.
pub struct RawOffender {
  pub person_id:       i64,
  pub registered_on:   String,
  pub alias:           Option<String>,
  pub background:      Option<String>,
  pub detained_on:     Option<String>,
  pub detention_place: Option<String>,
}

impl RawOffender {
  pub fn into_record(self) -> Result<OffenderRecord> {
    Ok(OffenderRecord {
      person_id:       self.person_id,
      registered_on:   decode_date(&self.registered_on)?,
      alias:           self.alias,
      background:      self.background,
      detained_on:     decode_opt_date(self.detained_on.as_deref())?,
      detention_place: self.detention_place,
    })
  }
}

/// Raw values read directly from a `custody_statuses` row.
pub struct RawCustody {
  pub person_id:        i64,
  pub facility_id:      Option<i64>,
  pub cell:             String,
  pub admitted_on:      String,
  pub expected_release: Option<String>,
  pub released_on:      Option<String>,
  pub reason:           String,
}

impl RawCustody {
  pub fn into_status(self) -> Result<CustodyStatus> {
    Ok(CustodyStatus {
      person_id:        self.person_id,
      facility:         self.facility_id.map(decode_facility).transpose()?,
      cell:             self.cell,
      admitted_on:      decode_date(&self.admitted_on)?,
      expected_release: decode_opt_date(self.expected_release.as_deref())?,
      released_on:      decode_opt_date(self.released_on.as_deref())?,
      reason:           self.reason,
    })
  }
}

/// Raw strings read directly from a `crimes` row.
pub struct RawCrime {
  pub id:          i64,
  pub description: String,
  pub occurred_on: String,
  pub location:    Option<String>,
}

impl RawCrime {
  pub fn into_crime(self) -> Result<Crime> {
    Ok(Crime {
      id:          self.id,
      description: self.description,
      occurred_on: decode_date(&self.occurred_on)?,
      location:    self.location,
    })
  }
}

/// Raw roster row: persons joined with offenders, left-joined with custody.
pub struct RawOffenderRow {
  pub person_id:        i64,
  pub first_name:       String,
  pub paternal_surname: String,
  pub maternal_surname: String,
  pub alias:            Option<String>,
  pub detained_on:      Option<String>,
  pub facility_id:      Option<i64>,
  pub cell:             Option<String>,
  pub admitted_on:      Option<String>,
}

impl RawOffenderRow {
  pub fn into_row(self) -> Result<OffenderListRow> {
    Ok(OffenderListRow {
      person_id:        self.person_id,
      first_name:       self.first_name,
      paternal_surname: self.paternal_surname,
      maternal_surname: self.maternal_surname,
      alias:            self.alias,
      detained_on:      decode_opt_date(self.detained_on.as_deref())?,
      facility:         self.facility_id.map(decode_facility).transpose()?,
      cell:             self.cell,
      admitted_on:      decode_opt_date(self.admitted_on.as_deref())?,
    })
  }
}
