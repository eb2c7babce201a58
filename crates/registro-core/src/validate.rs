//! The form validation layer.
//!
//! Screens submit `*Draft` values: raw strings exactly as typed. Validation
//! either produces the typed `New*` input for the store or a list of
//! field-keyed errors. Every rule is evaluated independently so the UI can
//! attach each message next to its input; a submission goes through only if
//! the whole list is empty. Blank optional fields normalise to `None`
//! before persistence — storage never conflates "not provided" with
//! "empty text".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  facility::FacilityId,
  offender::{NewCrime, NewCustodyStatus, NewOffenderRecord},
  person::NewPerson,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Error types ─────────────────────────────────────────────────────────────

/// One failed rule, attached to the field it should be rendered next to.
/// Cross-field rules attach to the later field of the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("validation failed: {}", self.summary())]
pub struct ValidationErrors {
  pub errors: Vec<FieldError>,
}

impl ValidationErrors {
  fn summary(&self) -> String {
    self
      .errors
      .iter()
      .map(|e| format!("{}: {}", e.field, e.message))
      .collect::<Vec<_>>()
      .join("; ")
  }

  /// All errors attached to `field`.
  pub fn for_field(&self, field: &str) -> Vec<&FieldError> {
    self.errors.iter().filter(|e| e.field == field).collect()
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn push(errors: &mut Vec<FieldError>, field: &'static str, message: &str) {
  errors.push(FieldError { field, message: message.to_string() });
}

/// Required name component: at least two characters after trimming.
fn required_name(
  field: &'static str,
  value: &str,
  errors: &mut Vec<FieldError>,
) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.chars().count() < 2 {
    push(errors, field, "must be at least 2 characters");
    return None;
  }
  Some(trimmed.to_string())
}

/// Required free-text field: non-empty after trimming.
fn required_text(
  field: &'static str,
  value: &str,
  errors: &mut Vec<FieldError>,
) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    push(errors, field, "is required");
    return None;
  }
  Some(trimmed.to_string())
}

/// Optional free-text field: blank normalises to `None`.
fn optional_text(value: &str) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

fn required_date(
  field: &'static str,
  value: &str,
  errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
  match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
    Ok(d) => Some(d),
    Err(_) => {
      push(errors, field, "is not a valid date (expected YYYY-MM-DD)");
      None
    }
  }
}

/// Optional facility key. Blank is a valid "absent"; a non-blank value
/// must be an integer catalog key in 1..=10. The outer `Option` is `None`
/// only when an error was recorded.
fn optional_facility(
  field: &'static str,
  value: &str,
  errors: &mut Vec<FieldError>,
) -> Option<Option<FacilityId>> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Some(None);
  }
  match trimmed.parse::<u8>().ok().and_then(|key| FacilityId::new(key).ok())
  {
    Some(id) => Some(Some(id)),
    None => {
      push(errors, field, "must be a catalog key from 1 to 10");
      None
    }
  }
}

/// Optional date field. Blank is a valid "absent"; a non-blank value must
/// parse. The outer `Option` is `None` only when an error was recorded.
fn optional_date(
  field: &'static str,
  value: &str,
  errors: &mut Vec<FieldError>,
) -> Option<Option<NaiveDate>> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Some(None);
  }
  required_date(field, trimmed, errors).map(Some)
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// Raw person form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonDraft {
  #[serde(default)]
  pub first_name:       String,
  #[serde(default)]
  pub paternal_surname: String,
  #[serde(default)]
  pub maternal_surname: String,
  #[serde(default)]
  pub birth_date:       String,
  #[serde(default)]
  pub end_date:         String,
}

impl PersonDraft {
  pub fn validate(&self) -> Result<NewPerson, ValidationErrors> {
    let mut errors = Vec::new();

    let first_name =
      required_name("first_name", &self.first_name, &mut errors);
    let paternal_surname =
      required_name("paternal_surname", &self.paternal_surname, &mut errors);
    let maternal_surname =
      required_name("maternal_surname", &self.maternal_surname, &mut errors);
    let birth_date = required_date("birth_date", &self.birth_date, &mut errors);
    let end_date = optional_date("end_date", &self.end_date, &mut errors);

    // Vacuously satisfied unless both dates are present and parsed.
    if let (Some(birth), Some(Some(end))) = (birth_date, end_date.as_ref())
      && birth >= *end
    {
      push(
        &mut errors,
        "end_date",
        "birth date must be strictly before the end date",
      );
    }

    match (first_name, paternal_surname, maternal_surname, birth_date, end_date)
    {
      (Some(first), Some(paternal), Some(maternal), Some(birth), Some(end))
        if errors.is_empty() =>
      {
        Ok(NewPerson {
          first_name:       first,
          paternal_surname: paternal,
          maternal_surname: maternal,
          birth_date:       birth,
          end_date:         end,
        })
      }
      _ => Err(ValidationErrors { errors }),
    }
  }
}

// ─── Offender ────────────────────────────────────────────────────────────────

/// Raw offender registration input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffenderDraft {
  #[serde(default)]
  pub registered_on:   String,
  #[serde(default)]
  pub alias:           String,
  #[serde(default)]
  pub background:      String,
  #[serde(default)]
  pub detained_on:     String,
  #[serde(default)]
  pub detention_place: String,
}

impl OffenderDraft {
  pub fn validate(&self) -> Result<NewOffenderRecord, ValidationErrors> {
    let mut errors = Vec::new();

    let registered_on =
      required_date("registered_on", &self.registered_on, &mut errors);
    let detained_on =
      optional_date("detained_on", &self.detained_on, &mut errors);

    if let (Some(alta), Some(Some(detained))) =
      (registered_on, detained_on.as_ref())
      && alta > *detained
    {
      push(
        &mut errors,
        "detained_on",
        "registration date must be on or before the detention date",
      );
    }

    match (registered_on, detained_on) {
      (Some(registered), Some(detained)) if errors.is_empty() => {
        Ok(NewOffenderRecord {
          registered_on:   registered,
          alias:           optional_text(&self.alias),
          background:      optional_text(&self.background),
          detained_on:     detained,
          detention_place: optional_text(&self.detention_place),
        })
      }
      _ => Err(ValidationErrors { errors }),
    }
  }
}

// ─── Custody ─────────────────────────────────────────────────────────────────

/// Raw custody status input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustodyDraft {
  #[serde(default)]
  pub facility:         String,
  #[serde(default)]
  pub cell:             String,
  #[serde(default)]
  pub admitted_on:      String,
  #[serde(default)]
  pub expected_release: String,
  #[serde(default)]
  pub released_on:      String,
  #[serde(default)]
  pub reason:           String,
}

impl CustodyDraft {
  pub fn validate(&self) -> Result<NewCustodyStatus, ValidationErrors> {
    let mut errors = Vec::new();

    let facility = optional_facility("facility", &self.facility, &mut errors);

    let cell = required_text("cell", &self.cell, &mut errors);
    let admitted_on =
      required_date("admitted_on", &self.admitted_on, &mut errors);
    let expected_release =
      optional_date("expected_release", &self.expected_release, &mut errors);
    let released_on =
      optional_date("released_on", &self.released_on, &mut errors);
    let reason = required_text("reason", &self.reason, &mut errors);

    if let (Some(admitted), Some(Some(expected))) =
      (admitted_on, expected_release.as_ref())
      && admitted >= *expected
    {
      push(
        &mut errors,
        "expected_release",
        "admission date must be strictly before the expected release date",
      );
    }

    match (facility, cell, admitted_on, expected_release, released_on, reason)
    {
      (
        Some(facility),
        Some(cell),
        Some(admitted),
        Some(expected),
        Some(released),
        Some(reason),
      ) if errors.is_empty() => Ok(NewCustodyStatus {
        facility,
        cell,
        admitted_on: admitted,
        expected_release: expected,
        released_on: released,
        reason,
      }),
      _ => Err(ValidationErrors { errors }),
    }
  }
}

// ─── Crime ───────────────────────────────────────────────────────────────────

/// Raw crime form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrimeDraft {
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub occurred_on: String,
  #[serde(default)]
  pub location:    String,
}

impl CrimeDraft {
  pub fn validate(&self) -> Result<NewCrime, ValidationErrors> {
    let mut errors = Vec::new();

    let description =
      required_text("description", &self.description, &mut errors);
    let occurred_on =
      required_date("occurred_on", &self.occurred_on, &mut errors);

    match (description, occurred_on) {
      (Some(description), Some(occurred)) if errors.is_empty() => {
        Ok(NewCrime {
          description,
          occurred_on: occurred,
          location: optional_text(&self.location),
        })
      }
      _ => Err(ValidationErrors { errors }),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn person_draft() -> PersonDraft {
    PersonDraft {
      first_name:       "María".into(),
      paternal_surname: "García".into(),
      maternal_surname: "López".into(),
      birth_date:       "2000-01-01".into(),
      end_date:         "".into(),
    }
  }

  #[test]
  fn valid_person_passes() {
    let person = person_draft().validate().unwrap();
    assert_eq!(person.first_name, "María");
    assert_eq!(person.end_date, None);
  }

  #[test]
  fn short_name_is_rejected() {
    let mut draft = person_draft();
    draft.first_name = "M".into();
    let errs = draft.validate().unwrap_err();
    assert_eq!(errs.for_field("first_name").len(), 1);
  }

  #[test]
  fn unparseable_date_is_rejected() {
    let mut draft = person_draft();
    draft.birth_date = "not-a-date".into();
    let errs = draft.validate().unwrap_err();
    assert_eq!(errs.for_field("birth_date").len(), 1);
  }

  #[test]
  fn end_date_before_birth_is_rejected_on_end_date_field() {
    let mut draft = person_draft();
    draft.birth_date = "2000-01-01".into();
    draft.end_date = "1999-01-01".into();
    let errs = draft.validate().unwrap_err();
    assert_eq!(errs.for_field("end_date").len(), 1);
    assert!(errs.for_field("birth_date").is_empty());
  }

  #[test]
  fn end_date_after_birth_is_accepted() {
    let mut draft = person_draft();
    draft.end_date = "2001-01-01".into();
    let person = draft.validate().unwrap();
    assert_eq!(
      person.end_date,
      Some(NaiveDate::from_ymd_opt(2001, 1, 1).unwrap())
    );
  }

  #[test]
  fn absent_end_date_is_accepted_regardless_of_birth() {
    let draft = person_draft();
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn blank_optionals_normalise_to_none() {
    let draft = OffenderDraft {
      registered_on: "2020-05-05".into(),
      alias: "   ".into(),
      ..Default::default()
    };
    let record = draft.validate().unwrap();
    assert_eq!(record.alias, None);
    assert_eq!(record.background, None);
    assert_eq!(record.detained_on, None);
    assert_eq!(record.detention_place, None);
  }

  #[test]
  fn registration_after_detention_is_rejected() {
    let draft = OffenderDraft {
      registered_on: "2021-06-01".into(),
      detained_on: "2021-05-01".into(),
      ..Default::default()
    };
    let errs = draft.validate().unwrap_err();
    assert_eq!(errs.for_field("detained_on").len(), 1);
  }

  #[test]
  fn registration_on_detention_day_is_accepted() {
    let draft = OffenderDraft {
      registered_on: "2021-05-01".into(),
      detained_on: "2021-05-01".into(),
      ..Default::default()
    };
    assert!(draft.validate().is_ok());
  }

  fn custody_draft() -> CustodyDraft {
    CustodyDraft {
      facility:         "1".into(),
      cell:             "B-12".into(),
      admitted_on:      "2021-05-02".into(),
      expected_release: "".into(),
      released_on:      "".into(),
      reason:           "robo agravado".into(),
    }
  }

  #[test]
  fn facility_key_range_is_enforced() {
    assert!(custody_draft().validate().is_ok());

    let mut over = custody_draft();
    over.facility = "11".into();
    let errs = over.validate().unwrap_err();
    assert_eq!(errs.for_field("facility").len(), 1);

    let mut garbage = custody_draft();
    garbage.facility = "first".into();
    assert!(garbage.validate().is_err());
  }

  #[test]
  fn absent_facility_is_accepted() {
    let mut draft = custody_draft();
    draft.facility = "".into();
    let status = draft.validate().unwrap();
    assert_eq!(status.facility, None);

    draft.facility = "   ".into();
    assert_eq!(draft.validate().unwrap().facility, None);
  }

  #[test]
  fn admission_must_precede_expected_release() {
    let mut draft = custody_draft();
    draft.expected_release = "2021-05-02".into();
    let errs = draft.validate().unwrap_err();
    assert_eq!(errs.for_field("expected_release").len(), 1);

    draft.expected_release = "2021-05-03".into();
    assert!(draft.validate().is_ok());
  }

  #[test]
  fn all_failing_rules_are_reported_together() {
    let draft = PersonDraft::default();
    let errs = draft.validate().unwrap_err();
    // Three name fields and the birth date all fail independently.
    assert_eq!(errs.errors.len(), 4);
  }
}
