//! The composition layer: person-centric views assembled in memory.
//!
//! The store hands back flat rows; everything here is a pure function over
//! those rows. Classification (offender vs. civilian) is never persisted —
//! it is recomputed from set membership every time the source collections
//! change, so the two can never drift apart.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  offender::{Crime, CustodyStatus, OffenderRecord},
  person::Person,
};

// ─── Classification ──────────────────────────────────────────────────────────

/// Derived label for a person: present in the offender-id set or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
  Civilian,
  Offender,
}

impl Classification {
  pub fn of(person_id: i64, offender_ids: &HashSet<i64>) -> Self {
    if offender_ids.contains(&person_id) {
      Self::Offender
    } else {
      Self::Civilian
    }
  }
}

/// Label every person in the collection. Empty inputs are fine: an empty
/// offender set makes everyone a civilian, an empty person collection
/// yields an empty map.
pub fn classify_all(
  persons: &[Person],
  offender_ids: &HashSet<i64>,
) -> HashMap<i64, Classification> {
  persons
    .iter()
    .map(|p| (p.id, Classification::of(p.id, offender_ids)))
    .collect()
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Which slice of the person collection a list screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassFilter {
  #[default]
  All,
  OffendersOnly,
  CiviliansOnly,
}

/// Retain the persons whose derived classification matches `filter`,
/// preserving relative input order. `All` returns the input unchanged.
pub fn filter_by_classification(
  persons: Vec<Person>,
  offender_ids: &HashSet<i64>,
  filter: ClassFilter,
) -> Vec<Person> {
  let wanted = match filter {
    ClassFilter::All => return persons,
    ClassFilter::OffendersOnly => Classification::Offender,
    ClassFilter::CiviliansOnly => Classification::Civilian,
  };
  persons
    .into_iter()
    .filter(|p| Classification::of(p.id, offender_ids) == wanted)
    .collect()
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
  #[default]
  Id,
  /// Expected-release date from the custody table, looked up per person.
  ExpectedRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Ascending,
  Descending,
}

/// Stable sort of the person collection.
///
/// For [`SortField::ExpectedRelease`], persons with no mapped date sort to
/// the end of the sequence in both directions: "no date" compares greater
/// than any date before the direction is applied, and that tie-break is
/// direction-independent. Equal keys keep their input order.
pub fn sort_by_field(
  persons: &mut [Person],
  field: SortField,
  direction: SortDirection,
  release_dates: &HashMap<i64, NaiveDate>,
) {
  use std::cmp::Ordering;

  persons.sort_by(|a, b| match field {
    SortField::Id => match direction {
      SortDirection::Ascending => a.id.cmp(&b.id),
      SortDirection::Descending => b.id.cmp(&a.id),
    },
    SortField::ExpectedRelease => {
      match (release_dates.get(&a.id), release_dates.get(&b.id)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(da), Some(db)) => match direction {
          SortDirection::Ascending => da.cmp(db),
          SortDirection::Descending => db.cmp(da),
        },
      }
    }
  });
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

/// A person merged with its optional relations for display. Omitted
/// relations stay `None` so a renderer can distinguish "no offender record"
/// from "offender record with empty fields".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAggregate {
  pub person:   Person,
  pub offender: Option<OffenderRecord>,
  pub custody:  Option<CustodyStatus>,
  pub crimes:   Vec<Crime>,
}

impl PersonAggregate {
  /// Derived at read time, never stored.
  pub fn is_offender(&self) -> bool { self.offender.is_some() }

  pub fn classification(&self) -> Classification {
    if self.is_offender() {
      Classification::Offender
    } else {
      Classification::Civilian
    }
  }
}

/// Merge optional related rows into one aggregate.
pub fn build_aggregate(
  person: Person,
  offender: Option<OffenderRecord>,
  custody: Option<CustodyStatus>,
  crimes: Vec<Crime>,
) -> PersonAggregate {
  PersonAggregate { person, offender, custody, crimes }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn person(id: i64) -> Person {
    Person {
      id,
      first_name:       format!("Nombre{id}"),
      paternal_surname: format!("Paterno{id}"),
      maternal_surname: format!("Materno{id}"),
      birth_date:       NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
      end_date:         None,
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn classify_all_handles_empty_inputs() {
    let empty_ids = HashSet::new();
    assert!(classify_all(&[], &empty_ids).is_empty());

    let persons = vec![person(1), person(2)];
    let labels = classify_all(&persons, &empty_ids);
    assert!(labels.values().all(|c| *c == Classification::Civilian));
  }

  #[test]
  fn classify_all_uses_set_membership() {
    let persons = vec![person(1), person(2), person(3)];
    let ids: HashSet<i64> = [2].into();
    let labels = classify_all(&persons, &ids);
    assert_eq!(labels[&1], Classification::Civilian);
    assert_eq!(labels[&2], Classification::Offender);
    assert_eq!(labels[&3], Classification::Civilian);
  }

  #[test]
  fn filter_all_returns_input_unchanged() {
    let persons = vec![person(3), person(1), person(2)];
    let ids: HashSet<i64> = [1].into();
    let out =
      filter_by_classification(persons.clone(), &ids, ClassFilter::All);
    assert_eq!(out, persons);
  }

  #[test]
  fn filter_partitions_without_overlap_or_loss() {
    let persons: Vec<Person> = (1..=6).map(person).collect();
    let ids: HashSet<i64> = [2, 4, 5].into();

    let offenders = filter_by_classification(
      persons.clone(),
      &ids,
      ClassFilter::OffendersOnly,
    );
    let civilians = filter_by_classification(
      persons.clone(),
      &ids,
      ClassFilter::CiviliansOnly,
    );

    assert_eq!(offenders.len() + civilians.len(), persons.len());
    let offender_set: HashSet<i64> = offenders.iter().map(|p| p.id).collect();
    let civilian_set: HashSet<i64> = civilians.iter().map(|p| p.id).collect();
    assert!(offender_set.is_disjoint(&civilian_set));

    let mut union: Vec<i64> = offender_set.union(&civilian_set).copied().collect();
    union.sort_unstable();
    assert_eq!(union, vec![1, 2, 3, 4, 5, 6]);

    // Relative input order is preserved within each half.
    assert_eq!(
      offenders.iter().map(|p| p.id).collect::<Vec<_>>(),
      vec![2, 4, 5]
    );
    assert_eq!(
      civilians.iter().map(|p| p.id).collect::<Vec<_>>(),
      vec![1, 3, 6]
    );
  }

  #[test]
  fn sort_by_id_both_directions() {
    let mut persons = vec![person(2), person(3), person(1)];
    let dates = HashMap::new();

    sort_by_field(&mut persons, SortField::Id, SortDirection::Ascending, &dates);
    assert_eq!(persons.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    sort_by_field(&mut persons, SortField::Id, SortDirection::Descending, &dates);
    assert_eq!(persons.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2, 1]);
  }

  #[test]
  fn missing_release_dates_sort_last_in_both_directions() {
    // A has no mapped date, B has 2024-01-01, C has 2023-01-01.
    let (a, b, c) = (person(1), person(2), person(3));
    let dates: HashMap<i64, NaiveDate> =
      [(2, date(2024, 1, 1)), (3, date(2023, 1, 1))].into();

    let mut asc = vec![a.clone(), b.clone(), c.clone()];
    sort_by_field(
      &mut asc,
      SortField::ExpectedRelease,
      SortDirection::Ascending,
      &dates,
    );
    assert_eq!(asc.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2, 1]);

    let mut desc = vec![a, b, c];
    sort_by_field(
      &mut desc,
      SortField::ExpectedRelease,
      SortDirection::Descending,
      &dates,
    );
    assert_eq!(desc.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3, 1]);
  }

  #[test]
  fn sort_is_idempotent() {
    let mut persons: Vec<Person> = vec![4, 1, 3, 2].into_iter().map(person).collect();
    let dates: HashMap<i64, NaiveDate> =
      [(1, date(2024, 5, 1)), (3, date(2022, 2, 2))].into();

    sort_by_field(
      &mut persons,
      SortField::ExpectedRelease,
      SortDirection::Ascending,
      &dates,
    );
    let once = persons.clone();
    sort_by_field(
      &mut persons,
      SortField::ExpectedRelease,
      SortDirection::Ascending,
      &dates,
    );
    assert_eq!(persons, once);
  }

  #[test]
  fn all_missing_dates_preserve_input_order() {
    let mut persons = vec![person(9), person(4), person(7)];
    let dates = HashMap::new();
    sort_by_field(
      &mut persons,
      SortField::ExpectedRelease,
      SortDirection::Descending,
      &dates,
    );
    assert_eq!(persons.iter().map(|p| p.id).collect::<Vec<_>>(), vec![9, 4, 7]);
  }

  #[test]
  fn aggregate_without_offender_has_absent_relations() {
    let agg = build_aggregate(person(1), None, None, Vec::new());
    assert!(agg.offender.is_none());
    assert!(agg.custody.is_none());
    assert!(agg.crimes.is_empty());
    assert!(!agg.is_offender());
    assert_eq!(agg.classification(), Classification::Civilian);
  }
}
