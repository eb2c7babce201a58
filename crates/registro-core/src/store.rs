//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `registro-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend. Store calls are never retried here; an
//! error is forwarded to the caller, which owns the user-visible message.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use chrono::NaiveDate;

use crate::{
  compose::PersonAggregate,
  offender::{
    Crime, CrimeLink, CustodyStatus, NewCrime, NewCustodyStatus,
    NewOffenderRecord, OffenderListRow, OffenderRecord,
  },
  person::{NewPerson, Person},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::search_persons`]. Every present criterion
/// narrows the result; an empty query returns the full collection (bounded
/// by `limit`). Identifier and dates match exactly; name fields match
/// case-insensitive substrings. Results are ordered by paternal surname
/// ascending.
#[derive(Debug, Clone, Default)]
pub struct PersonQuery {
  pub id:               Option<i64>,
  pub first_name:       Option<String>,
  pub paternal_surname: Option<String>,
  pub maternal_surname: Option<String>,
  pub birth_date:       Option<NaiveDate>,
  pub end_date:         Option<NaiveDate>,
  /// Defaults to 500 in the backend when unset.
  pub limit:            Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a registry storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Persist a new person and return it with its store-assigned id.
  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Replace all mutable fields of an existing person.
  fn update_person(
    &self,
    id: i64,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// List every person, ordered by id ascending.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Multi-criteria search; see [`PersonQuery`].
  fn search_persons<'a>(
    &'a self,
    query: &'a PersonQuery,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;

  // ── Offender records ──────────────────────────────────────────────────

  /// Register an existing person as an offender. Fails if the person does
  /// not exist or already has an offender record.
  fn create_offender(
    &self,
    person_id: i64,
    input: NewOffenderRecord,
  ) -> impl Future<Output = Result<OffenderRecord, Self::Error>> + Send + '_;

  fn get_offender(
    &self,
    person_id: i64,
  ) -> impl Future<Output = Result<Option<OffenderRecord>, Self::Error>> + Send + '_;

  fn update_offender(
    &self,
    person_id: i64,
    input: NewOffenderRecord,
  ) -> impl Future<Output = Result<OffenderRecord, Self::Error>> + Send + '_;

  /// The offender roster: identity joined with offender and custody data,
  /// ordered by person id ascending.
  fn list_offenders(
    &self,
  ) -> impl Future<Output = Result<Vec<OffenderListRow>, Self::Error>> + Send + '_;

  /// The id set that drives derived classification.
  fn offender_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + '_;

  // ── Custody ───────────────────────────────────────────────────────────

  /// Insert or replace the custody status for an offender. Fails if the
  /// person has no offender record.
  fn set_custody(
    &self,
    person_id: i64,
    input: NewCustodyStatus,
  ) -> impl Future<Output = Result<CustodyStatus, Self::Error>> + Send + '_;

  fn get_custody(
    &self,
    person_id: i64,
  ) -> impl Future<Output = Result<Option<CustodyStatus>, Self::Error>> + Send + '_;

  /// person id → expected-release date, for every custody row that has
  /// one. Feeds [`crate::compose::sort_by_field`].
  fn expected_release_dates(
    &self,
  ) -> impl Future<Output = Result<HashMap<i64, NaiveDate>, Self::Error>> + Send + '_;

  // ── Crimes ────────────────────────────────────────────────────────────

  fn create_crime(
    &self,
    input: NewCrime,
  ) -> impl Future<Output = Result<Crime, Self::Error>> + Send + '_;

  /// Retrieve a crime by id. Returns `None` if not found.
  fn get_crime(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Crime>, Self::Error>> + Send + '_;

  fn list_crimes(
    &self,
  ) -> impl Future<Output = Result<Vec<Crime>, Self::Error>> + Send + '_;

  /// Crimes linked to an offender, ordered by crime id.
  fn crimes_for(
    &self,
    person_id: i64,
  ) -> impl Future<Output = Result<Vec<Crime>, Self::Error>> + Send + '_;

  /// Associate an offender with a crime. Fails if either side is missing
  /// or the pair is already linked.
  fn link_crime(
    &self,
    link: CrimeLink,
  ) -> impl Future<Output = Result<CrimeLink, Self::Error>> + Send + '_;

  // ── Composition ───────────────────────────────────────────────────────

  /// The full person-centric aggregate for a detail view. Returns `None`
  /// if the person does not exist; relations the person lacks stay absent.
  fn get_person_record(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<PersonAggregate>, Self::Error>> + Send + '_;

  /// Atomic offender intake: create the person, their offender record, and
  /// optionally an initial custody status in a single transaction. Either
  /// all rows are committed or none — no orphaned partial records.
  fn register_offender_profile(
    &self,
    person: NewPerson,
    offender: NewOffenderRecord,
    custody: Option<NewCustodyStatus>,
  ) -> impl Future<Output = Result<PersonAggregate, Self::Error>> + Send + '_;
}
