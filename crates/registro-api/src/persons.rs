//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Optional `?filter=`, `?sort=`, `?direction=` |
//! | `POST` | `/persons` | Body: a person form |
//! | `GET`  | `/persons/:id` | 404 if not found |
//! | `PUT`  | `/persons/:id` | Replaces all fields |
//! | `GET`  | `/persons/:id/record` | The full aggregate |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use registro_core::{
  compose::{
    ClassFilter, Classification, PersonAggregate, SortDirection, SortField,
    filter_by_classification, sort_by_field,
  },
  person::Person,
  store::RecordStore,
  validate::PersonDraft,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{AdminOnly, CurrentSession},
  error::{ApiError, store_err},
};

// ─── Views ────────────────────────────────────────────────────────────────────

/// A person with its derived classification attached, as list and detail
/// screens render it.
#[derive(Debug, Serialize)]
pub struct PersonView {
  #[serde(flatten)]
  pub person:         Person,
  pub classification: Classification,
}

/// [`PersonAggregate`] with the derived label alongside.
#[derive(Debug, Serialize)]
pub struct RecordView {
  #[serde(flatten)]
  pub aggregate:      PersonAggregate,
  pub classification: Classification,
}

impl RecordView {
  pub fn new(aggregate: PersonAggregate) -> Self {
    let classification = aggregate.classification();
    Self { aggregate, classification }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
  pub filter:    ClassFilter,
  pub sort:      SortField,
  pub direction: SortDirection,
}

/// `GET /persons[?filter=&sort=&direction=]`
///
/// Filtering and sorting compose over the same snapshot of the offender-id
/// set, so the labels shown can never disagree with the slice selected.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PersonView>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let persons = state.store.list_persons().await.map_err(store_err)?;
  let offender_ids = state.store.offender_ids().await.map_err(store_err)?;

  let mut persons =
    filter_by_classification(persons, &offender_ids, params.filter);

  let release_dates = match params.sort {
    SortField::ExpectedRelease => state
      .store
      .expected_release_dates()
      .await
      .map_err(store_err)?,
    SortField::Id => Default::default(),
  };
  sort_by_field(&mut persons, params.sort, params.direction, &release_dates);

  let views = persons
    .into_iter()
    .map(|p| {
      let classification = Classification::of(p.id, &offender_ids);
      PersonView { person: p, classification }
    })
    .collect();
  Ok(Json(views))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /persons` — body: a person form, validated field by field.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Json(draft): Json<PersonDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = draft.validate()?;
  let person = state.store.create_person(input).await.map_err(store_err)?;
  tracing::info!(id = person.id, name = %person.full_name(), "person created");
  let view = PersonView {
    person,
    classification: Classification::Civilian,
  };
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<PersonView>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let offender_ids = state.store.offender_ids().await.map_err(store_err)?;
  let classification = Classification::of(person.id, &offender_ids);
  Ok(Json(PersonView { person, classification }))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /persons/:id` — replaces every mutable field.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<i64>,
  Json(draft): Json<PersonDraft>,
) -> Result<Json<PersonView>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = draft.validate()?;

  if state
    .store
    .get_person(id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }

  let person = state
    .store
    .update_person(id, input)
    .await
    .map_err(store_err)?;

  let offender_ids = state.store.offender_ids().await.map_err(store_err)?;
  let classification = Classification::of(person.id, &offender_ids);
  Ok(Json(PersonView { person, classification }))
}

// ─── Full record ──────────────────────────────────────────────────────────────

/// `GET /persons/:id/record` — the person with every related row merged in.
pub async fn record<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<RecordView>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let aggregate = state
    .store
    .get_person_record(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(RecordView::new(aggregate)))
}
