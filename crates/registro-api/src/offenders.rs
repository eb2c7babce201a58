//! Handlers for `/offenders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/offenders` | Roster: identity + offender + custody per row |
//! | `POST` | `/offenders` | Register an existing person |
//! | `POST` | `/offenders/profile` | Atomic intake: person + record + custody |
//! | `GET`  | `/offenders/:id` | 404 if no offender record |
//! | `PUT`  | `/offenders/:id` | Replaces the offender record |
//! | `GET`  | `/offenders/:id/custody` | 404 if no custody row |
//! | `PUT`  | `/offenders/:id/custody` | Insert-or-replace |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use registro_core::{
  offender::{CustodyStatus, OffenderListRow, OffenderRecord},
  store::RecordStore,
  validate::{
    CustodyDraft, OffenderDraft, PersonDraft, ValidationErrors,
  },
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{AdminOnly, CurrentSession},
  error::{ApiError, store_err},
  persons::RecordView,
};

// ─── Roster ───────────────────────────────────────────────────────────────────

/// One roster row with the facility key resolved to its catalog name.
#[derive(Debug, Serialize)]
pub struct RosterRow {
  #[serde(flatten)]
  pub row:           OffenderListRow,
  pub facility_name: Option<&'static str>,
}

/// `GET /offenders` — the roster, one row per offender.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
) -> Result<Json<Vec<RosterRow>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = state.store.list_offenders().await.map_err(store_err)?;
  let rows = rows
    .into_iter()
    .map(|row| {
      let facility_name = row.facility.map(|f| f.name());
      RosterRow { row, facility_name }
    })
    .collect();
  Ok(Json(rows))
}

// ─── Register an existing person ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub person_id: i64,
  #[serde(flatten)]
  pub draft:     OffenderDraft,
}

/// `POST /offenders` — body: `{"person_id": N, ...offender form}`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = body.draft.validate()?;

  // Resolve the failure mode here so the client gets a specific message
  // instead of an opaque backend error.
  if state
    .store
    .get_person(body.person_id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!(
      "person {} not found",
      body.person_id
    )));
  }
  if state
    .store
    .get_offender(body.person_id)
    .await
    .map_err(store_err)?
    .is_some()
  {
    return Err(ApiError::BadRequest(format!(
      "person {} already has an offender record",
      body.person_id
    )));
  }

  let record = state
    .store
    .create_offender(body.person_id, input)
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Atomic profile intake ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub person:   PersonDraft,
  pub offender: OffenderDraft,
  pub custody:  Option<CustodyDraft>,
}

/// `POST /offenders/profile` — one submission that creates the person, the
/// offender record, and optionally the initial custody status.
///
/// All three forms are validated up front and their field errors reported
/// together; the store writes run in a single transaction, so a failure
/// anywhere leaves no partial profile behind.
pub async fn register_profile<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Json(body): Json<ProfileBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mut errors = Vec::new();

  let person = match body.person.validate() {
    Ok(p) => Some(p),
    Err(e) => {
      errors.extend(e.errors);
      None
    }
  };
  let offender = match body.offender.validate() {
    Ok(o) => Some(o),
    Err(e) => {
      errors.extend(e.errors);
      None
    }
  };
  let custody = match body.custody.as_ref().map(CustodyDraft::validate) {
    None => Some(None),
    Some(Ok(c)) => Some(Some(c)),
    Some(Err(e)) => {
      errors.extend(e.errors);
      None
    }
  };

  let (person, offender, custody) = match (person, offender, custody) {
    (Some(p), Some(o), Some(c)) if errors.is_empty() => (p, o, c),
    _ => return Err(ApiError::Validation(ValidationErrors { errors })),
  };

  let aggregate = state
    .store
    .register_offender_profile(person, offender, custody)
    .await
    .map_err(store_err)?;
  tracing::info!(
    id = aggregate.person.id,
    name = %aggregate.person.full_name(),
    "offender profile registered"
  );
  Ok((StatusCode::CREATED, Json(RecordView::new(aggregate))))
}

// ─── Get / update one record ──────────────────────────────────────────────────

/// `GET /offenders/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<OffenderRecord>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = state
    .store
    .get_offender(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("person {id} has no offender record"))
    })?;
  Ok(Json(record))
}

/// `PUT /offenders/:id` — replaces the offender record.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<i64>,
  Json(draft): Json<OffenderDraft>,
) -> Result<Json<OffenderRecord>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = draft.validate()?;

  if state
    .store
    .get_offender(id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!(
      "person {id} has no offender record"
    )));
  }

  let record = state
    .store
    .update_offender(id, input)
    .await
    .map_err(store_err)?;
  Ok(Json(record))
}

// ─── Custody ──────────────────────────────────────────────────────────────────

/// `GET /offenders/:id/custody`
pub async fn get_custody<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<CustodyStatus>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let status = state
    .store
    .get_custody(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("person {id} has no custody status"))
    })?;
  Ok(Json(status))
}

/// `PUT /offenders/:id/custody` — insert or replace. The offender record
/// must already exist; custody is never created for a civilian.
pub async fn put_custody<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<i64>,
  Json(draft): Json<CustodyDraft>,
) -> Result<Json<CustodyStatus>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = draft.validate()?;

  if state
    .store
    .get_offender(id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::BadRequest(format!(
      "person {id} has no offender record"
    )));
  }

  let status = state
    .store
    .set_custody(id, input)
    .await
    .map_err(store_err)?;
  Ok(Json(status))
}
