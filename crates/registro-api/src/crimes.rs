//! Handlers for `/crimes` and the offender↔crime association.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/crimes` | Catalog of all recorded crimes |
//! | `POST` | `/crimes` | Body: a crime form |
//! | `GET`  | `/crimes/:id` | 404 if not found |
//! | `GET`  | `/offenders/:id/crimes` | Crimes linked to one offender |
//! | `POST` | `/offenders/:id/crimes` | Link an existing crime |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use registro_core::{
  offender::{Crime, CrimeLink},
  store::RecordStore,
  validate::CrimeDraft,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{AdminOnly, CurrentSession},
  error::{ApiError, store_err},
};

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /crimes`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
) -> Result<Json<Vec<Crime>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let crimes = state.store.list_crimes().await.map_err(store_err)?;
  Ok(Json(crimes))
}

/// `POST /crimes` — body: a crime form.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Json(draft): Json<CrimeDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = draft.validate()?;
  let crime = state.store.create_crime(input).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(crime)))
}

/// `GET /crimes/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<Crime>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let crime = state
    .store
    .get_crime(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("crime {id} not found")))?;
  Ok(Json(crime))
}

// ─── Per-offender association ─────────────────────────────────────────────────

/// `GET /offenders/:id/crimes`
pub async fn list_for_offender<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Crime>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
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

  let crimes = state.store.crimes_for(id).await.map_err(store_err)?;
  Ok(Json(crimes))
}

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub crime_id:        i64,
  #[serde(default)]
  pub participated_on: String,
  #[serde(default)]
  pub role:            String,
}

/// `POST /offenders/:id/crimes` — body: `{"crime_id": N, ...}`.
///
/// Both sides must already exist; the pair may be linked at most once. A
/// crime stays shareable between offenders.
pub async fn link<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<i64>,
  Json(body): Json<LinkBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let participated_on = parse_opt_date(&body.participated_on)?;
  let role = {
    let trimmed = body.role.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(trimmed.to_string())
    }
  };

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
  if state
    .store
    .get_crime(body.crime_id)
    .await
    .map_err(store_err)?
    .is_none()
  {
    return Err(ApiError::BadRequest(format!(
      "crime {} not found",
      body.crime_id
    )));
  }
  let already_linked = state
    .store
    .crimes_for(id)
    .await
    .map_err(store_err)?
    .iter()
    .any(|c| c.id == body.crime_id);
  if already_linked {
    return Err(ApiError::BadRequest(format!(
      "person {id} is already linked to crime {}",
      body.crime_id
    )));
  }

  let link = state
    .store
    .link_crime(CrimeLink {
      person_id: id,
      crime_id: body.crime_id,
      participated_on,
      role,
    })
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(link)))
}

fn parse_opt_date(value: &str) -> Result<Option<NaiveDate>, ApiError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .map(Some)
    .map_err(|_| {
      ApiError::BadRequest(format!("{trimmed:?} is not a valid date"))
    })
}
