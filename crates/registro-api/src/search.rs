//! Handler for `GET /search`.
//!
//! Query params map directly to [`PersonQuery`] fields. Blank values count
//! as absent, so a form submitted with empty inputs returns everyone.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use registro_core::{
  person::Person,
  store::{PersonQuery, RecordStore},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::CurrentSession,
  error::{ApiError, store_err},
};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Exact identifier match.
  pub id:               Option<i64>,
  pub first_name:       Option<String>,
  pub paternal_surname: Option<String>,
  pub maternal_surname: Option<String>,
  pub birth_date:       Option<NaiveDate>,
  pub end_date:         Option<NaiveDate>,
  pub limit:            Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.and_then(|s| {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(trimmed.to_string())
    }
  })
}

/// `GET /search[?id=...][&first_name=...][&paternal_surname=...][&birth_date=...][&limit=...]`
///
/// Criteria compose with AND; names match case-insensitive substrings,
/// everything else matches exactly. Results come back ordered by paternal
/// surname ascending.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  _session: CurrentSession,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = PersonQuery {
    id:               params.id,
    first_name:       non_blank(params.first_name),
    paternal_surname: non_blank(params.paternal_surname),
    maternal_surname: non_blank(params.maternal_surname),
    birth_date:       params.birth_date,
    end_date:         params.end_date,
    limit:            params.limit,
  };

  let persons = state
    .store
    .search_persons(&query)
    .await
    .map_err(store_err)?;
  Ok(Json(persons))
}
