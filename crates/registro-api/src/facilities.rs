//! Handler for `GET /facilities` — the static facility catalog.

use axum::Json;
use registro_core::facility::FACILITY_CATALOG;
use serde::Serialize;

use crate::auth::CurrentSession;

#[derive(Debug, Serialize)]
pub struct FacilityEntry {
  pub id:   u8,
  pub name: &'static str,
}

/// `GET /facilities` — the compiled-in catalog, in key order.
pub async fn list(_session: CurrentSession) -> Json<Vec<FacilityEntry>> {
  Json(
    FACILITY_CATALOG
      .iter()
      .map(|&(id, name)| FacilityEntry { id, name })
      .collect(),
  )
}
