//! JSON REST API for the registry.
//!
//! Exposes an axum [`Router`] backed by any [`registro_core::store::RecordStore`].
//! Every route requires HTTP Basic auth; write routes additionally require
//! the `ADMIN` role. See [`auth`] for how sessions are resolved.

pub mod auth;
pub mod crimes;
pub mod error;
pub mod facilities;
pub mod offenders;
pub mod persons;
pub mod search;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use registro_core::{session::Role, store::RecordStore};
use serde::Deserialize;

use auth::{Account, AuthConfig};
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// One account entry in `config.toml`.
#[derive(Deserialize, Clone)]
pub struct AccountConfig {
  pub username:      String,
  /// argon2 PHC string; generate one with `server --hash-password`.
  pub password_hash: String,
  pub display_name:  String,
  pub role:          Role,
}

impl AccountConfig {
  pub fn into_account(self) -> Account {
    Account {
      username:      self.username,
      password_hash: self.password_hash,
      display_name:  self.display_name,
      role:          self.role,
    }
  }
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub accounts:   Vec<AccountConfig>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S>).put(persons::update::<S>),
    )
    .route("/persons/{id}/record", get(persons::record::<S>))
    // Offenders
    .route(
      "/offenders",
      get(offenders::list::<S>).post(offenders::create::<S>),
    )
    .route("/offenders/profile", post(offenders::register_profile::<S>))
    .route(
      "/offenders/{id}",
      get(offenders::get_one::<S>).put(offenders::update::<S>),
    )
    .route(
      "/offenders/{id}/custody",
      get(offenders::get_custody::<S>).put(offenders::put_custody::<S>),
    )
    .route(
      "/offenders/{id}/crimes",
      get(crimes::list_for_offender::<S>).post(crimes::link::<S>),
    )
    // Crimes
    .route("/crimes", get(crimes::list::<S>).post(crimes::create::<S>))
    .route("/crimes/{id}", get(crimes::get_one::<S>))
    // Search and catalogs
    .route("/search", get(search::handler::<S>))
    .route("/facilities", get(facilities::list))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use registro_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();

    AppState {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig {
        accounts: vec![
          Account {
            username:      "admin".to_string(),
            password_hash: hash.clone(),
            display_name:  "Administrator".to_string(),
            role:          Role::Admin,
          },
          Account {
            username:      "viewer".to_string(),
            password_hash: hash,
            display_name:  "Read Only".to_string(),
            role:          Role::Viewer,
          },
        ],
      }),
    }
  }

  fn basic(user: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:secret")))
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn person_body(first: &str, paternal: &str) -> Value {
    json!({
      "first_name": first,
      "paternal_surname": paternal,
      "maternal_surname": "Lopez",
      "birth_date": "1990-04-12",
    })
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_request_returns_401() {
    let state = make_state().await;
    let (status, _) = send(state, "GET", "/persons", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn bad_password_returns_401() {
    let state = make_state().await;
    let auth = format!("Basic {}", B64.encode("admin:wrong"));
    let req = Request::builder()
      .method("GET")
      .uri("/persons")
      .header(header::AUTHORIZATION, auth)
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn viewer_can_read_but_not_write() {
    let state = make_state().await;

    let (status, _) =
      send(state.clone(), "GET", "/persons", Some("viewer"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
      state,
      "POST",
      "/persons",
      Some("viewer"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Persons ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_and_get_person() {
    let state = make_state().await;

    let (status, created) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = send(
      state,
      "GET",
      &format!("/persons/{id}"),
      Some("viewer"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["first_name"], "Ana");
    assert_eq!(fetched["classification"], "civilian");
  }

  #[tokio::test]
  async fn get_missing_person_returns_404() {
    let state = make_state().await;
    let (status, _) =
      send(state, "GET", "/persons/999", Some("viewer"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_person_returns_422_with_field_errors() {
    let state = make_state().await;

    let (status, body) = send(
      state,
      "POST",
      "/persons",
      Some("admin"),
      Some(json!({
        "first_name": "A",
        "paternal_surname": "Garcia",
        "maternal_surname": "Lopez",
        "birth_date": "2000-01-01",
        "end_date": "1999-01-01",
      })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
      .as_array()
      .unwrap()
      .iter()
      .map(|f| f["field"].as_str().unwrap())
      .collect();
    assert!(fields.contains(&"first_name"), "fields: {fields:?}");
    assert!(fields.contains(&"end_date"), "fields: {fields:?}");
  }

  #[tokio::test]
  async fn update_person_replaces_fields() {
    let state = make_state().await;

    let (_, created) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
      state,
      "PUT",
      &format!("/persons/{id}"),
      Some("admin"),
      Some(person_body("Mariana", "Garcia")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["first_name"], "Mariana");
    assert_eq!(updated["id"], id);
  }

  // ── List composition ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_filters_by_classification() {
    let state = make_state().await;

    let (_, civ) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    let (_, off) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Bruno", "Diaz")),
    )
    .await;
    let off_id = off["id"].as_i64().unwrap();

    let (status, _) = send(
      state.clone(),
      "POST",
      "/offenders",
      Some("admin"),
      Some(json!({ "person_id": off_id, "registered_on": "2024-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, offenders) = send(
      state.clone(),
      "GET",
      "/persons?filter=offenders_only",
      Some("viewer"),
      None,
    )
    .await;
    let ids: Vec<i64> = offenders
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["id"].as_i64().unwrap())
      .collect();
    assert_eq!(ids, vec![off_id]);

    let (_, civilians) = send(
      state,
      "GET",
      "/persons?filter=civilians_only",
      Some("viewer"),
      None,
    )
    .await;
    let ids: Vec<i64> = civilians
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["id"].as_i64().unwrap())
      .collect();
    assert_eq!(ids, vec![civ["id"].as_i64().unwrap()]);
  }

  #[tokio::test]
  async fn list_sorts_missing_release_dates_last() {
    let state = make_state().await;

    // Two offenders: one with an expected release, one without.
    let (_, with_date) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
        "custody": {
          "facility": "3",
          "cell": "B-12",
          "admitted_on": "2024-01-15",
          "expected_release": "2026-06-01",
          "reason": "robo",
        },
      })),
    )
    .await;
    let (_, without_date) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Bruno", "Diaz"),
        "offender": { "registered_on": "2024-01-10" },
      })),
    )
    .await;

    let dated_id = with_date["person"]["id"].as_i64().unwrap();
    let undated_id = without_date["person"]["id"].as_i64().unwrap();

    for direction in ["ascending", "descending"] {
      let (_, listed) = send(
        state.clone(),
        "GET",
        &format!("/persons?sort=expected_release&direction={direction}"),
        Some("viewer"),
        None,
      )
      .await;
      let ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
      assert_eq!(ids, vec![dated_id, undated_id], "direction {direction}");
    }
  }

  // ── Offender intake ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_intake_creates_full_aggregate() {
    let state = make_state().await;

    let (status, profile) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Carlos", "Mendez"),
        "offender": {
          "registered_on": "2024-03-01",
          "alias": "El Rapido",
          "detained_on": "2024-03-05",
        },
        "custody": {
          "facility": "1",
          "cell": "A-01",
          "admitted_on": "2024-03-06",
          "reason": "fraude",
        },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["classification"], "offender");
    let id = profile["person"]["id"].as_i64().unwrap();

    let (status, record) = send(
      state,
      "GET",
      &format!("/persons/{id}/record"),
      Some("viewer"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["offender"]["alias"], "El Rapido");
    assert_eq!(record["custody"]["cell"], "A-01");
    assert_eq!(record["crimes"].as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn profile_intake_rejects_cross_field_violations_atomically() {
    let state = make_state().await;

    // registered after detention and admitted after expected release:
    // both field errors surface and nothing is persisted.
    let (status, body) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Carlos", "Mendez"),
        "offender": {
          "registered_on": "2024-03-10",
          "detained_on": "2024-03-05",
        },
        "custody": {
          "facility": "1",
          "cell": "A-01",
          "admitted_on": "2024-03-06",
          "expected_release": "2024-03-01",
          "reason": "fraude",
        },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
      .as_array()
      .unwrap()
      .iter()
      .map(|f| f["field"].as_str().unwrap())
      .collect();
    assert!(fields.contains(&"detained_on"), "fields: {fields:?}");
    assert!(fields.contains(&"expected_release"), "fields: {fields:?}");

    let (_, listed) =
      send(state, "GET", "/persons", Some("viewer"), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn registering_offender_twice_returns_400() {
    let state = make_state().await;

    let (_, created) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let body = json!({ "person_id": id, "registered_on": "2024-02-01" });

    let (status, _) = send(
      state.clone(),
      "POST",
      "/offenders",
      Some("admin"),
      Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
      send(state, "POST", "/offenders", Some("admin"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Custody ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn custody_requires_offender_record() {
    let state = make_state().await;

    let (_, created) = send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(
      state,
      "PUT",
      &format!("/offenders/{id}/custody"),
      Some("admin"),
      Some(json!({
        "facility": "2",
        "cell": "C-03",
        "admitted_on": "2024-05-01",
        "reason": "robo",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn custody_without_facility_is_accepted() {
    let state = make_state().await;

    let (status, profile) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
        "custody": {
          "cell": "D-04",
          "admitted_on": "2024-05-01",
          "reason": "robo",
        },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(profile["custody"]["facility"].is_null());

    // The roster leaves both the key and the resolved name blank.
    let (status, roster) =
      send(state, "GET", "/offenders", Some("viewer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(roster[0]["facility"].is_null());
    assert!(roster[0]["facility_name"].is_null());
  }

  #[tokio::test]
  async fn roster_resolves_facility_names() {
    let state = make_state().await;

    send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
        "custody": {
          "facility": "3",
          "cell": "B-12",
          "admitted_on": "2024-01-15",
          "reason": "robo",
        },
      })),
    )
    .await;

    let (status, roster) =
      send(state, "GET", "/offenders", Some("viewer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster[0]["facility"], 3);
    assert!(
      roster[0]["facility_name"]
        .as_str()
        .unwrap()
        .contains("Islas Marías"),
      "facility_name: {}",
      roster[0]["facility_name"]
    );
  }

  #[tokio::test]
  async fn custody_rejects_unknown_facility() {
    let state = make_state().await;

    let (_, profile) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
      })),
    )
    .await;
    let id = profile["person"]["id"].as_i64().unwrap();

    let (status, body) = send(
      state,
      "PUT",
      &format!("/offenders/{id}/custody"),
      Some("admin"),
      Some(json!({
        "facility": "11",
        "cell": "C-03",
        "admitted_on": "2024-05-01",
        "reason": "robo",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "facility");
  }

  // ── Crimes ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn link_crime_and_list_for_offender() {
    let state = make_state().await;

    let (_, profile) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
      })),
    )
    .await;
    let person_id = profile["person"]["id"].as_i64().unwrap();

    let (status, crime) = send(
      state.clone(),
      "POST",
      "/crimes",
      Some("admin"),
      Some(json!({
        "description": "robo a casa habitacion",
        "occurred_on": "2023-11-20",
        "location": "Guadalajara",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let crime_id = crime["id"].as_i64().unwrap();

    let (status, _) = send(
      state.clone(),
      "POST",
      &format!("/offenders/{person_id}/crimes"),
      Some("admin"),
      Some(json!({ "crime_id": crime_id, "role": "autor material" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, linked) = send(
      state,
      "GET",
      &format!("/offenders/{person_id}/crimes"),
      Some("viewer"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(linked.as_array().unwrap().len(), 1);
    assert_eq!(linked[0]["description"], "robo a casa habitacion");
  }

  #[tokio::test]
  async fn linking_missing_crime_returns_400() {
    let state = make_state().await;

    let (_, profile) = send(
      state.clone(),
      "POST",
      "/offenders/profile",
      Some("admin"),
      Some(json!({
        "person": person_body("Ana", "Garcia"),
        "offender": { "registered_on": "2024-01-10" },
      })),
    )
    .await;
    let person_id = profile["person"]["id"].as_i64().unwrap();

    let (status, _) = send(
      state,
      "POST",
      &format!("/offenders/{person_id}/crimes"),
      Some("admin"),
      Some(json!({ "crime_id": 777 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Search ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_matches_name_substring_case_insensitively() {
    let state = make_state().await;

    for (first, paternal) in
      [("Ana", "Garcia"), ("Bruno", "Diaz"), ("Carla", "Garza")]
    {
      send(
        state.clone(),
        "POST",
        "/persons",
        Some("admin"),
        Some(person_body(first, paternal)),
      )
      .await;
    }

    let (status, found) = send(
      state,
      "GET",
      "/search?paternal_surname=gar",
      Some("viewer"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let surnames: Vec<&str> = found
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["paternal_surname"].as_str().unwrap())
      .collect();
    // Ordered by paternal surname ascending.
    assert_eq!(surnames, vec!["Garcia", "Garza"]);
  }

  #[tokio::test]
  async fn search_with_blank_params_returns_everyone() {
    let state = make_state().await;

    send(
      state.clone(),
      "POST",
      "/persons",
      Some("admin"),
      Some(person_body("Ana", "Garcia")),
    )
    .await;

    let (status, found) = send(
      state,
      "GET",
      "/search?first_name=&paternal_surname=",
      Some("viewer"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
  }

  // ── Facilities ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn facility_catalog_lists_all_ten() {
    let state = make_state().await;
    let (status, catalog) =
      send(state, "GET", "/facilities", Some("viewer"), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0]["id"], 1);
    assert!(entries[0]["name"].as_str().unwrap().len() > 1);
  }
}
