//! HTTP Basic-auth verification and session extractors.
//!
//! Authentication is a swappable collaborator: accounts live in server
//! configuration as argon2 PHC hashes, and verification resolves a
//! [`Session`] that is passed explicitly into handlers. No handler reads an
//! ambient "current user"; role changes take effect on the next
//! authenticated request by construction.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use registro_core::{
  session::{Role, Session},
  store::RecordStore,
};

use crate::{AppState, error::ApiError};

// ─── Accounts ────────────────────────────────────────────────────────────────

/// One configured account.
#[derive(Clone)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub display_name:  String,
  pub role:          Role,
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub accounts: Vec<Account>,
}

// ─── Verification ────────────────────────────────────────────────────────────

/// Verify credentials directly from headers and resolve the session.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<Session, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let account = config
    .accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Session {
    id:   account.username.clone(),
    name: account.display_name.clone(),
    role: account.role,
  })
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Present in a handler means the request carries a valid session of any
/// role. Read endpoints require this and nothing more.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<AppState<S>> for CurrentSession
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = verify_auth(&parts.headers, &state.auth)?;
    Ok(CurrentSession(session))
  }
}

/// Present in a handler means the request carries a valid `Admin` session.
/// Every write endpoint requires this.
pub struct AdminOnly(pub Session);

impl<S> FromRequestParts<AppState<S>> for AdminOnly
where
  S: RecordStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = verify_auth(&parts.headers, &state.auth)?;
    if !session.role.can_write() {
      return Err(ApiError::Forbidden);
    }
    Ok(AdminOnly(session))
  }
}
