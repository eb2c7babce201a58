//! Session and role model.
//!
//! A [`Session`] is resolved by the transport layer and passed explicitly
//! into whatever needs it — there is no ambient "current user" accessor, so
//! role-dependent behavior is testable without simulating any storage.

use serde::{Deserialize, Serialize};

/// Static role levels. Admins write; viewers only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Admin,
  Viewer,
}

impl Role {
  /// Whether this role is allowed to create or mutate records.
  pub fn can_write(self) -> bool { matches!(self, Self::Admin) }
}

/// The resolved identity of the current actor. Role changes take effect
/// only on re-authentication; nothing pushes a live role update into an
/// existing session value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub id:   String,
  pub name: String,
  pub role: Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_admins_can_write() {
    assert!(Role::Admin.can_write());
    assert!(!Role::Viewer.can_write());
  }
}
