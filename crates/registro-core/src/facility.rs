//! The fixed catalog of incarceration facilities.
//!
//! An external reference table, not live store data: exactly ten entries
//! with integer keys 1..=10. A [`CustodyStatus`](crate::offender::CustodyStatus)
//! row always points into this catalog.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// All catalog entries, in key order.
pub const FACILITY_CATALOG: [(u8, &str); 10] = [
  (1, "El Altiplano (CEFERESO n.º 1, Almoloya de Juárez, Estado de México)"),
  (2, "Puente Grande (CEFERESO n.º 2 Occidente, Jalisco)"),
  (3, "Islas Marías (antigua colonia penal federal, Nayarit)"),
  (4, "Reclusorio Norte (Ciudad de México)"),
  (5, "Reclusorio Oriente (Ciudad de México)"),
  (6, "Reclusorio Sur (Ciudad de México)"),
  (7, "El Hongo (Baja California)"),
  (8, "Cereso de Cancún (CRS Benito Juárez, Quintana Roo)"),
  (9, "Cárcel Distrital de Tizayuca (Hidalgo)"),
  (10, "Cereso de Acapulco (CRRS de Acapulco de Juárez, Guerrero)"),
];

/// A validated catalog key. Construction outside 1..=10 is impossible,
/// so a stored facility reference can always be resolved to a name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct FacilityId(u8);

impl FacilityId {
  pub fn new(key: u8) -> Result<Self> {
    if (1..=10).contains(&key) {
      Ok(Self(key))
    } else {
      Err(Error::UnknownFacility(key))
    }
  }

  pub fn key(self) -> u8 { self.0 }

  /// The catalog name for this facility.
  pub fn name(self) -> &'static str {
    // Index is safe: the constructor guarantees 1..=10.
    FACILITY_CATALOG[(self.0 - 1) as usize].1
  }
}

impl TryFrom<u8> for FacilityId {
  type Error = Error;

  fn try_from(key: u8) -> Result<Self> { Self::new(key) }
}

impl From<FacilityId> for u8 {
  fn from(id: FacilityId) -> u8 { id.0 }
}

impl std::fmt::Display for FacilityId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}
