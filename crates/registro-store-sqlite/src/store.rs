//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::OptionalExtension as _;

use registro_core::{
  compose::{PersonAggregate, build_aggregate},
  offender::{
    Crime, CrimeLink, CustodyStatus, NewCrime, NewCustodyStatus,
    NewOffenderRecord, OffenderListRow, OffenderRecord,
  },
  person::{NewPerson, Person},
  store::{PersonQuery, RecordStore},
};

use crate::{
  Error, Result,
  encode::{
    RawCrime, RawCustody, RawOffender, RawOffenderRow, RawPerson, decode_date,
    encode_date,
  },
  schema::SCHEMA,
};

const PERSON_COLUMNS: &str =
  "id, first_name, paternal_surname, maternal_surname, birth_date, end_date";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn person_exists(&self, id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM persons WHERE id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn offender_exists(&self, person_id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM offenders WHERE person_id = ?1",
              rusqlite::params![person_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn crime_exists(&self, id: i64) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM crimes WHERE id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn read_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    id:               row.get(0)?,
    first_name:       row.get(1)?,
    paternal_surname: row.get(2)?,
    maternal_surname: row.get(3)?,
    birth_date:       row.get(4)?,
    end_date:         row.get(5)?,
  })
}

fn read_offender(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawOffender> {
  Ok(RawOffender {
    person_id:       row.get(0)?,
    registered_on:   row.get(1)?,
    alias:           row.get(2)?,
    background:      row.get(3)?,
    detained_on:     row.get(4)?,
    detention_place: row.get(5)?,
  })
}

fn read_custody(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCustody> {
  Ok(RawCustody {
    person_id:        row.get(0)?,
    facility_id:      row.get(1)?,
    cell:             row.get(2)?,
    admitted_on:      row.get(3)?,
    expected_release: row.get(4)?,
    released_on:      row.get(5)?,
    reason:           row.get(6)?,
  })
}

fn read_crime(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCrime> {
  Ok(RawCrime {
    id:          row.get(0)?,
    description: row.get(1)?,
    occurred_on: row.get(2)?,
    location:    row.get(3)?,
  })
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    let first      = input.first_name.clone();
    let paternal   = input.paternal_surname.clone();
    let maternal   = input.maternal_surname.clone();
    let birth_str  = encode_date(input.birth_date);
    let end_str    = input.end_date.map(encode_date);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons
             (first_name, paternal_surname, maternal_surname, birth_date, end_date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![first, paternal, maternal, birth_str, end_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Person {
      id,
      first_name:       input.first_name,
      paternal_surname: input.paternal_surname,
      maternal_surname: input.maternal_surname,
      birth_date:       input.birth_date,
      end_date:         input.end_date,
    })
  }

  async fn get_person(&self, id: i64) -> Result<Option<Person>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
              rusqlite::params![id],
              read_person,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn update_person(&self, id: i64, input: NewPerson) -> Result<Person> {
    let first     = input.first_name.clone();
    let paternal  = input.paternal_surname.clone();
    let maternal  = input.maternal_surname.clone();
    let birth_str = encode_date(input.birth_date);
    let end_str   = input.end_date.map(encode_date);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons
           SET first_name = ?2, paternal_surname = ?3, maternal_surname = ?4,
               birth_date = ?5, end_date = ?6
           WHERE id = ?1",
          rusqlite::params![id, first, paternal, maternal, birth_str, end_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::PersonNotFound(id));
    }

    Ok(Person {
      id,
      first_name:       input.first_name,
      paternal_surname: input.paternal_surname,
      maternal_surname: input.maternal_surname,
      birth_date:       input.birth_date,
      end_date:         input.end_date,
    })
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons ORDER BY id ASC"
        ))?;
        let rows = stmt
          .query_map([], read_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn search_persons(&self, query: &PersonQuery) -> Result<Vec<Person>> {
    let id_val       = query.id;
    let first_pat    = query
      .first_name
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    let paternal_pat = query
      .paternal_surname
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    let maternal_pat = query
      .maternal_surname
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    let birth_str    = query.birth_date.map(encode_date);
    let end_str      = query.end_date.map(encode_date);
    let limit_val    = query.limit.unwrap_or(500) as i64;

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        // Build the WHERE clause dynamically; parameter positions are fixed
        // so absent criteria simply contribute no condition.
        let mut conds: Vec<&'static str> = vec![];
        if id_val.is_some() {
          conds.push("id = ?1");
        }
        if first_pat.is_some() {
          conds.push("LOWER(first_name) LIKE ?2");
        }
        if paternal_pat.is_some() {
          conds.push("LOWER(paternal_surname) LIKE ?3");
        }
        if maternal_pat.is_some() {
          conds.push("LOWER(maternal_surname) LIKE ?4");
        }
        if birth_str.is_some() {
          conds.push("birth_date = ?5");
        }
        if end_str.is_some() {
          conds.push("end_date = ?6");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {PERSON_COLUMNS} FROM persons
           {where_clause}
           ORDER BY paternal_surname COLLATE NOCASE ASC
           LIMIT ?7"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              id_val,
              first_pat.as_deref(),
              paternal_pat.as_deref(),
              maternal_pat.as_deref(),
              birth_str.as_deref(),
              end_str.as_deref(),
              limit_val,
            ],
            read_person,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Offender records ──────────────────────────────────────────────────────

  async fn create_offender(
    &self,
    person_id: i64,
    input: NewOffenderRecord,
  ) -> Result<OffenderRecord> {
    if !self.person_exists(person_id).await? {
      return Err(Error::PersonNotFound(person_id));
    }
    if self.offender_exists(person_id).await? {
      return Err(Error::AlreadyOffender(person_id));
    }

    let registered_str = encode_date(input.registered_on);
    let detained_str   = input.detained_on.map(encode_date);
    let alias          = input.alias.clone();
    let background     = input.background.clone();
    let place          = input.detention_place.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO offenders
             (person_id, registered_on, alias, background, detained_on, detention_place)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            person_id,
            registered_str,
            alias,
            background,
            detained_str,
            place,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(input.into_record(person_id))
  }

  async fn get_offender(&self, person_id: i64) -> Result<Option<OffenderRecord>> {
    let raw: Option<RawOffender> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id, registered_on, alias, background,
                      detained_on, detention_place
               FROM offenders WHERE person_id = ?1",
              rusqlite::params![person_id],
              read_offender,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOffender::into_record).transpose()
  }

  async fn update_offender(
    &self,
    person_id: i64,
    input: NewOffenderRecord,
  ) -> Result<OffenderRecord> {
    let registered_str = encode_date(input.registered_on);
    let detained_str   = input.detained_on.map(encode_date);
    let alias          = input.alias.clone();
    let background     = input.background.clone();
    let place          = input.detention_place.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE offenders
           SET registered_on = ?2, alias = ?3, background = ?4,
               detained_on = ?5, detention_place = ?6
           WHERE person_id = ?1",
          rusqlite::params![
            person_id,
            registered_str,
            alias,
            background,
            detained_str,
            place,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::NoOffenderRecord(person_id));
    }

    Ok(input.into_record(person_id))
  }

  async fn list_offenders(&self) -> Result<Vec<OffenderListRow>> {
    let raws: Vec<RawOffenderRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             o.person_id, p.first_name, p.paternal_surname, p.maternal_surname,
             o.alias, o.detained_on,
             c.facility_id, c.cell, c.admitted_on
           FROM offenders o
           JOIN persons p          ON p.id        = o.person_id
           LEFT JOIN custody_statuses c ON c.person_id = o.person_id
           ORDER BY o.person_id ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawOffenderRow {
              person_id:        row.get(0)?,
              first_name:       row.get(1)?,
              paternal_surname: row.get(2)?,
              maternal_surname: row.get(3)?,
              alias:            row.get(4)?,
              detained_on:      row.get(5)?,
              facility_id:      row.get(6)?,
              cell:             row.get(7)?,
              admitted_on:      row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOffenderRow::into_row).collect()
  }

  async fn offender_ids(&self) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT person_id FROM offenders")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().collect())
  }

  // ── Custody ───────────────────────────────────────────────────────────────

  async fn set_custody(
    &self,
    person_id: i64,
    input: NewCustodyStatus,
  ) -> Result<CustodyStatus> {
    if !self.offender_exists(person_id).await? {
      return Err(Error::NoOffenderRecord(person_id));
    }

    let facility_key = input.facility.map(|f| i64::from(f.key()));
    let cell         = input.cell.clone();
    let admitted_str = encode_date(input.admitted_on);
    let expected_str = input.expected_release.map(encode_date);
    let released_str = input.released_on.map(encode_date);
    let reason       = input.reason.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO custody_statuses
             (person_id, facility_id, cell, admitted_on,
              expected_release, released_on, reason)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            person_id,
            facility_key,
            cell,
            admitted_str,
            expected_str,
            released_str,
            reason,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(input.into_status(person_id))
  }

  async fn get_custody(&self, person_id: i64) -> Result<Option<CustodyStatus>> {
    let raw: Option<RawCustody> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id, facility_id, cell, admitted_on,
                      expected_release, released_on, reason
               FROM custody_statuses WHERE person_id = ?1",
              rusqlite::params![person_id],
              read_custody,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCustody::into_status).transpose()
  }

  async fn expected_release_dates(
    &self,
  ) -> Result<HashMap<i64, chrono::NaiveDate>> {
    let rows: Vec<(i64, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT person_id, expected_release
           FROM custody_statuses
           WHERE expected_release IS NOT NULL",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, s)| Ok((id, decode_date(&s)?)))
      .collect()
  }

  // ── Crimes ────────────────────────────────────────────────────────────────

  async fn create_crime(&self, input: NewCrime) -> Result<Crime> {
    let description  = input.description.clone();
    let occurred_str = encode_date(input.occurred_on);
    let location     = input.location.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO crimes (description, occurred_on, location)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![description, occurred_str, location],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Crime {
      id,
      description: input.description,
      occurred_on: input.occurred_on,
      location:    input.location,
    })
  }

  async fn get_crime(&self, id: i64) -> Result<Option<Crime>> {
    let raw: Option<RawCrime> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, description, occurred_on, location
               FROM crimes WHERE id = ?1",
              rusqlite::params![id],
              read_crime,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCrime::into_crime).transpose()
  }

  async fn list_crimes(&self) -> Result<Vec<Crime>> {
    let raws: Vec<RawCrime> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, description, occurred_on, location
           FROM crimes ORDER BY id ASC",
        )?;
        let rows = stmt
          .query_map([], read_crime)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCrime::into_crime).collect()
  }

  async fn crimes_for(&self, person_id: i64) -> Result<Vec<Crime>> {
    let raws: Vec<RawCrime> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.id, c.description, c.occurred_on, c.location
           FROM crimes c
           JOIN offender_crimes oc ON oc.crime_id = c.id
           WHERE oc.person_id = ?1
           ORDER BY c.id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![person_id], read_crime)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCrime::into_crime).collect()
  }

  async fn link_crime(&self, link: CrimeLink) -> Result<CrimeLink> {
    if !self.offender_exists(link.person_id).await? {
      return Err(Error::NoOffenderRecord(link.person_id));
    }
    if !self.crime_exists(link.crime_id).await? {
      return Err(Error::CrimeNotFound(link.crime_id));
    }

    let person_id = link.person_id;
    let crime_id  = link.crime_id;

    let already: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM offender_crimes
               WHERE person_id = ?1 AND crime_id = ?2",
              rusqlite::params![person_id, crime_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    if already {
      return Err(Error::AlreadyLinked { person_id, crime_id });
    }

    let participated_str = link.participated_on.map(encode_date);
    let role             = link.role.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO offender_crimes
             (person_id, crime_id, participated_on, role)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![person_id, crime_id, participated_str, role],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  // ── Composition ───────────────────────────────────────────────────────────

  async fn get_person_record(&self, id: i64) -> Result<Option<PersonAggregate>> {
    let person = match self.get_person(id).await? {
      Some(p) => p,
      None => return Ok(None),
    };

    let offender = self.get_offender(id).await?;

    // Custody and crimes are owned extensions of the offender record; a
    // civilian can have neither.
    let (custody, crimes) = if offender.is_some() {
      (self.get_custody(id).await?, self.crimes_for(id).await?)
    } else {
      (None, Vec::new())
    };

    Ok(Some(build_aggregate(person, offender, custody, crimes)))
  }

  async fn register_offender_profile(
    &self,
    person: NewPerson,
    offender: NewOffenderRecord,
    custody: Option<NewCustodyStatus>,
  ) -> Result<PersonAggregate> {
    let first          = person.first_name.clone();
    let paternal       = person.paternal_surname.clone();
    let maternal       = person.maternal_surname.clone();
    let birth_str      = encode_date(person.birth_date);
    let end_str        = person.end_date.map(encode_date);
    let registered_str = encode_date(offender.registered_on);
    let detained_str   = offender.detained_on.map(encode_date);
    let alias          = offender.alias.clone();
    let background     = offender.background.clone();
    let place          = offender.detention_place.clone();
    let custody_row    = custody.clone().map(|c| {
      (
        c.facility.map(|f| i64::from(f.key())),
        c.cell,
        encode_date(c.admitted_on),
        c.expected_release.map(encode_date),
        c.released_on.map(encode_date),
        c.reason,
      )
    });

    // The whole intake runs inside one transaction: a failure on any insert
    // rolls back all of it, so no orphaned person or offender row survives.
    let person_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO persons
             (first_name, paternal_surname, maternal_surname, birth_date, end_date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![first, paternal, maternal, birth_str, end_str],
        )?;
        let person_id = tx.last_insert_rowid();

        tx.execute(
          "INSERT INTO offenders
             (person_id, registered_on, alias, background, detained_on, detention_place)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            person_id,
            registered_str,
            alias,
            background,
            detained_str,
            place,
          ],
        )?;

        if let Some((facility, cell, admitted, expected, released, reason)) =
          custody_row
        {
          tx.execute(
            "INSERT INTO custody_statuses
               (person_id, facility_id, cell, admitted_on,
                expected_release, released_on, reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              person_id, facility, cell, admitted, expected, released, reason,
            ],
          )?;
        }

        tx.commit()?;
        Ok(person_id)
      })
      .await?;

    let person = Person {
      id:               person_id,
      first_name:       person.first_name,
      paternal_surname: person.paternal_surname,
      maternal_surname: person.maternal_surname,
      birth_date:       person.birth_date,
      end_date:         person.end_date,
    };

    Ok(build_aggregate(
      person,
      Some(offender.into_record(person_id)),
      custody.map(|c| c.into_status(person_id)),
      Vec::new(),
    ))
  }
}
