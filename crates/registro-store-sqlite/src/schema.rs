//! SQL schema for the Registro SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name        TEXT NOT NULL,
    paternal_surname  TEXT NOT NULL,
    maternal_surname  TEXT NOT NULL,
    birth_date        TEXT NOT NULL,   -- ISO 8601 calendar date
    end_date          TEXT             -- record-closure date or NULL
);

-- Presence of a row here is what classifies a person as an offender.
-- The 1:1 relation is enforced by the PRIMARY KEY on person_id.
CREATE TABLE IF NOT EXISTS offenders (
    person_id        INTEGER PRIMARY KEY REFERENCES persons(id),
    registered_on    TEXT NOT NULL,
    alias            TEXT,
    background       TEXT,
    detained_on      TEXT,
    detention_place  TEXT
);

-- Custody is an extension of the offender record, same key.
CREATE TABLE IF NOT EXISTS custody_statuses (
    person_id         INTEGER PRIMARY KEY REFERENCES offenders(person_id),
    facility_id       INTEGER CHECK (facility_id BETWEEN 1 AND 10),
    cell              TEXT NOT NULL,
    admitted_on       TEXT NOT NULL,
    expected_release  TEXT,
    released_on       TEXT,
    reason            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS crimes (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    description  TEXT NOT NULL,
    occurred_on  TEXT NOT NULL,
    location     TEXT
);

-- Many-to-many: a crime may be linked to several offenders.
CREATE TABLE IF NOT EXISTS offender_crimes (
    person_id        INTEGER NOT NULL REFERENCES offenders(person_id),
    crime_id         INTEGER NOT NULL REFERENCES crimes(id),
    participated_on  TEXT,
    role             TEXT,
    UNIQUE (person_id, crime_id)
);

CREATE INDEX IF NOT EXISTS persons_paternal_idx ON persons(paternal_surname);
CREATE INDEX IF NOT EXISTS offender_crimes_person_idx
    ON offender_crimes(person_id);
CREATE INDEX IF NOT EXISTS offender_crimes_crime_idx
    ON offender_crimes(crime_id);

PRAGMA user_version = 1;
";
