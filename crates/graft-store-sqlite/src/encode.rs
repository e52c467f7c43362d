//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, timestamps as RFC 3339,
//! dates as ISO 8601, kinds and statuses as string discriminants. The
//! `*_col` helpers decode directly inside a `query_map` closure, mapping
//! parse failures into `rusqlite::Error::FromSqlConversionFailure` so row
//! mapping stays a single level deep.

use chrono::{DateTime, NaiveDate, Utc};
use graft_core::entity::{EntityKind, OrgStatus};
use rusqlite::{Row, types::Type};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalar codecs ───────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn encode_kind(k: EntityKind) -> &'static str {
  match k {
    EntityKind::Person => "person",
    EntityKind::Organization => "organization",
  }
}

pub fn decode_kind(s: &str) -> Result<EntityKind> {
  match s {
    "person" => Ok(EntityKind::Person),
    "organization" => Ok(EntityKind::Organization),
    other => Err(Error::Decode(format!("unknown entity kind: {other:?}"))),
  }
}

pub fn encode_status(s: OrgStatus) -> &'static str {
  match s {
    OrgStatus::Active => "active",
    OrgStatus::Inactive => "inactive",
  }
}

// ─── Row-column decoders ─────────────────────────────────────────────────────

fn conversion(idx: usize, err: impl std::error::Error + Send + Sync + 'static)
-> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
  let s: String = row.get(idx)?;
  Uuid::parse_str(&s).map_err(|e| conversion(idx, e))
}

pub fn uuid_col_opt(
  row: &Row<'_>,
  idx: usize,
) -> rusqlite::Result<Option<Uuid>> {
  let s: Option<String> = row.get(idx)?;
  s.map(|s| Uuid::parse_str(&s).map_err(|e| conversion(idx, e)))
    .transpose()
}

pub fn dt_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
  let s: String = row.get(idx)?;
  DateTime::parse_from_rfc3339(&s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| conversion(idx, e))
}

pub fn date_col_opt(
  row: &Row<'_>,
  idx: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
  let s: Option<String> = row.get(idx)?;
  s.map(|s| s.parse::<NaiveDate>().map_err(|e| conversion(idx, e)))
    .transpose()
}

pub fn kind_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityKind> {
  let s: String = row.get(idx)?;
  match s.as_str() {
    "person" => Ok(EntityKind::Person),
    "organization" => Ok(EntityKind::Organization),
    other => Err(conversion(
      idx,
      Error::Decode(format!("unknown entity kind: {other:?}")),
    )),
  }
}

pub fn status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<OrgStatus> {
  let s: String = row.get(idx)?;
  match s.as_str() {
    "active" => Ok(OrgStatus::Active),
    "inactive" => Ok(OrgStatus::Inactive),
    other => Err(conversion(
      idx,
      Error::Decode(format!("unknown org status: {other:?}")),
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_round_trips() {
    for kind in [EntityKind::Person, EntityKind::Organization] {
      assert_eq!(decode_kind(encode_kind(kind)).unwrap(), kind);
    }
  }

  #[test]
  fn unknown_kind_is_a_decode_error() {
    let err = decode_kind("corporation").unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "unexpected: {err}");
    assert!(err.to_string().contains("corporation"));
  }

  #[test]
  fn bad_timestamp_is_a_date_parse_error() {
    let err = decode_dt("yesterday").unwrap_err();
    assert!(matches!(err, Error::DateParse(_)), "unexpected: {err}");
  }
}
