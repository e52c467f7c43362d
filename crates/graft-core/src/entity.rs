//! The two concrete entity kinds — people and organizations.
//!
//! Entities are the graph's nodes. Everything else (identifiers,
//! affiliations, relationships, contact fields, grants) hangs off an entity
//! by (kind, id) and is reassigned wholesale when two entities are merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which concrete table an entity id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Person,
  Organization,
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person record. Deliberately thin — contact methods, identifiers and
/// affiliations live in their own collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:  Uuid,
  pub name:       Option<String>,
  /// Which ingestion source produced this record, if known.
  pub source:     Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input for creating a person. The id and timestamp are assigned by the
/// store.
#[derive(Debug, Clone, Default)]
pub struct NewPerson {
  pub name:   Option<String>,
  pub source: Option<String>,
}

impl NewPerson {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), source: None }
  }
}

// ─── Organization ────────────────────────────────────────────────────────────

/// Lifecycle status of an organization. Inactive organizations are excluded
/// from duplicate detection and may not take part in a merge.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
  #[default]
  Active,
  Inactive,
}

/// An organization record. Every descriptive field is independently nullable
/// because records arrive from many ingestion sources, each partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
  pub org_id:         Uuid,
  pub name:           Option<String>,
  pub domain:         Option<String>,
  pub website:        Option<String>,
  pub industry:       Option<String>,
  pub description:    Option<String>,
  pub size:           Option<String>,
  pub employee_count: Option<i64>,
  pub founded_year:   Option<i32>,
  pub revenue_range:  Option<String>,
  pub funding_total:  Option<i64>,
  pub funding_stage:  Option<String>,
  pub headquarters:   Option<String>,
  pub status:         OrgStatus,
  pub created_at:     DateTime<Utc>,
}

impl Organization {
  pub fn is_active(&self) -> bool { self.status == OrgStatus::Active }
}

/// Input for creating an organization.
#[derive(Debug, Clone, Default)]
pub struct NewOrganization {
  pub name:           Option<String>,
  pub domain:         Option<String>,
  pub website:        Option<String>,
  pub industry:       Option<String>,
  pub description:    Option<String>,
  pub size:           Option<String>,
  pub employee_count: Option<i64>,
  pub founded_year:   Option<i32>,
  pub revenue_range:  Option<String>,
  pub funding_total:  Option<i64>,
  pub funding_stage:  Option<String>,
  pub headquarters:   Option<String>,
  pub status:         OrgStatus,
}

impl NewOrganization {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
    self.domain = Some(domain.into());
    self
  }
}

/// A compact organization projection used in duplicate groups and previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
  pub org_id: Uuid,
  pub name:   Option<String>,
  pub domain: Option<String>,
}

impl From<&Organization> for OrganizationSummary {
  fn from(org: &Organization) -> Self {
    Self {
      org_id: org.org_id,
      name:   org.name.clone(),
      domain: org.domain.clone(),
    }
  }
}
