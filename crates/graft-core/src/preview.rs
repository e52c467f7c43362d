//! Non-mutating merge previews.
//!
//! A preview tells a user what a merge *would* touch: how many dependent
//! rows the absorbed entity owns per category, and how many of them will
//! collapse into existing survivor rows rather than simply move. The row
//! counting happens in the storage backend; the rollup math here is pure so
//! it can be unit-tested without a database.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{Organization, Person},
  error::{Error, Result},
  record::{Affiliation, Identifier},
};

// ─── Organization preview ────────────────────────────────────────────────────

/// Counts of dependent rows owned by the absorbed organization.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct OrgDependentCounts {
  pub affiliations:     u64,
  /// Relationships where the organization is either endpoint.
  pub relationships:    u64,
  pub event_attendance: u64,
  pub identifiers:      u64,
  /// Hierarchy links where the organization is parent or child.
  pub hierarchy_links:  u64,
  pub phones:           u64,
  pub addresses:        u64,
  pub emails:           u64,
  pub social_profiles:  u64,
}

/// An organization with its display domain resolved: the record's own
/// domain field, falling back to its primary (then any) `domain`-type
/// identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationPreview {
  pub organization:   Organization,
  pub display_domain: Option<String>,
}

/// The read-only impact report for a candidate organization merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationMergePreview {
  pub survivor: OrganizationPreview,
  pub absorbed: OrganizationPreview,
  pub counts:   OrgDependentCounts,
  /// Relationships where survivor and absorbed each hold an edge of the
  /// same type and direction to the same third entity — these collapse
  /// during the merge instead of moving.
  pub duplicate_relationships: u64,
}

/// Resolve the domain shown for an organization in merge previews.
pub fn display_domain(
  org: &Organization,
  identifiers: &[Identifier],
) -> Option<String> {
  if let Some(domain) = &org.domain
    && !domain.trim().is_empty()
  {
    return Some(domain.clone());
  }

  let domain_ids: Vec<&Identifier> = identifiers
    .iter()
    .filter(|i| i.id_type == "domain")
    .collect();

  domain_ids
    .iter()
    .find(|i| i.is_primary)
    .or_else(|| domain_ids.first())
    .map(|i| i.value.clone())
}

// ─── Person batch preview ────────────────────────────────────────────────────

/// Counts of dependent rows owned by one person in a batch.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PersonDependentCounts {
  pub identifiers:      u64,
  pub affiliations:     u64,
  pub conversations:    u64,
  pub relationships:    u64,
  pub event_attendance: u64,
  pub phones:           u64,
  pub addresses:        u64,
  pub emails:           u64,
  pub social_profiles:  u64,
}

impl PersonDependentCounts {
  pub fn add(&mut self, other: &PersonDependentCounts) {
    self.identifiers += other.identifiers;
    self.affiliations += other.affiliations;
    self.conversations += other.conversations;
    self.relationships += other.relationships;
    self.event_attendance += other.event_attendance;
    self.phones += other.phones;
    self.addresses += other.addresses;
    self.emails += other.emails;
    self.social_profiles += other.social_profiles;
  }
}

/// One member of a batch preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPreviewMember {
  pub person: Person,
  pub counts: PersonDependentCounts,
}

/// The read-only impact report for a candidate person-batch merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonMergePreview {
  pub members:  Vec<PersonPreviewMember>,
  /// Plain sums across the batch.
  pub combined: PersonDependentCounts,
  /// Identifiers distinct by (type, value) across the whole batch — what
  /// will actually remain after the merge collapses duplicates.
  pub distinct_identifiers:  u64,
  /// Affiliations distinct by (organization, role) across the batch.
  pub distinct_affiliations: u64,
  /// Distinct non-empty `name` values, for conflict resolution by the user.
  pub names:   Vec<String>,
  /// Distinct non-empty `source` values.
  pub sources: Vec<String>,
}

/// Validate a batch of ids for preview or merge: at least two, all distinct.
pub fn validate_batch(ids: &[Uuid]) -> Result<()> {
  if ids.len() < 2 {
    return Err(Error::BatchTooSmall(ids.len()));
  }
  let mut seen = BTreeSet::new();
  for id in ids {
    if !seen.insert(*id) {
      return Err(Error::DuplicateBatchId(*id));
    }
  }
  Ok(())
}

/// Count identifiers distinct by (type, value) across a batch.
pub fn distinct_identifier_count(identifiers: &[Identifier]) -> u64 {
  identifiers
    .iter()
    .map(|i| (i.id_type.as_str(), i.value.as_str()))
    .collect::<BTreeSet<_>>()
    .len() as u64
}

/// Count affiliations distinct by (organization, role) across a batch.
pub fn distinct_affiliation_count(affiliations: &[Affiliation]) -> u64 {
  affiliations
    .iter()
    .map(|a| (a.org_id, a.role.as_str()))
    .collect::<BTreeSet<_>>()
    .len() as u64
}

/// The distinct, non-empty values of one scalar field across a batch, in
/// first-seen order.
pub fn scalar_conflicts<'a>(
  values: impl IntoIterator<Item = Option<&'a str>>,
) -> Vec<String> {
  let mut seen = BTreeSet::new();
  let mut out = Vec::new();
  for value in values.into_iter().flatten() {
    let trimmed = value.trim();
    if !trimmed.is_empty() && seen.insert(trimmed.to_owned()) {
      out.push(trimmed.to_owned());
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::entity::EntityKind;

  fn ident(id_type: &str, value: &str) -> Identifier {
    Identifier {
      identifier_id: Uuid::new_v4(),
      entity_kind:   EntityKind::Person,
      entity_id:     Uuid::new_v4(),
      id_type:       id_type.to_owned(),
      value:         value.to_owned(),
      is_primary:    false,
    }
  }

  #[test]
  fn batch_validation_rejects_short_and_duplicate() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    assert!(matches!(validate_batch(&[a]), Err(Error::BatchTooSmall(1))));
    assert!(matches!(
      validate_batch(&[a, b, a]),
      Err(Error::DuplicateBatchId(id)) if id == a
    ));
    assert!(validate_batch(&[a, b]).is_ok());
  }

  #[test]
  fn distinct_identifiers_collapse_on_type_and_value() {
    let ids = vec![
      ident("email", "jo@acme.com"),
      ident("email", "jo@acme.com"),
      ident("linkedin", "jo@acme.com"),
    ];
    assert_eq!(distinct_identifier_count(&ids), 2);
  }

  #[test]
  fn scalar_conflicts_dedupe_and_skip_blank() {
    let values = vec![
      Some("Jo"),
      Some("  "),
      None,
      Some("Joanna"),
      Some("Jo"),
    ];
    assert_eq!(scalar_conflicts(values), vec!["Jo", "Joanna"]);
  }

  #[test]
  fn display_domain_falls_back_to_identifier() {
    let org = Organization {
      org_id:         Uuid::new_v4(),
      name:           Some("Acme".into()),
      domain:         None,
      website:        None,
      industry:       None,
      description:    None,
      size:           None,
      employee_count: None,
      founded_year:   None,
      revenue_range:  None,
      funding_total:  None,
      funding_stage:  None,
      headquarters:   None,
      status:         Default::default(),
      created_at:     Utc::now(),
    };

    let mut secondary = ident("domain", "fallback.com");
    secondary.entity_kind = EntityKind::Organization;
    let mut primary = ident("domain", "acme.com");
    primary.entity_kind = EntityKind::Organization;
    primary.is_primary = true;

    let resolved =
      display_domain(&org, &[secondary.clone(), primary.clone()]);
    assert_eq!(resolved.as_deref(), Some("acme.com"));

    // Without a primary, any domain identifier serves.
    let resolved = display_domain(&org, &[secondary]);
    assert_eq!(resolved.as_deref(), Some("fallback.com"));

    // The org's own field wins when set.
    let mut with_field = org.clone();
    with_field.domain = Some("own.com".into());
    let resolved = display_domain(&with_field, &[primary]);
    assert_eq!(resolved.as_deref(), Some("own.com"));
  }
}
