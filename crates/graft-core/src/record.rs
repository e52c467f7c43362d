//! Dependent record types — everything a graph entity owns or takes part in.
//!
//! Each record carries the (kind, id) of its owning entity, or explicit
//! person/organization ids where the shape is asymmetric. The natural keys
//! noted per type are what the merge executor's conflict-avoid-then-move
//! pass checks before re-pointing a row at the survivor.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityKind;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// An external identifier claim for an entity, e.g. a registered domain or a
/// verified email address.
///
/// Natural key: (entity kind, id_type, value) — global, not per-owner. Two
/// organizations can never hold the same domain identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
  pub identifier_id: Uuid,
  pub entity_kind:   EntityKind,
  pub entity_id:     Uuid,
  /// Discriminant such as `domain`, `email`, `linkedin`.
  pub id_type:       String,
  pub value:         String,
  pub is_primary:    bool,
}

#[derive(Debug, Clone)]
pub struct NewIdentifier {
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub id_type:     String,
  pub value:       String,
  pub is_primary:  bool,
}

impl NewIdentifier {
  pub fn new(
    entity_kind: EntityKind,
    entity_id: Uuid,
    id_type: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self {
      entity_kind,
      entity_id,
      id_type: id_type.into(),
      value: value.into(),
      is_primary: false,
    }
  }

  pub fn primary(mut self) -> Self {
    self.is_primary = true;
    self
  }
}

// ─── Affiliations ────────────────────────────────────────────────────────────

/// Employment or membership of a person in an organization.
///
/// Natural key: (person_id, org_id, role, effective_start).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliation {
  pub affiliation_id:  Uuid,
  pub person_id:       Uuid,
  pub org_id:          Uuid,
  pub role:            String,
  pub title:           Option<String>,
  pub is_primary:      bool,
  pub is_current:      bool,
  pub effective_start: Option<NaiveDate>,
  pub effective_end:   Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewAffiliation {
  pub person_id:       Uuid,
  pub org_id:          Uuid,
  pub role:            String,
  pub title:           Option<String>,
  pub is_primary:      bool,
  pub is_current:      bool,
  pub effective_start: Option<NaiveDate>,
  pub effective_end:   Option<NaiveDate>,
}

impl NewAffiliation {
  pub fn new(person_id: Uuid, org_id: Uuid, role: impl Into<String>) -> Self {
    Self {
      person_id,
      org_id,
      role: role.into(),
      title: None,
      is_primary: false,
      is_current: true,
      effective_start: None,
      effective_end: None,
    }
  }
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// A typed directed edge between any two entities.
///
/// Natural key: (from_id, to_id, rel_type). Symmetric relationships are
/// stored as two rows referencing each other through `pair_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
  pub relationship_id: Uuid,
  pub from_kind:       EntityKind,
  pub from_id:         Uuid,
  pub to_kind:         EntityKind,
  pub to_id:           Uuid,
  pub rel_type:        String,
  /// The twin row of a symmetric relationship, if any.
  pub pair_id:         Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewRelationship {
  pub from_kind: EntityKind,
  pub from_id:   Uuid,
  pub to_kind:   EntityKind,
  pub to_id:     Uuid,
  pub rel_type:  String,
  /// Also create the reverse edge and link the two rows via `pair_id`.
  pub symmetric: bool,
}

impl NewRelationship {
  pub fn new(
    from_kind: EntityKind,
    from_id: Uuid,
    to_kind: EntityKind,
    to_id: Uuid,
    rel_type: impl Into<String>,
  ) -> Self {
    Self {
      from_kind,
      from_id,
      to_kind,
      to_id,
      rel_type: rel_type.into(),
      symmetric: false,
    }
  }

  pub fn symmetric(mut self) -> Self {
    self.symmetric = true;
    self
  }
}

// ─── Hierarchy links ─────────────────────────────────────────────────────────

/// Parent/child structure between organizations (subsidiary, division, …).
///
/// Natural key: (parent_id, child_id, link_type); a link may never be
/// self-referential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyLink {
  pub link_id:   Uuid,
  pub parent_id: Uuid,
  pub child_id:  Uuid,
  pub link_type: String,
}

// ─── Participation ───────────────────────────────────────────────────────────

/// An entity's participation in an event.
///
/// Natural key: (event_id, entity kind, entity_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendance {
  pub attendance_id: Uuid,
  pub event_id:      Uuid,
  pub entity_kind:   EntityKind,
  pub entity_id:     Uuid,
  pub role:          Option<String>,
}

/// A person's membership in a conversation thread.
///
/// Natural key: (conversation_id, person_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationParticipant {
  pub participant_id:  Uuid,
  pub conversation_id: Uuid,
  pub person_id:       Uuid,
}

// ─── Multi-value contact fields ──────────────────────────────────────────────

/// A telephone number. No uniqueness is enforced at write time; the merge
/// executor collapses value-identical numbers under the survivor, keeping
/// the earliest-created row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneNumber {
  pub phone_id:    Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub number:      String,
  pub label:       Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// A postal address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalAddress {
  pub address_id:  Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub street:      Option<String>,
  pub city:        Option<String>,
  pub region:      Option<String>,
  pub postal_code: Option<String>,
  pub country:     Option<String>,
}

/// An email address attached to an entity (distinct from an `email`
/// identifier, which is an identity claim).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
  pub email_id:    Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub address:     String,
  pub label:       Option<String>,
}

/// A social-media profile.
///
/// Natural key: (entity kind, entity_id, platform, url).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialProfile {
  pub profile_id:  Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub platform:    String,
  pub url:         String,
}

// ─── Visibility grants ───────────────────────────────────────────────────────

/// Per-user access to an entity. A user holds at most one grant per entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityGrant {
  pub grant_id:    Uuid,
  pub user_id:     Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub level:       String,
  pub is_owner:    bool,
}

// ─── Non-authoritative dependents ────────────────────────────────────────────

/// A cached computed score. Discarded on merge; a downstream scorer
/// recomputes against the survivor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedScore {
  pub score_id:    Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub score_type:  String,
  pub value:       f64,
  pub computed_at: DateTime<Utc>,
}

/// History of an enrichment-provider run against an entity. Re-pointed to
/// the survivor on merge so provenance is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRun {
  pub run_id:      Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
  pub provider:    String,
  pub status:      String,
  pub run_at:      DateTime<Utc>,
}
