//! Merge audit types — the snapshot, the per-category counters, and the
//! audit record itself.
//!
//! The audit record is the merge's only recovery mechanism: it carries a
//! full serialized copy of the absorbed entity and every child collection it
//! owned, enough for a separate restore routine to rebuild it. Records are
//! append-only, with one narrow exception: when a past survivor is itself
//! absorbed later, the older record's survivor reference is re-pointed so
//! audit chains never name a deleted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{EntityKind, Organization, Person},
  record::{
    Affiliation, ConversationParticipant, EmailAddress, EventAttendance,
    HierarchyLink, Identifier, PhoneNumber, PostalAddress, Relationship,
    SocialProfile, VisibilityGrant,
  },
};

// ─── Counters ────────────────────────────────────────────────────────────────

/// The dependent-record categories the merge executor reassigns, in the
/// order it processes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Affiliations,
  Identifiers,
  Relationships,
  HierarchyLinks,
  EventAttendance,
  Conversations,
  Phones,
  Addresses,
  Emails,
  SocialProfiles,
}

/// What happened to one category during one merge.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct CategoryCounts {
  /// Rows re-pointed from the absorbed entity to the survivor.
  pub reassigned:       u64,
  /// Absorbed rows deleted because the survivor already held an identical
  /// natural key (or the row would have become self-referential).
  pub conflicts_dropped: u64,
  /// Survivor rows collapsed by the post-move value dedupe pass.
  pub deduplicated:     u64,
}

/// Per-category counters for one merge, plus the side effects that don't
/// fit the reassign shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeCounts {
  pub affiliations:     CategoryCounts,
  pub identifiers:      CategoryCounts,
  pub relationships:    CategoryCounts,
  pub hierarchy_links:  CategoryCounts,
  pub event_attendance: CategoryCounts,
  pub conversations:    CategoryCounts,
  pub phones:           CategoryCounts,
  pub addresses:        CategoryCounts,
  pub emails:           CategoryCounts,
  pub social_profiles:  CategoryCounts,

  pub visibility_grants_copied:   u64,
  pub scores_discarded:           u64,
  pub enrichment_runs_repointed:  u64,
  pub audit_records_repointed:    u64,
  pub backfilled_fields:          u64,
  /// Affiliations created by the post-batch email-domain inference pass
  /// (person merges only).
  pub affiliations_inferred:      u64,
}

impl MergeCounts {
  pub fn slot_mut(&mut self, category: Category) -> &mut CategoryCounts {
    match category {
      Category::Affiliations => &mut self.affiliations,
      Category::Identifiers => &mut self.identifiers,
      Category::Relationships => &mut self.relationships,
      Category::HierarchyLinks => &mut self.hierarchy_links,
      Category::EventAttendance => &mut self.event_attendance,
      Category::Conversations => &mut self.conversations,
      Category::Phones => &mut self.phones,
      Category::Addresses => &mut self.addresses,
      Category::Emails => &mut self.emails,
      Category::SocialProfiles => &mut self.social_profiles,
    }
  }

  pub fn slot(&self, category: Category) -> CategoryCounts {
    match category {
      Category::Affiliations => self.affiliations,
      Category::Identifiers => self.identifiers,
      Category::Relationships => self.relationships,
      Category::HierarchyLinks => self.hierarchy_links,
      Category::EventAttendance => self.event_attendance,
      Category::Conversations => self.conversations,
      Category::Phones => self.phones,
      Category::Addresses => self.addresses,
      Category::Emails => self.emails,
      Category::SocialProfiles => self.social_profiles,
    }
  }

  /// Fold another merge's counters in — used to aggregate a person batch
  /// into one [`MergeResult`].
  pub fn absorb(&mut self, other: &MergeCounts) {
    for cat in [
      Category::Affiliations,
      Category::Identifiers,
      Category::Relationships,
      Category::HierarchyLinks,
      Category::EventAttendance,
      Category::Conversations,
      Category::Phones,
      Category::Addresses,
      Category::Emails,
      Category::SocialProfiles,
    ] {
      let theirs = other.slot(cat);
      let ours = self.slot_mut(cat);
      ours.reassigned += theirs.reassigned;
      ours.conflicts_dropped += theirs.conflicts_dropped;
      ours.deduplicated += theirs.deduplicated;
    }
    self.visibility_grants_copied += other.visibility_grants_copied;
    self.scores_discarded += other.scores_discarded;
    self.enrichment_runs_repointed += other.enrichment_runs_repointed;
    self.audit_records_repointed += other.audit_records_repointed;
    self.backfilled_fields += other.backfilled_fields;
    self.affiliations_inferred += other.affiliations_inferred;
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The absorbed entity's own row, by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entity", rename_all = "lowercase")]
pub enum SnapshotEntity {
  Person(Person),
  Organization(Organization),
}

/// A self-contained copy of the absorbed entity and every directly-owned
/// child collection, captured before any destructive step runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
  pub entity:            SnapshotEntity,
  pub identifiers:       Vec<Identifier>,
  pub affiliations:      Vec<Affiliation>,
  pub relationships:     Vec<Relationship>,
  pub hierarchy_links:   Vec<HierarchyLink>,
  pub event_attendance:  Vec<EventAttendance>,
  pub conversations:     Vec<ConversationParticipant>,
  pub phones:            Vec<PhoneNumber>,
  pub addresses:         Vec<PostalAddress>,
  pub emails:            Vec<EmailAddress>,
  pub social_profiles:   Vec<SocialProfile>,
  pub visibility_grants: Vec<VisibilityGrant>,
}

// ─── Audit record ────────────────────────────────────────────────────────────

/// One committed merge. Written exclusively by the merge executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeAuditRecord {
  pub audit_id:    Uuid,
  pub survivor_id: Uuid,
  pub absorbed_id: Uuid,
  pub entity_kind: EntityKind,
  pub snapshot:    EntitySnapshot,
  pub counts:      MergeCounts,
  pub actor_id:    Uuid,
  pub merged_at:   DateTime<Utc>,
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// What a merge call returns to its caller: who survived, who was absorbed,
/// and the aggregated counters across the whole operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
  pub survivor_id:  Uuid,
  pub absorbed_ids: Vec<Uuid>,
  pub entity_kind:  EntityKind,
  pub counts:       MergeCounts,
}
