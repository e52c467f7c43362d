//! Per-category reassignment of dependent records during a merge.
//!
//! Every category is a concrete [`ChildReassigner`] applying the
//! conflict-avoid-then-move pattern: first delete absorbed-owned rows whose
//! natural key (with the owner swapped to the survivor) already exists, only
//! then re-point the remainder. The ordering in [`reassigners`] is fixed and
//! explicit; no step ever dispatches on a table-name string.
//!
//! The pattern guarantees that no UPDATE can trip a UNIQUE index: a
//! constraint violation reaching SQLite from here is a logic defect, not an
//! expected condition.

use graft_core::{
  audit::{Category, CategoryCounts},
  entity::EntityKind,
};
use rusqlite::{Transaction, params};
use uuid::Uuid;

use crate::{Result, encode::{encode_kind, encode_uuid}};

/// One dependent-record category's reassignment behavior.
pub(crate) trait ChildReassigner: Sync {
  fn category(&self) -> Category;

  /// Delete conflicting absorbed-owned rows, then move the rest to the
  /// survivor.
  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts>;

  /// Collapse value-identical survivor rows after the move. Only categories
  /// without an enforced natural key (phones) do anything here.
  fn deduplicate(
    &self,
    _tx: &Transaction<'_>,
    _kind: EntityKind,
    _owner: Uuid,
  ) -> Result<u64> {
    Ok(0)
  }
}

/// The fixed, explicitly ordered reassignment pipeline for one entity kind.
pub(crate) fn reassigners(
  kind: EntityKind,
) -> &'static [&'static dyn ChildReassigner] {
  match kind {
    EntityKind::Person => &[
      &Affiliations,
      &Identifiers,
      &Relationships,
      &EventAttendanceRows,
      &Conversations,
      &Phones,
      &Addresses,
      &Emails,
      &SocialProfiles,
    ],
    EntityKind::Organization => &[
      &Affiliations,
      &Identifiers,
      &Relationships,
      &EventAttendanceRows,
      &Phones,
      &Addresses,
      &Emails,
      &SocialProfiles,
      &Hierarchy,
    ],
  }
}

// ─── Affiliations ────────────────────────────────────────────────────────────

/// Key: (person_id, org_id, role, effective_start). For a person merge the
/// person side moves; for an organization merge the organization side.
/// `IS` comparison makes NULL effective_start rows collapse too.
pub(crate) struct Affiliations;

impl ChildReassigner for Affiliations {
  fn category(&self) -> Category { Category::Affiliations }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let (own, other) = match kind {
      EntityKind::Person => ("person_id", "org_id"),
      EntityKind::Organization => ("org_id", "person_id"),
    };

    let dropped = tx.execute(
      &format!(
        "DELETE FROM affiliations WHERE {own} = ?2 AND EXISTS (
           SELECT 1 FROM affiliations s
           WHERE s.{own} = ?1
             AND s.{other} = affiliations.{other}
             AND s.role = affiliations.role
             AND s.effective_start IS affiliations.effective_start)"
      ),
      params![encode_uuid(survivor), encode_uuid(absorbed)],
    )?;

    let moved = tx.execute(
      &format!("UPDATE affiliations SET {own} = ?1 WHERE {own} = ?2"),
      params![encode_uuid(survivor), encode_uuid(absorbed)],
    )?;

    Ok(CategoryCounts {
      reassigned:        moved as u64,
      conflicts_dropped: dropped as u64,
      deduplicated:      0,
    })
  }
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Key: (entity_kind, id_type, value) — global. A collision means some
/// other entity already registered the value, so the absorbed row is
/// dropped, never overwritten. With the UNIQUE index in place this delete
/// cannot match, but the move must stay collision-free by construction.
pub(crate) struct Identifiers;

impl ChildReassigner for Identifiers {
  fn category(&self) -> Category { Category::Identifiers }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let dropped = tx.execute(
      "DELETE FROM identifiers
       WHERE entity_kind = ?1 AND entity_id = ?3 AND EXISTS (
         SELECT 1 FROM identifiers s
         WHERE s.entity_kind = ?1
           AND s.id_type = identifiers.id_type
           AND s.value = identifiers.value
           AND s.entity_id != ?3)",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    let moved = tx.execute(
      "UPDATE identifiers SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    Ok(CategoryCounts {
      reassigned:        moved as u64,
      conflicts_dropped: dropped as u64,
      deduplicated:      0,
    })
  }
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// Key: (from_id, to_id, rel_type), checked once per side. Edges between
/// survivor and absorbed are dropped first — re-pointed they would become
/// self-edges.
pub(crate) struct Relationships;

impl ChildReassigner for Relationships {
  fn category(&self) -> Category { Category::Relationships }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    _kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let sur = encode_uuid(survivor);
    let abs = encode_uuid(absorbed);

    let self_edges = tx.execute(
      "DELETE FROM relationships
       WHERE (from_id = ?2 AND to_id = ?1) OR (from_id = ?1 AND to_id = ?2)",
      params![sur, abs],
    )?;

    let from_conflicts = tx.execute(
      "DELETE FROM relationships WHERE from_id = ?2 AND EXISTS (
         SELECT 1 FROM relationships s
         WHERE s.from_id = ?1
           AND s.to_id = relationships.to_id
           AND s.rel_type = relationships.rel_type)",
      params![sur, abs],
    )?;

    let to_conflicts = tx.execute(
      "DELETE FROM relationships WHERE to_id = ?2 AND EXISTS (
         SELECT 1 FROM relationships s
         WHERE s.to_id = ?1
           AND s.from_id = relationships.from_id
           AND s.rel_type = relationships.rel_type)",
      params![sur, abs],
    )?;

    let moved_from = tx.execute(
      "UPDATE relationships SET from_id = ?1 WHERE from_id = ?2",
      params![sur, abs],
    )?;
    let moved_to = tx.execute(
      "UPDATE relationships SET to_id = ?1 WHERE to_id = ?2",
      params![sur, abs],
    )?;

    Ok(CategoryCounts {
      reassigned:        (moved_from + moved_to) as u64,
      conflicts_dropped: (self_edges + from_conflicts + to_conflicts) as u64,
      deduplicated:      0,
    })
  }
}

// ─── Event attendance ────────────────────────────────────────────────────────

/// Key: (event_id, entity_kind, entity_id).
pub(crate) struct EventAttendanceRows;

impl ChildReassigner for EventAttendanceRows {
  fn category(&self) -> Category { Category::EventAttendance }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let dropped = tx.execute(
      "DELETE FROM event_attendance
       WHERE entity_kind = ?1 AND entity_id = ?3 AND EXISTS (
         SELECT 1 FROM event_attendance s
         WHERE s.entity_kind = ?1
           AND s.entity_id = ?2
           AND s.event_id = event_attendance.event_id)",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    let moved = tx.execute(
      "UPDATE event_attendance SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    Ok(CategoryCounts {
      reassigned:        moved as u64,
      conflicts_dropped: dropped as u64,
      deduplicated:      0,
    })
  }
}

// ─── Conversation participation ──────────────────────────────────────────────

/// Key: (conversation_id, person_id). Person merges only.
pub(crate) struct Conversations;

impl ChildReassigner for Conversations {
  fn category(&self) -> Category { Category::Conversations }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    _kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let dropped = tx.execute(
      "DELETE FROM conversation_participants
       WHERE person_id = ?2 AND EXISTS (
         SELECT 1 FROM conversation_participants s
         WHERE s.person_id = ?1
           AND s.conversation_id = conversation_participants.conversation_id)",
      params![encode_uuid(survivor), encode_uuid(absorbed)],
    )?;

    let moved = tx.execute(
      "UPDATE conversation_participants SET person_id = ?1
       WHERE person_id = ?2",
      params![encode_uuid(survivor), encode_uuid(absorbed)],
    )?;

    Ok(CategoryCounts {
      reassigned:        moved as u64,
      conflicts_dropped: dropped as u64,
      deduplicated:      0,
    })
  }
}

// ─── Contact fields ──────────────────────────────────────────────────────────

/// Phones carry no enforced natural key; everything moves, and the dedupe
/// pass collapses value-identical numbers under the survivor, keeping the
/// earliest-created row (id as final tie-break).
pub(crate) struct Phones;

impl ChildReassigner for Phones {
  fn category(&self) -> Category { Category::Phones }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let moved = tx.execute(
      "UPDATE phone_numbers SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;
    Ok(CategoryCounts { reassigned: moved as u64, ..Default::default() })
  }

  fn deduplicate(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    owner: Uuid,
  ) -> Result<u64> {
    let collapsed = tx.execute(
      "DELETE FROM phone_numbers
       WHERE entity_kind = ?1 AND entity_id = ?2 AND EXISTS (
         SELECT 1 FROM phone_numbers p
         WHERE p.entity_kind = phone_numbers.entity_kind
           AND p.entity_id = phone_numbers.entity_id
           AND p.number = phone_numbers.number
           AND (p.created_at < phone_numbers.created_at
                OR (p.created_at = phone_numbers.created_at
                    AND p.phone_id < phone_numbers.phone_id)))",
      params![encode_kind(kind), encode_uuid(owner)],
    )?;
    Ok(collapsed as u64)
  }
}

pub(crate) struct Addresses;

impl ChildReassigner for Addresses {
  fn category(&self) -> Category { Category::Addresses }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let moved = tx.execute(
      "UPDATE postal_addresses SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;
    Ok(CategoryCounts { reassigned: moved as u64, ..Default::default() })
  }
}

pub(crate) struct Emails;

impl ChildReassigner for Emails {
  fn category(&self) -> Category { Category::Emails }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let moved = tx.execute(
      "UPDATE email_addresses SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;
    Ok(CategoryCounts { reassigned: moved as u64, ..Default::default() })
  }
}

/// Key: (entity_kind, entity_id, platform, url).
pub(crate) struct SocialProfiles;

impl ChildReassigner for SocialProfiles {
  fn category(&self) -> Category { Category::SocialProfiles }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let dropped = tx.execute(
      "DELETE FROM social_profiles
       WHERE entity_kind = ?1 AND entity_id = ?3 AND EXISTS (
         SELECT 1 FROM social_profiles s
         WHERE s.entity_kind = ?1
           AND s.entity_id = ?2
           AND s.platform = social_profiles.platform
           AND s.url = social_profiles.url)",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    let moved = tx.execute(
      "UPDATE social_profiles SET entity_id = ?2
       WHERE entity_kind = ?1 AND entity_id = ?3",
      params![
        encode_kind(kind),
        encode_uuid(survivor),
        encode_uuid(absorbed)
      ],
    )?;

    Ok(CategoryCounts {
      reassigned:        moved as u64,
      conflicts_dropped: dropped as u64,
      deduplicated:      0,
    })
  }
}

// ─── Hierarchy links ─────────────────────────────────────────────────────────

/// Key: (parent_id, child_id, link_type), checked on both sides.
/// Organization merges only. Links between the pair are dropped first —
/// re-pointed they would make the survivor its own parent or child.
pub(crate) struct Hierarchy;

impl ChildReassigner for Hierarchy {
  fn category(&self) -> Category { Category::HierarchyLinks }

  fn reassign(
    &self,
    tx: &Transaction<'_>,
    _kind: EntityKind,
    survivor: Uuid,
    absorbed: Uuid,
  ) -> Result<CategoryCounts> {
    let sur = encode_uuid(survivor);
    let abs = encode_uuid(absorbed);

    let self_links = tx.execute(
      "DELETE FROM hierarchy_links
       WHERE (parent_id = ?2 AND child_id = ?1)
          OR (parent_id = ?1 AND child_id = ?2)",
      params![sur, abs],
    )?;

    let parent_conflicts = tx.execute(
      "DELETE FROM hierarchy_links WHERE parent_id = ?2 AND EXISTS (
         SELECT 1 FROM hierarchy_links s
         WHERE s.parent_id = ?1
           AND s.child_id = hierarchy_links.child_id
           AND s.link_type = hierarchy_links.link_type)",
      params![sur, abs],
    )?;

    let child_conflicts = tx.execute(
      "DELETE FROM hierarchy_links WHERE child_id = ?2 AND EXISTS (
         SELECT 1 FROM hierarchy_links s
         WHERE s.child_id = ?1
           AND s.parent_id = hierarchy_links.parent_id
           AND s.link_type = hierarchy_links.link_type)",
      params![sur, abs],
    )?;

    let moved_parent = tx.execute(
      "UPDATE hierarchy_links SET parent_id = ?1 WHERE parent_id = ?2",
      params![sur, abs],
    )?;
    let moved_child = tx.execute(
      "UPDATE hierarchy_links SET child_id = ?1 WHERE child_id = ?2",
      params![sur, abs],
    )?;

    Ok(CategoryCounts {
      reassigned:        (moved_parent + moved_child) as u64,
      conflicts_dropped: (self_links + parent_conflicts + child_conflicts)
        as u64,
      deduplicated:      0,
    })
  }
}
