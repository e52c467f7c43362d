//! The transactional merge executor.
//!
//! One merge runs a strictly ordered sequence inside a single transaction:
//! Snapshot → Reassign → Repair-references → Deduplicate → Backfill →
//! Visibility-merge → Dependent-state-cleanup → Audit-repoint → Audit-write
//! → Delete-absorbed. Validation happens before the transaction opens, so a
//! caller observes either a typed pre-flight error or an all-or-nothing
//! transaction result — never partial state.

use chrono::Utc;
use graft_core::{
  Error as CoreError,
  audit::{EntitySnapshot, MergeCounts, MergeResult, SnapshotEntity},
  domain::{email_domain, is_public_domain},
  entity::{EntityKind, Organization},
  store::PersonFieldOverrides,
};
use rusqlite::{Connection, Transaction, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Result,
  encode::{encode_dt, encode_kind, encode_uuid},
  queries,
  reassign::reassigners,
};

// ─── Entry points ────────────────────────────────────────────────────────────

pub(crate) fn merge_organizations(
  conn: &mut Connection,
  survivor_id: Uuid,
  absorbed_id: Uuid,
  actor_id: Uuid,
) -> Result<MergeResult> {
  // Pre-flight: both must exist and be active, and differ.
  if survivor_id == absorbed_id {
    return Err(CoreError::SelfMerge(survivor_id).into());
  }
  for id in [survivor_id, absorbed_id] {
    let org = queries::get_organization(conn, id)?
      .ok_or(CoreError::OrganizationNotFound(id))?;
    if !org.is_active() {
      return Err(CoreError::OrganizationInactive(id).into());
    }
  }

  info!(
    survivor = %survivor_id,
    absorbed = %absorbed_id,
    "merging organizations"
  );

  let tx = conn.transaction()?;
  let counts = merge_one(
    &tx,
    EntityKind::Organization,
    survivor_id,
    absorbed_id,
    actor_id,
  )?;
  tx.commit()?;

  Ok(MergeResult {
    survivor_id,
    absorbed_ids: vec![absorbed_id],
    entity_kind: EntityKind::Organization,
    counts,
  })
}

pub(crate) fn merge_people(
  conn: &mut Connection,
  survivor_id: Uuid,
  absorbed_ids: &[Uuid],
  overrides: PersonFieldOverrides,
  actor_id: Uuid,
) -> Result<MergeResult> {
  // Pre-flight: a real batch, no self-merge, no duplicates, all present.
  if absorbed_ids.is_empty() {
    return Err(CoreError::BatchTooSmall(1 + absorbed_ids.len()).into());
  }
  let mut batch = vec![survivor_id];
  batch.extend_from_slice(absorbed_ids);
  if absorbed_ids.contains(&survivor_id) {
    return Err(CoreError::SelfMerge(survivor_id).into());
  }
  graft_core::preview::validate_batch(&batch)?;
  for id in &batch {
    queries::get_person(conn, *id)?
      .ok_or(CoreError::PersonNotFound(*id))?;
  }

  info!(
    survivor = %survivor_id,
    absorbed = absorbed_ids.len(),
    "merging person batch"
  );

  let tx = conn.transaction()?;
  let mut counts = MergeCounts::default();
  for absorbed_id in absorbed_ids {
    let one = merge_one(
      &tx,
      EntityKind::Person,
      survivor_id,
      *absorbed_id,
      actor_id,
    )?;
    counts.absorb(&one);
  }

  apply_overrides(&tx, survivor_id, &overrides)?;
  counts.affiliations_inferred = infer_affiliations(&tx, survivor_id)?;

  tx.commit()?;

  Ok(MergeResult {
    survivor_id,
    absorbed_ids: absorbed_ids.to_vec(),
    entity_kind: EntityKind::Person,
    counts,
  })
}

// ─── The per-pair pipeline ───────────────────────────────────────────────────

/// Steps Snapshot through Delete-absorbed for one (survivor, absorbed)
/// pair, inside the caller's open transaction.
fn merge_one(
  tx: &Transaction<'_>,
  kind: EntityKind,
  survivor_id: Uuid,
  absorbed_id: Uuid,
  actor_id: Uuid,
) -> Result<MergeCounts> {
  let snapshot = build_snapshot(tx, kind, absorbed_id)?;
  let mut counts = MergeCounts::default();

  for r in reassigners(kind) {
    let slot = r.reassign(tx, kind, survivor_id, absorbed_id)?;
    *counts.slot_mut(r.category()) = slot;
    debug!(
      category = ?r.category(),
      reassigned = slot.reassigned,
      conflicts = slot.conflicts_dropped,
      "reassigned category"
    );
  }

  repair_pair_references(tx)?;

  for r in reassigners(kind) {
    counts.slot_mut(r.category()).deduplicated =
      r.deduplicate(tx, kind, survivor_id)?;
  }

  if kind == EntityKind::Organization
    && let SnapshotEntity::Organization(absorbed_org) = &snapshot.entity
  {
    counts.backfilled_fields = backfill(tx, survivor_id, absorbed_org)?;
  }

  counts.visibility_grants_copied =
    merge_visibility_grants(tx, kind, survivor_id, absorbed_id)?;

  counts.scores_discarded = tx.execute(
    "DELETE FROM computed_scores WHERE entity_kind = ?1 AND entity_id = ?2",
    params![encode_kind(kind), encode_uuid(absorbed_id)],
  )? as u64;
  counts.enrichment_runs_repointed = tx.execute(
    "UPDATE enrichment_runs SET entity_id = ?2
     WHERE entity_kind = ?1 AND entity_id = ?3",
    params![
      encode_kind(kind),
      encode_uuid(survivor_id),
      encode_uuid(absorbed_id)
    ],
  )? as u64;

  // A past merge may have recorded the absorbed entity as its survivor;
  // re-point those records so the audit chain never names a deleted entity.
  counts.audit_records_repointed = tx.execute(
    "UPDATE merge_audit SET survivor_id = ?1
     WHERE survivor_id = ?2 AND entity_kind = ?3",
    params![
      encode_uuid(survivor_id),
      encode_uuid(absorbed_id),
      encode_kind(kind)
    ],
  )? as u64;

  write_audit_record(
    tx,
    kind,
    survivor_id,
    absorbed_id,
    &snapshot,
    &counts,
    actor_id,
  )?;

  let entity_table = match kind {
    EntityKind::Person => ("persons", "person_id"),
    EntityKind::Organization => ("organizations", "org_id"),
  };
  tx.execute(
    &format!(
      "DELETE FROM {} WHERE {} = ?1",
      entity_table.0, entity_table.1
    ),
    params![encode_uuid(absorbed_id)],
  )?;

  Ok(counts)
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A complete copy of the absorbed entity and every directly-owned child
/// collection — the merge's only recovery mechanism.
fn build_snapshot(
  tx: &Transaction<'_>,
  kind: EntityKind,
  id: Uuid,
) -> Result<EntitySnapshot> {
  let entity = match kind {
    EntityKind::Person => SnapshotEntity::Person(
      queries::get_person(tx, id)?.ok_or(CoreError::PersonNotFound(id))?,
    ),
    EntityKind::Organization => SnapshotEntity::Organization(
      queries::get_organization(tx, id)?
        .ok_or(CoreError::OrganizationNotFound(id))?,
    ),
  };

  let affiliations = match kind {
    EntityKind::Person => queries::affiliations_for_person(tx, id)?,
    EntityKind::Organization => queries::affiliations_for_org(tx, id)?,
  };
  let hierarchy_links = match kind {
    EntityKind::Organization => queries::hierarchy_links_for(tx, id)?,
    EntityKind::Person => Vec::new(),
  };
  let conversations = match kind {
    EntityKind::Person => queries::conversations_for_person(tx, id)?,
    EntityKind::Organization => Vec::new(),
  };

  Ok(EntitySnapshot {
    entity,
    identifiers: queries::identifiers_for(tx, kind, id)?,
    affiliations,
    relationships: queries::relationships_for(tx, id)?,
    hierarchy_links,
    event_attendance: queries::event_attendance_for(tx, kind, id)?,
    conversations,
    phones: queries::phones_for(tx, kind, id)?,
    addresses: queries::addresses_for(tx, kind, id)?,
    emails: queries::emails_for(tx, kind, id)?,
    social_profiles: queries::social_profiles_for(tx, kind, id)?,
    visibility_grants: queries::visibility_grants_for(tx, kind, id)?,
  })
}

// ─── Reference repair ────────────────────────────────────────────────────────

/// Null out `pair_id` back-pointers to relationship rows the conflict pass
/// deleted, so no dangling reference survives the merge.
fn repair_pair_references(tx: &Transaction<'_>) -> Result<()> {
  tx.execute(
    "UPDATE relationships SET pair_id = NULL
     WHERE pair_id IS NOT NULL
       AND pair_id NOT IN (SELECT relationship_id FROM relationships)",
    [],
  )?;
  Ok(())
}

// ─── Backfill ────────────────────────────────────────────────────────────────

/// Copy absorbed organization scalars onto the survivor, only where the
/// survivor's value is NULL or blank. Survivor values already set are never
/// overwritten.
fn backfill(
  tx: &Transaction<'_>,
  survivor_id: Uuid,
  absorbed: &Organization,
) -> Result<u64> {
  let survivor = queries::get_organization(tx, survivor_id)?
    .ok_or(CoreError::OrganizationNotFound(survivor_id))?;

  fn empty(v: &Option<String>) -> bool {
    v.as_deref().is_none_or(|s| s.trim().is_empty())
  }

  let mut sets: Vec<(&'static str, String)> = Vec::new();
  let text_fields: [(&'static str, &Option<String>, &Option<String>); 8] = [
    ("domain", &survivor.domain, &absorbed.domain),
    ("industry", &survivor.industry, &absorbed.industry),
    ("description", &survivor.description, &absorbed.description),
    ("website", &survivor.website, &absorbed.website),
    ("size", &survivor.size, &absorbed.size),
    ("revenue_range", &survivor.revenue_range, &absorbed.revenue_range),
    ("funding_stage", &survivor.funding_stage, &absorbed.funding_stage),
    ("headquarters", &survivor.headquarters, &absorbed.headquarters),
  ];
  for (col, sur, abs) in text_fields {
    if empty(sur)
      && let Some(value) = abs
      && !value.trim().is_empty()
    {
      sets.push((col, value.clone()));
    }
  }

  let mut filled = sets.len() as u64;
  for (col, value) in sets {
    tx.execute(
      &format!("UPDATE organizations SET {col} = ?1 WHERE org_id = ?2"),
      params![value, encode_uuid(survivor_id)],
    )?;
  }

  // Numeric fields follow the same empty-only rule.
  if survivor.employee_count.is_none()
    && let Some(v) = absorbed.employee_count
  {
    tx.execute(
      "UPDATE organizations SET employee_count = ?1 WHERE org_id = ?2",
      params![v, encode_uuid(survivor_id)],
    )?;
    filled += 1;
  }
  if survivor.founded_year.is_none()
    && let Some(v) = absorbed.founded_year
  {
    tx.execute(
      "UPDATE organizations SET founded_year = ?1 WHERE org_id = ?2",
      params![v, encode_uuid(survivor_id)],
    )?;
    filled += 1;
  }
  if survivor.funding_total.is_none()
    && let Some(v) = absorbed.funding_total
  {
    tx.execute(
      "UPDATE organizations SET funding_total = ?1 WHERE org_id = ?2",
      params![v, encode_uuid(survivor_id)],
    )?;
    filled += 1;
  }

  Ok(filled)
}

// ─── Visibility grants ───────────────────────────────────────────────────────

/// For every user who could see the absorbed entity but not the survivor,
/// grant equivalent access to the survivor; then drop the absorbed rows.
fn merge_visibility_grants(
  tx: &Transaction<'_>,
  kind: EntityKind,
  survivor_id: Uuid,
  absorbed_id: Uuid,
) -> Result<u64> {
  let absorbed_grants =
    queries::visibility_grants_for(tx, kind, absorbed_id)?;
  let survivor_users: Vec<Uuid> =
    queries::visibility_grants_for(tx, kind, survivor_id)?
      .into_iter()
      .map(|g| g.user_id)
      .collect();

  let mut copied = 0u64;
  for grant in &absorbed_grants {
    if survivor_users.contains(&grant.user_id) {
      continue;
    }
    tx.execute(
      "INSERT INTO visibility_grants
         (grant_id, user_id, entity_kind, entity_id, level, is_owner)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(grant.user_id),
        encode_kind(kind),
        encode_uuid(survivor_id),
        grant.level,
        grant.is_owner,
      ],
    )?;
    copied += 1;
  }

  tx.execute(
    "DELETE FROM visibility_grants WHERE entity_kind = ?1 AND entity_id = ?2",
    params![encode_kind(kind), encode_uuid(absorbed_id)],
  )?;

  Ok(copied)
}

// ─── Audit write ─────────────────────────────────────────────────────────────

fn write_audit_record(
  tx: &Transaction<'_>,
  kind: EntityKind,
  survivor_id: Uuid,
  absorbed_id: Uuid,
  snapshot: &EntitySnapshot,
  counts: &MergeCounts,
  actor_id: Uuid,
) -> Result<()> {
  let snapshot_json = serde_json::to_string(snapshot)?;
  let counts_json = serde_json::to_string(counts)?;

  tx.execute(
    "INSERT INTO merge_audit
       (audit_id, survivor_id, absorbed_id, entity_kind,
        snapshot_json, counts_json, actor_id, merged_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(survivor_id),
      encode_uuid(absorbed_id),
      encode_kind(kind),
      snapshot_json,
      counts_json,
      encode_uuid(actor_id),
      encode_dt(Utc::now()),
    ],
  )?;
  Ok(())
}

// ─── Batch finalization ──────────────────────────────────────────────────────

/// Apply caller-chosen scalar winners to the surviving person.
fn apply_overrides(
  tx: &Transaction<'_>,
  survivor_id: Uuid,
  overrides: &PersonFieldOverrides,
) -> Result<()> {
  if let Some(name) = &overrides.name {
    tx.execute(
      "UPDATE persons SET name = ?1 WHERE person_id = ?2",
      params![name, encode_uuid(survivor_id)],
    )?;
  }
  if let Some(source) = &overrides.source {
    tx.execute(
      "UPDATE persons SET source = ?1 WHERE person_id = ?2",
      params![source, encode_uuid(survivor_id)],
    )?;
  }
  Ok(())
}

/// Re-derive organization affiliations from the survivor's email
/// identifiers: for each email whose domain maps to an active organization
/// the survivor is not yet affiliated with, create the affiliation.
fn infer_affiliations(
  tx: &Transaction<'_>,
  survivor_id: Uuid,
) -> Result<u64> {
  let identifiers =
    queries::identifiers_for(tx, EntityKind::Person, survivor_id)?;

  let mut inferred = 0u64;
  for ident in identifiers.iter().filter(|i| i.id_type == "email") {
    let domain = email_domain(&ident.value);
    if domain.is_empty() || is_public_domain(&domain) {
      continue;
    }

    let Some(org) = find_org_by_root_domain(tx, &domain)? else {
      continue;
    };

    let existing = queries::count(
      tx,
      "SELECT COUNT(*) FROM affiliations
       WHERE person_id = ?1 AND org_id = ?2",
      params![encode_uuid(survivor_id), encode_uuid(org)],
    )?;
    if existing > 0 {
      continue;
    }

    tx.execute(
      "INSERT INTO affiliations
         (affiliation_id, person_id, org_id, role, is_primary, is_current)
       VALUES (?1, ?2, ?3, '', 0, 1)",
      params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(survivor_id),
        encode_uuid(org)
      ],
    )?;
    inferred += 1;
    debug!(person = %survivor_id, org = %org, "inferred affiliation");
  }

  Ok(inferred)
}

/// The oldest active organization whose own domain field or any domain
/// identifier normalizes to `domain`, if any.
fn find_org_by_root_domain(
  tx: &Transaction<'_>,
  domain: &str,
) -> Result<Option<Uuid>> {
  let mut candidates: Vec<(Uuid, chrono::DateTime<Utc>)> = Vec::new();
  let mut orgs_seen = std::collections::HashSet::new();

  let all = queries::domain_candidates(tx)?;
  for (summary, raw) in all {
    if graft_core::domain::normalize_domain(&raw) == domain
      && orgs_seen.insert(summary.org_id)
      && let Some(org) = queries::get_organization(tx, summary.org_id)?
    {
      candidates.push((org.org_id, org.created_at));
    }
  }

  candidates.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
  Ok(candidates.first().map(|(id, _)| *id))
}
