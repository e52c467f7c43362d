//! [`SqliteStore`] — the SQLite implementation of [`GraphStore`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use graft_core::{
  Error as CoreError,
  audit::{MergeAuditRecord, MergeResult},
  dedupe::{DuplicateGroup, group_by_domain},
  domain::{is_public_domain, normalize_domain},
  entity::{
    EntityKind, NewOrganization, NewPerson, Organization, OrganizationSummary,
    Person,
  },
  preview::{
    self, OrgDependentCounts, OrganizationMergePreview, OrganizationPreview,
    PersonDependentCounts, PersonMergePreview, PersonPreviewMember,
  },
  record::{
    Affiliation, ComputedScore, ConversationParticipant, EmailAddress,
    EnrichmentRun, EventAttendance, HierarchyLink, Identifier, NewAffiliation,
    NewIdentifier, NewRelationship, PhoneNumber, PostalAddress, Relationship,
    SocialProfile, VisibilityGrant,
  },
  store::{GraphStore, PersonFieldOverrides},
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    decode_dt, decode_kind, encode_date, encode_dt, encode_kind,
    encode_status, encode_uuid,
  },
  merge, queries,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Graft entity graph backed by a single SQLite file.
///
/// One connection, guarded by a mutex: the engine is synchronous
/// single-threaded business logic, and each merge runs inside one
/// transaction on this connection.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
    // A poisoned mutex only means another thread panicked mid-operation;
    // the connection itself is still usable and the transaction that was
    // in flight has rolled back.
    self.conn.lock().unwrap_or_else(|e| e.into_inner())
  }
}

// ─── GraphStore impl ─────────────────────────────────────────────────────────

impl GraphStore for SqliteStore {
  type Error = Error;

  // ── Entities ──────────────────────────────────────────────────────────────

  fn add_person(&self, new: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:  Uuid::new_v4(),
      name:       new.name,
      source:     new.source,
      created_at: Utc::now(),
    };

    self.conn().execute(
      "INSERT INTO persons (person_id, name, source, created_at)
       VALUES (?1, ?2, ?3, ?4)",
      params![
        encode_uuid(person.person_id),
        person.name,
        person.source,
        encode_dt(person.created_at),
      ],
    )?;
    Ok(person)
  }

  fn add_organization(&self, new: NewOrganization) -> Result<Organization> {
    let org = Organization {
      org_id:         Uuid::new_v4(),
      name:           new.name,
      domain:         new.domain,
      website:        new.website,
      industry:       new.industry,
      description:    new.description,
      size:           new.size,
      employee_count: new.employee_count,
      founded_year:   new.founded_year,
      revenue_range:  new.revenue_range,
      funding_total:  new.funding_total,
      funding_stage:  new.funding_stage,
      headquarters:   new.headquarters,
      status:         new.status,
      created_at:     Utc::now(),
    };

    self.conn().execute(
      "INSERT INTO organizations (
         org_id, name, domain, website, industry, description, size,
         employee_count, founded_year, revenue_range, funding_total,
         funding_stage, headquarters, status, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 ?14, ?15)",
      params![
        encode_uuid(org.org_id),
        org.name,
        org.domain,
        org.website,
        org.industry,
        org.description,
        org.size,
        org.employee_count,
        org.founded_year,
        org.revenue_range,
        org.funding_total,
        org.funding_stage,
        org.headquarters,
        encode_status(org.status),
        encode_dt(org.created_at),
      ],
    )?;
    Ok(org)
  }

  fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    queries::get_person(&self.conn(), id)
  }

  fn get_organization(&self, id: Uuid) -> Result<Option<Organization>> {
    queries::get_organization(&self.conn(), id)
  }

  // ── Child records ─────────────────────────────────────────────────────────

  fn add_identifier(&self, new: NewIdentifier) -> Result<Identifier> {
    let ident = Identifier {
      identifier_id: Uuid::new_v4(),
      entity_kind:   new.entity_kind,
      entity_id:     new.entity_id,
      id_type:       new.id_type,
      value:         new.value,
      is_primary:    new.is_primary,
    };

    self.conn().execute(
      "INSERT INTO identifiers
         (identifier_id, entity_kind, entity_id, id_type, value, is_primary)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(ident.identifier_id),
        encode_kind(ident.entity_kind),
        encode_uuid(ident.entity_id),
        ident.id_type,
        ident.value,
        ident.is_primary,
      ],
    )?;
    Ok(ident)
  }

  fn add_affiliation(&self, new: NewAffiliation) -> Result<Affiliation> {
    let aff = Affiliation {
      affiliation_id:  Uuid::new_v4(),
      person_id:       new.person_id,
      org_id:          new.org_id,
      role:            new.role,
      title:           new.title,
      is_primary:      new.is_primary,
      is_current:      new.is_current,
      effective_start: new.effective_start,
      effective_end:   new.effective_end,
    };

    self.conn().execute(
      "INSERT INTO affiliations
         (affiliation_id, person_id, org_id, role, title, is_primary,
          is_current, effective_start, effective_end)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      params![
        encode_uuid(aff.affiliation_id),
        encode_uuid(aff.person_id),
        encode_uuid(aff.org_id),
        aff.role,
        aff.title,
        aff.is_primary,
        aff.is_current,
        aff.effective_start.map(encode_date),
        aff.effective_end.map(encode_date),
      ],
    )?;
    Ok(aff)
  }

  fn add_relationship(&self, new: NewRelationship) -> Result<Relationship> {
    let forward_id = Uuid::new_v4();
    let reverse_id = new.symmetric.then(Uuid::new_v4);

    let forward = Relationship {
      relationship_id: forward_id,
      from_kind:       new.from_kind,
      from_id:         new.from_id,
      to_kind:         new.to_kind,
      to_id:           new.to_id,
      rel_type:        new.rel_type.clone(),
      pair_id:         reverse_id,
    };

    let conn = self.conn();
    conn.execute(
      "INSERT INTO relationships
         (relationship_id, from_kind, from_id, to_kind, to_id, rel_type,
          pair_id)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        encode_uuid(forward.relationship_id),
        encode_kind(forward.from_kind),
        encode_uuid(forward.from_id),
        encode_kind(forward.to_kind),
        encode_uuid(forward.to_id),
        forward.rel_type,
        forward.pair_id.map(encode_uuid),
      ],
    )?;

    if let Some(reverse_id) = reverse_id {
      conn.execute(
        "INSERT INTO relationships
           (relationship_id, from_kind, from_id, to_kind, to_id, rel_type,
            pair_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
          encode_uuid(reverse_id),
          encode_kind(new.to_kind),
          encode_uuid(new.to_id),
          encode_kind(new.from_kind),
          encode_uuid(new.from_id),
          new.rel_type,
          encode_uuid(forward_id),
        ],
      )?;
    }

    Ok(forward)
  }

  fn add_hierarchy_link(
    &self,
    parent_id: Uuid,
    child_id: Uuid,
    link_type: &str,
  ) -> Result<HierarchyLink> {
    let link = HierarchyLink {
      link_id: Uuid::new_v4(),
      parent_id,
      child_id,
      link_type: link_type.to_owned(),
    };

    self.conn().execute(
      "INSERT INTO hierarchy_links (link_id, parent_id, child_id, link_type)
       VALUES (?1, ?2, ?3, ?4)",
      params![
        encode_uuid(link.link_id),
        encode_uuid(link.parent_id),
        encode_uuid(link.child_id),
        link.link_type,
      ],
    )?;
    Ok(link)
  }

  fn add_event_attendance(
    &self,
    event_id: Uuid,
    entity_kind: EntityKind,
    entity_id: Uuid,
    role: Option<&str>,
  ) -> Result<EventAttendance> {
    let attendance = EventAttendance {
      attendance_id: Uuid::new_v4(),
      event_id,
      entity_kind,
      entity_id,
      role: role.map(str::to_owned),
    };

    self.conn().execute(
      "INSERT INTO event_attendance
         (attendance_id, event_id, entity_kind, entity_id, role)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(attendance.attendance_id),
        encode_uuid(attendance.event_id),
        encode_kind(attendance.entity_kind),
        encode_uuid(attendance.entity_id),
        attendance.role,
      ],
    )?;
    Ok(attendance)
  }

  fn add_conversation_participant(
    &self,
    conversation_id: Uuid,
    person_id: Uuid,
  ) -> Result<ConversationParticipant> {
    let participant = ConversationParticipant {
      participant_id: Uuid::new_v4(),
      conversation_id,
      person_id,
    };

    self.conn().execute(
      "INSERT INTO conversation_participants
         (participant_id, conversation_id, person_id)
       VALUES (?1, ?2, ?3)",
      params![
        encode_uuid(participant.participant_id),
        encode_uuid(participant.conversation_id),
        encode_uuid(participant.person_id),
      ],
    )?;
    Ok(participant)
  }

  fn add_phone(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    number: &str,
    label: Option<&str>,
  ) -> Result<PhoneNumber> {
    let phone = PhoneNumber {
      phone_id: Uuid::new_v4(),
      entity_kind,
      entity_id,
      number: number.to_owned(),
      label: label.map(str::to_owned),
      created_at: Utc::now(),
    };

    self.conn().execute(
      "INSERT INTO phone_numbers
         (phone_id, entity_kind, entity_id, number, label, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(phone.phone_id),
        encode_kind(phone.entity_kind),
        encode_uuid(phone.entity_id),
        phone.number,
        phone.label,
        encode_dt(phone.created_at),
      ],
    )?;
    Ok(phone)
  }

  fn add_address(&self, address: PostalAddress) -> Result<PostalAddress> {
    self.conn().execute(
      "INSERT INTO postal_addresses
         (address_id, entity_kind, entity_id, street, city, region,
          postal_code, country)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      params![
        encode_uuid(address.address_id),
        encode_kind(address.entity_kind),
        encode_uuid(address.entity_id),
        address.street,
        address.city,
        address.region,
        address.postal_code,
        address.country,
      ],
    )?;
    Ok(address)
  }

  fn add_email(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    address: &str,
    label: Option<&str>,
  ) -> Result<EmailAddress> {
    let email = EmailAddress {
      email_id: Uuid::new_v4(),
      entity_kind,
      entity_id,
      address: address.to_owned(),
      label: label.map(str::to_owned),
    };

    self.conn().execute(
      "INSERT INTO email_addresses
         (email_id, entity_kind, entity_id, address, label)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(email.email_id),
        encode_kind(email.entity_kind),
        encode_uuid(email.entity_id),
        email.address,
        email.label,
      ],
    )?;
    Ok(email)
  }

  fn add_social_profile(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    platform: &str,
    url: &str,
  ) -> Result<SocialProfile> {
    let profile = SocialProfile {
      profile_id: Uuid::new_v4(),
      entity_kind,
      entity_id,
      platform: platform.to_owned(),
      url: url.to_owned(),
    };

    self.conn().execute(
      "INSERT INTO social_profiles
         (profile_id, entity_kind, entity_id, platform, url)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(profile.profile_id),
        encode_kind(profile.entity_kind),
        encode_uuid(profile.entity_id),
        profile.platform,
        profile.url,
      ],
    )?;
    Ok(profile)
  }

  fn add_visibility_grant(
    &self,
    user_id: Uuid,
    entity_kind: EntityKind,
    entity_id: Uuid,
    level: &str,
    is_owner: bool,
  ) -> Result<VisibilityGrant> {
    let grant = VisibilityGrant {
      grant_id: Uuid::new_v4(),
      user_id,
      entity_kind,
      entity_id,
      level: level.to_owned(),
      is_owner,
    };

    self.conn().execute(
      "INSERT INTO visibility_grants
         (grant_id, user_id, entity_kind, entity_id, level, is_owner)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(grant.grant_id),
        encode_uuid(grant.user_id),
        encode_kind(grant.entity_kind),
        encode_uuid(grant.entity_id),
        grant.level,
        grant.is_owner,
      ],
    )?;
    Ok(grant)
  }

  fn add_computed_score(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    score_type: &str,
    value: f64,
  ) -> Result<ComputedScore> {
    let score = ComputedScore {
      score_id: Uuid::new_v4(),
      entity_kind,
      entity_id,
      score_type: score_type.to_owned(),
      value,
      computed_at: Utc::now(),
    };

    self.conn().execute(
      "INSERT INTO computed_scores
         (score_id, entity_kind, entity_id, score_type, value, computed_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(score.score_id),
        encode_kind(score.entity_kind),
        encode_uuid(score.entity_id),
        score.score_type,
        score.value,
        encode_dt(score.computed_at),
      ],
    )?;
    Ok(score)
  }

  fn add_enrichment_run(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    provider: &str,
    status: &str,
  ) -> Result<EnrichmentRun> {
    let run = EnrichmentRun {
      run_id: Uuid::new_v4(),
      entity_kind,
      entity_id,
      provider: provider.to_owned(),
      status: status.to_owned(),
      run_at: Utc::now(),
    };

    self.conn().execute(
      "INSERT INTO enrichment_runs
         (run_id, entity_kind, entity_id, provider, status, run_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        encode_uuid(run.run_id),
        encode_kind(run.entity_kind),
        encode_uuid(run.entity_id),
        run.provider,
        run.status,
        encode_dt(run.run_at),
      ],
    )?;
    Ok(run)
  }

  // ── Child-record reads ────────────────────────────────────────────────────

  fn identifiers_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<Identifier>> {
    queries::identifiers_for(&self.conn(), entity_kind, entity_id)
  }

  fn affiliations_for_person(
    &self,
    person_id: Uuid,
  ) -> Result<Vec<Affiliation>> {
    queries::affiliations_for_person(&self.conn(), person_id)
  }

  fn relationships_for(&self, entity_id: Uuid) -> Result<Vec<Relationship>> {
    queries::relationships_for(&self.conn(), entity_id)
  }

  fn hierarchy_links_for(&self, org_id: Uuid) -> Result<Vec<HierarchyLink>> {
    queries::hierarchy_links_for(&self.conn(), org_id)
  }

  fn phones_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<PhoneNumber>> {
    queries::phones_for(&self.conn(), entity_kind, entity_id)
  }

  fn visibility_grants_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<VisibilityGrant>> {
    queries::visibility_grants_for(&self.conn(), entity_kind, entity_id)
  }

  fn computed_scores_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<ComputedScore>> {
    queries::computed_scores_for(&self.conn(), entity_kind, entity_id)
  }

  fn enrichment_runs_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<EnrichmentRun>> {
    queries::enrichment_runs_for(&self.conn(), entity_kind, entity_id)
  }

  // ── Duplicate detection ───────────────────────────────────────────────────

  fn find_organizations_by_domain(
    &self,
    raw: &str,
  ) -> Result<Vec<OrganizationSummary>> {
    let needle = normalize_domain(raw);
    if needle.is_empty() || is_public_domain(&needle) {
      return Ok(Vec::new());
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (summary, candidate) in queries::domain_candidates(&self.conn())? {
      if normalize_domain(&candidate) == needle && seen.insert(summary.org_id)
      {
        out.push(summary);
      }
    }
    Ok(out)
  }

  fn detect_duplicate_organizations(&self) -> Result<Vec<DuplicateGroup>> {
    let candidates = queries::domain_candidates(&self.conn())?;
    let groups = group_by_domain(candidates);
    tracing::debug!(groups = groups.len(), "duplicate scan complete");
    Ok(groups)
  }

  // ── Previews ──────────────────────────────────────────────────────────────

  fn preview_organization_merge(
    &self,
    survivor_id: Uuid,
    absorbed_id: Uuid,
  ) -> Result<OrganizationMergePreview> {
    let conn = self.conn();

    let survivor = queries::get_organization(&conn, survivor_id)?
      .ok_or(CoreError::OrganizationNotFound(survivor_id))?;
    let absorbed = queries::get_organization(&conn, absorbed_id)?
      .ok_or(CoreError::OrganizationNotFound(absorbed_id))?;

    let abs = encode_uuid(absorbed_id);
    let kind = encode_kind(EntityKind::Organization);

    let counts = OrgDependentCounts {
      affiliations: queries::count(
        &conn,
        "SELECT COUNT(*) FROM affiliations WHERE org_id = ?1",
        params![abs],
      )?,
      relationships: queries::count(
        &conn,
        "SELECT COUNT(*) FROM relationships WHERE from_id = ?1 OR to_id = ?1",
        params![abs],
      )?,
      event_attendance: queries::count(
        &conn,
        "SELECT COUNT(*) FROM event_attendance
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
      identifiers: queries::count(
        &conn,
        "SELECT COUNT(*) FROM identifiers
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
      hierarchy_links: queries::count(
        &conn,
        "SELECT COUNT(*) FROM hierarchy_links
         WHERE parent_id = ?1 OR child_id = ?1",
        params![abs],
      )?,
      phones: queries::count(
        &conn,
        "SELECT COUNT(*) FROM phone_numbers
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
      addresses: queries::count(
        &conn,
        "SELECT COUNT(*) FROM postal_addresses
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
      emails: queries::count(
        &conn,
        "SELECT COUNT(*) FROM email_addresses
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
      social_profiles: queries::count(
        &conn,
        "SELECT COUNT(*) FROM social_profiles
         WHERE entity_kind = ?1 AND entity_id = ?2",
        params![kind, abs],
      )?,
    };

    // Edges that will collapse rather than move: absorbed edges whose key
    // with the owner swapped to the survivor already exists, either
    // direction. Edges between the pair themselves are self-edge drops,
    // not duplicates.
    let sur = encode_uuid(survivor_id);
    let duplicate_relationships = queries::count(
      &conn,
      "SELECT COUNT(*) FROM relationships r
       WHERE r.from_id = ?2 AND r.to_id != ?1 AND EXISTS (
         SELECT 1 FROM relationships s
         WHERE s.from_id = ?1 AND s.to_id = r.to_id
           AND s.rel_type = r.rel_type)",
      params![sur, abs],
    )? + queries::count(
      &conn,
      "SELECT COUNT(*) FROM relationships r
       WHERE r.to_id = ?2 AND r.from_id != ?1 AND EXISTS (
         SELECT 1 FROM relationships s
         WHERE s.to_id = ?1 AND s.from_id = r.from_id
           AND s.rel_type = r.rel_type)",
      params![sur, abs],
    )?;

    let survivor_idents =
      queries::identifiers_for(&conn, EntityKind::Organization, survivor_id)?;
    let absorbed_idents =
      queries::identifiers_for(&conn, EntityKind::Organization, absorbed_id)?;

    Ok(OrganizationMergePreview {
      survivor: OrganizationPreview {
        display_domain: preview::display_domain(&survivor, &survivor_idents),
        organization:   survivor,
      },
      absorbed: OrganizationPreview {
        display_domain: preview::display_domain(&absorbed, &absorbed_idents),
        organization:   absorbed,
      },
      counts,
      duplicate_relationships,
    })
  }

  fn preview_person_merge(&self, ids: &[Uuid]) -> Result<PersonMergePreview> {
    preview::validate_batch(ids)?;

    let conn = self.conn();
    let kind = encode_kind(EntityKind::Person);

    let mut members = Vec::with_capacity(ids.len());
    let mut combined = PersonDependentCounts::default();
    let mut all_identifiers = Vec::new();
    let mut all_affiliations = Vec::new();

    for id in ids {
      let person = queries::get_person(&conn, *id)?
        .ok_or(CoreError::PersonNotFound(*id))?;
      let id_str = encode_uuid(*id);

      let counts = PersonDependentCounts {
        identifiers: queries::count(
          &conn,
          "SELECT COUNT(*) FROM identifiers
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
        affiliations: queries::count(
          &conn,
          "SELECT COUNT(*) FROM affiliations WHERE person_id = ?1",
          params![id_str],
        )?,
        conversations: queries::count(
          &conn,
          "SELECT COUNT(*) FROM conversation_participants
           WHERE person_id = ?1",
          params![id_str],
        )?,
        relationships: queries::count(
          &conn,
          "SELECT COUNT(*) FROM relationships
           WHERE from_id = ?1 OR to_id = ?1",
          params![id_str],
        )?,
        event_attendance: queries::count(
          &conn,
          "SELECT COUNT(*) FROM event_attendance
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
        phones: queries::count(
          &conn,
          "SELECT COUNT(*) FROM phone_numbers
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
        addresses: queries::count(
          &conn,
          "SELECT COUNT(*) FROM postal_addresses
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
        emails: queries::count(
          &conn,
          "SELECT COUNT(*) FROM email_addresses
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
        social_profiles: queries::count(
          &conn,
          "SELECT COUNT(*) FROM social_profiles
           WHERE entity_kind = ?1 AND entity_id = ?2",
          params![kind, id_str],
        )?,
      };

      combined.add(&counts);
      all_identifiers
        .extend(queries::identifiers_for(&conn, EntityKind::Person, *id)?);
      all_affiliations
        .extend(queries::affiliations_for_person(&conn, *id)?);
      members.push(PersonPreviewMember { person, counts });
    }

    let names = preview::scalar_conflicts(
      members.iter().map(|m| m.person.name.as_deref()),
    );
    let sources = preview::scalar_conflicts(
      members.iter().map(|m| m.person.source.as_deref()),
    );

    Ok(PersonMergePreview {
      distinct_identifiers:  preview::distinct_identifier_count(
        &all_identifiers,
      ),
      distinct_affiliations: preview::distinct_affiliation_count(
        &all_affiliations,
      ),
      members,
      combined,
      names,
      sources,
    })
  }

  // ── Merges ────────────────────────────────────────────────────────────────

  fn merge_organizations(
    &self,
    survivor_id: Uuid,
    absorbed_id: Uuid,
    actor_id: Uuid,
  ) -> Result<MergeResult> {
    merge::merge_organizations(
      &mut self.conn(),
      survivor_id,
      absorbed_id,
      actor_id,
    )
  }

  fn merge_people(
    &self,
    survivor_id: Uuid,
    absorbed_ids: &[Uuid],
    overrides: PersonFieldOverrides,
    actor_id: Uuid,
  ) -> Result<MergeResult> {
    merge::merge_people(
      &mut self.conn(),
      survivor_id,
      absorbed_ids,
      overrides,
      actor_id,
    )
  }

  // ── Audit log ─────────────────────────────────────────────────────────────

  fn merge_history_for(
    &self,
    entity_id: Uuid,
  ) -> Result<Vec<MergeAuditRecord>> {
    struct RawAudit {
      audit_id:      String,
      survivor_id:   String,
      absorbed_id:   String,
      entity_kind:   String,
      snapshot_json: String,
      counts_json:   String,
      actor_id:      String,
      merged_at:     String,
    }

    let conn = self.conn();
    let mut stmt = conn.prepare(
      "SELECT audit_id, survivor_id, absorbed_id, entity_kind,
              snapshot_json, counts_json, actor_id, merged_at
       FROM merge_audit
       WHERE survivor_id = ?1 OR absorbed_id = ?1
       ORDER BY merged_at DESC",
    )?;

    let raws = stmt
      .query_map(params![encode_uuid(entity_id)], |row| {
        Ok(RawAudit {
          audit_id:      row.get(0)?,
          survivor_id:   row.get(1)?,
          absorbed_id:   row.get(2)?,
          entity_kind:   row.get(3)?,
          snapshot_json: row.get(4)?,
          counts_json:   row.get(5)?,
          actor_id:      row.get(6)?,
          merged_at:     row.get(7)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws
      .into_iter()
      .map(|raw| {
        Ok(MergeAuditRecord {
          audit_id:    Uuid::parse_str(&raw.audit_id)?,
          survivor_id: Uuid::parse_str(&raw.survivor_id)?,
          absorbed_id: Uuid::parse_str(&raw.absorbed_id)?,
          entity_kind: decode_kind(&raw.entity_kind)?,
          snapshot:    serde_json::from_str(&raw.snapshot_json)?,
          counts:      serde_json::from_str(&raw.counts_json)?,
          actor_id:    Uuid::parse_str(&raw.actor_id)?,
          merged_at:   decode_dt(&raw.merged_at)?,
        })
      })
      .collect()
  }
}
