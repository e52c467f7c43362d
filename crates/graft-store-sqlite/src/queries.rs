//! Row mappers and read helpers shared between the `GraphStore` trait
//! implementation and the merge executor.
//!
//! Everything here takes a plain `&rusqlite::Connection` so the same reads
//! work both on the store's connection and inside a merge transaction
//! (`Transaction` derefs to `Connection`).

use graft_core::{
  entity::{EntityKind, Organization, OrganizationSummary, Person},
  record::{
    Affiliation, ComputedScore, ConversationParticipant, EmailAddress,
    EnrichmentRun, EventAttendance, HierarchyLink, Identifier, PhoneNumber,
    PostalAddress, Relationship, SocialProfile, VisibilityGrant,
  },
};
use rusqlite::{Connection, OptionalExtension as _, Row, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    date_col_opt, dt_col, encode_kind, encode_uuid, kind_col, status_col,
    uuid_col, uuid_col_opt,
  },
};

// ─── Entities ────────────────────────────────────────────────────────────────

pub const PERSON_COLS: &str = "person_id, name, source, created_at";

pub fn map_person(row: &Row<'_>) -> rusqlite::Result<Person> {
  Ok(Person {
    person_id:  uuid_col(row, 0)?,
    name:       row.get(1)?,
    source:     row.get(2)?,
    created_at: dt_col(row, 3)?,
  })
}

pub fn get_person(conn: &Connection, id: Uuid) -> Result<Option<Person>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {PERSON_COLS} FROM persons WHERE person_id = ?1"),
        params![encode_uuid(id)],
        map_person,
      )
      .optional()?,
  )
}

pub const ORG_COLS: &str = "org_id, name, domain, website, industry, \
   description, size, employee_count, founded_year, revenue_range, \
   funding_total, funding_stage, headquarters, status, created_at";

pub fn map_organization(row: &Row<'_>) -> rusqlite::Result<Organization> {
  Ok(Organization {
    org_id:         uuid_col(row, 0)?,
    name:           row.get(1)?,
    domain:         row.get(2)?,
    website:        row.get(3)?,
    industry:       row.get(4)?,
    description:    row.get(5)?,
    size:           row.get(6)?,
    employee_count: row.get(7)?,
    founded_year:   row.get(8)?,
    revenue_range:  row.get(9)?,
    funding_total:  row.get(10)?,
    funding_stage:  row.get(11)?,
    headquarters:   row.get(12)?,
    status:         status_col(row, 13)?,
    created_at:     dt_col(row, 14)?,
  })
}

pub fn get_organization(
  conn: &Connection,
  id: Uuid,
) -> Result<Option<Organization>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {ORG_COLS} FROM organizations WHERE org_id = ?1"),
        params![encode_uuid(id)],
        map_organization,
      )
      .optional()?,
  )
}

// ─── Child records ───────────────────────────────────────────────────────────

pub fn map_identifier(row: &Row<'_>) -> rusqlite::Result<Identifier> {
  Ok(Identifier {
    identifier_id: uuid_col(row, 0)?,
    entity_kind:   kind_col(row, 1)?,
    entity_id:     uuid_col(row, 2)?,
    id_type:       row.get(3)?,
    value:         row.get(4)?,
    is_primary:    row.get(5)?,
  })
}

pub fn identifiers_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<Identifier>> {
  let mut stmt = conn.prepare(
    "SELECT identifier_id, entity_kind, entity_id, id_type, value, is_primary
     FROM identifiers WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(params![encode_kind(kind), encode_uuid(id)], map_identifier)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_affiliation(row: &Row<'_>) -> rusqlite::Result<Affiliation> {
  Ok(Affiliation {
    affiliation_id:  uuid_col(row, 0)?,
    person_id:       uuid_col(row, 1)?,
    org_id:          uuid_col(row, 2)?,
    role:            row.get(3)?,
    title:           row.get(4)?,
    is_primary:      row.get(5)?,
    is_current:      row.get(6)?,
    effective_start: date_col_opt(row, 7)?,
    effective_end:   date_col_opt(row, 8)?,
  })
}

const AFFILIATION_COLS: &str = "affiliation_id, person_id, org_id, role, \
   title, is_primary, is_current, effective_start, effective_end";

pub fn affiliations_for_person(
  conn: &Connection,
  person_id: Uuid,
) -> Result<Vec<Affiliation>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {AFFILIATION_COLS} FROM affiliations WHERE person_id = ?1"
  ))?;
  let rows = stmt
    .query_map(params![encode_uuid(person_id)], map_affiliation)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn affiliations_for_org(
  conn: &Connection,
  org_id: Uuid,
) -> Result<Vec<Affiliation>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {AFFILIATION_COLS} FROM affiliations WHERE org_id = ?1"
  ))?;
  let rows = stmt
    .query_map(params![encode_uuid(org_id)], map_affiliation)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
  Ok(Relationship {
    relationship_id: uuid_col(row, 0)?,
    from_kind:       kind_col(row, 1)?,
    from_id:         uuid_col(row, 2)?,
    to_kind:         kind_col(row, 3)?,
    to_id:           uuid_col(row, 4)?,
    rel_type:        row.get(5)?,
    pair_id:         uuid_col_opt(row, 6)?,
  })
}

pub fn relationships_for(
  conn: &Connection,
  entity_id: Uuid,
) -> Result<Vec<Relationship>> {
  let mut stmt = conn.prepare(
    "SELECT relationship_id, from_kind, from_id, to_kind, to_id, rel_type, pair_id
     FROM relationships WHERE from_id = ?1 OR to_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![encode_uuid(entity_id)], map_relationship)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_hierarchy_link(row: &Row<'_>) -> rusqlite::Result<HierarchyLink> {
  Ok(HierarchyLink {
    link_id:   uuid_col(row, 0)?,
    parent_id: uuid_col(row, 1)?,
    child_id:  uuid_col(row, 2)?,
    link_type: row.get(3)?,
  })
}

pub fn hierarchy_links_for(
  conn: &Connection,
  org_id: Uuid,
) -> Result<Vec<HierarchyLink>> {
  let mut stmt = conn.prepare(
    "SELECT link_id, parent_id, child_id, link_type
     FROM hierarchy_links WHERE parent_id = ?1 OR child_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![encode_uuid(org_id)], map_hierarchy_link)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_event_attendance(
  row: &Row<'_>,
) -> rusqlite::Result<EventAttendance> {
  Ok(EventAttendance {
    attendance_id: uuid_col(row, 0)?,
    event_id:      uuid_col(row, 1)?,
    entity_kind:   kind_col(row, 2)?,
    entity_id:     uuid_col(row, 3)?,
    role:          row.get(4)?,
  })
}

pub fn event_attendance_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<EventAttendance>> {
  let mut stmt = conn.prepare(
    "SELECT attendance_id, event_id, entity_kind, entity_id, role
     FROM event_attendance WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(
      params![encode_kind(kind), encode_uuid(id)],
      map_event_attendance,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_conversation_participant(
  row: &Row<'_>,
) -> rusqlite::Result<ConversationParticipant> {
  Ok(ConversationParticipant {
    participant_id:  uuid_col(row, 0)?,
    conversation_id: uuid_col(row, 1)?,
    person_id:       uuid_col(row, 2)?,
  })
}

pub fn conversations_for_person(
  conn: &Connection,
  person_id: Uuid,
) -> Result<Vec<ConversationParticipant>> {
  let mut stmt = conn.prepare(
    "SELECT participant_id, conversation_id, person_id
     FROM conversation_participants WHERE person_id = ?1",
  )?;
  let rows = stmt
    .query_map(params![encode_uuid(person_id)], map_conversation_participant)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_phone(row: &Row<'_>) -> rusqlite::Result<PhoneNumber> {
  Ok(PhoneNumber {
    phone_id:    uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    number:      row.get(3)?,
    label:       row.get(4)?,
    created_at:  dt_col(row, 5)?,
  })
}

pub fn phones_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<PhoneNumber>> {
  let mut stmt = conn.prepare(
    "SELECT phone_id, entity_kind, entity_id, number, label, created_at
     FROM phone_numbers WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(params![encode_kind(kind), encode_uuid(id)], map_phone)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_address(row: &Row<'_>) -> rusqlite::Result<PostalAddress> {
  Ok(PostalAddress {
    address_id:  uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    street:      row.get(3)?,
    city:        row.get(4)?,
    region:      row.get(5)?,
    postal_code: row.get(6)?,
    country:     row.get(7)?,
  })
}

pub fn addresses_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<PostalAddress>> {
  let mut stmt = conn.prepare(
    "SELECT address_id, entity_kind, entity_id, street, city, region,
            postal_code, country
     FROM postal_addresses WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(params![encode_kind(kind), encode_uuid(id)], map_address)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_email(row: &Row<'_>) -> rusqlite::Result<EmailAddress> {
  Ok(EmailAddress {
    email_id:    uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    address:     row.get(3)?,
    label:       row.get(4)?,
  })
}

pub fn emails_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<EmailAddress>> {
  let mut stmt = conn.prepare(
    "SELECT email_id, entity_kind, entity_id, address, label
     FROM email_addresses WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(params![encode_kind(kind), encode_uuid(id)], map_email)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_social_profile(row: &Row<'_>) -> rusqlite::Result<SocialProfile> {
  Ok(SocialProfile {
    profile_id:  uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    platform:    row.get(3)?,
    url:         row.get(4)?,
  })
}

pub fn social_profiles_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<SocialProfile>> {
  let mut stmt = conn.prepare(
    "SELECT profile_id, entity_kind, entity_id, platform, url
     FROM social_profiles WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(
      params![encode_kind(kind), encode_uuid(id)],
      map_social_profile,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_visibility_grant(
  row: &Row<'_>,
) -> rusqlite::Result<VisibilityGrant> {
  Ok(VisibilityGrant {
    grant_id:    uuid_col(row, 0)?,
    user_id:     uuid_col(row, 1)?,
    entity_kind: kind_col(row, 2)?,
    entity_id:   uuid_col(row, 3)?,
    level:       row.get(4)?,
    is_owner:    row.get(5)?,
  })
}

pub fn visibility_grants_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<VisibilityGrant>> {
  let mut stmt = conn.prepare(
    "SELECT grant_id, user_id, entity_kind, entity_id, level, is_owner
     FROM visibility_grants WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(
      params![encode_kind(kind), encode_uuid(id)],
      map_visibility_grant,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_computed_score(row: &Row<'_>) -> rusqlite::Result<ComputedScore> {
  Ok(ComputedScore {
    score_id:    uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    score_type:  row.get(3)?,
    value:       row.get(4)?,
    computed_at: dt_col(row, 5)?,
  })
}

pub fn computed_scores_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<ComputedScore>> {
  let mut stmt = conn.prepare(
    "SELECT score_id, entity_kind, entity_id, score_type, value, computed_at
     FROM computed_scores WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(
      params![encode_kind(kind), encode_uuid(id)],
      map_computed_score,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn map_enrichment_run(row: &Row<'_>) -> rusqlite::Result<EnrichmentRun> {
  Ok(EnrichmentRun {
    run_id:      uuid_col(row, 0)?,
    entity_kind: kind_col(row, 1)?,
    entity_id:   uuid_col(row, 2)?,
    provider:    row.get(3)?,
    status:      row.get(4)?,
    run_at:      dt_col(row, 5)?,
  })
}

pub fn enrichment_runs_for(
  conn: &Connection,
  kind: EntityKind,
  id: Uuid,
) -> Result<Vec<EnrichmentRun>> {
  let mut stmt = conn.prepare(
    "SELECT run_id, entity_kind, entity_id, provider, status, run_at
     FROM enrichment_runs WHERE entity_kind = ?1 AND entity_id = ?2",
  )?;
  let rows = stmt
    .query_map(
      params![encode_kind(kind), encode_uuid(id)],
      map_enrichment_run,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Counting & candidates ───────────────────────────────────────────────────

/// COUNT(*) with positional parameters.
pub fn count(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<u64> {
  Ok(conn.query_row(sql, params, |row| row.get::<_, i64>(0))? as u64)
}

/// Every (active organization, raw domain string) pair a duplicate scan
/// considers: the organization's own domain field plus each of its
/// `domain`-type identifiers.
pub fn domain_candidates(
  conn: &Connection,
) -> Result<Vec<(OrganizationSummary, String)>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ORG_COLS} FROM organizations WHERE status = 'active'"
  ))?;
  let orgs = stmt
    .query_map([], map_organization)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut out = Vec::new();
  for org in &orgs {
    let summary = OrganizationSummary::from(org);
    if let Some(domain) = &org.domain {
      out.push((summary.clone(), domain.clone()));
    }
    for ident in
      identifiers_for(conn, EntityKind::Organization, org.org_id)?
    {
      if ident.id_type == "domain" {
        out.push((summary.clone(), ident.value));
      }
    }
  }
  Ok(out)
}
