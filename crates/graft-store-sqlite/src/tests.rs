//! Integration tests for `SqliteStore` against an in-memory database.

use graft_core::{
  Error as CoreError,
  entity::{EntityKind, NewOrganization, NewPerson, OrgStatus},
  record::{NewAffiliation, NewIdentifier, NewRelationship},
  store::{GraphStore, PersonFieldOverrides},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

fn store() -> SqliteStore {
  SqliteStore::open_in_memory().expect("in-memory store")
}

fn actor() -> Uuid { Uuid::new_v4() }

fn org(s: &SqliteStore, name: &str, domain: Option<&str>) -> Uuid {
  let mut new = NewOrganization::named(name);
  new.domain = domain.map(str::to_owned);
  s.add_organization(new).unwrap().org_id
}

fn person(s: &SqliteStore, name: &str) -> Uuid {
  s.add_person(NewPerson::named(name)).unwrap().person_id
}

fn assert_core_err(err: Error, check: impl Fn(&CoreError) -> bool) {
  match err {
    Error::Core(core) => assert!(check(&core), "unexpected: {core}"),
    other => panic!("expected core error, got: {other}"),
  }
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

#[test]
fn find_by_domain_matches_field_and_identifier() {
  let s = store();
  let by_field = org(&s, "Acme", Some("https://www.acme.com"));
  let by_ident = org(&s, "Acme Ltd", None);
  s.add_identifier(NewIdentifier::new(
    EntityKind::Organization,
    by_ident,
    "domain",
    "acme.com",
  ))
  .unwrap();
  org(&s, "Unrelated", Some("other.com"));

  let found = s.find_organizations_by_domain("acme.com/about").unwrap();
  let ids: Vec<Uuid> = found.iter().map(|o| o.org_id).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&by_field));
  assert!(ids.contains(&by_ident));
}

#[test]
fn find_by_domain_skips_public_blank_and_inactive() {
  let s = store();
  org(&s, "G", Some("gmail.com"));
  let mut inactive = NewOrganization::named("Gone").with_domain("dead.com");
  inactive.status = OrgStatus::Inactive;
  s.add_organization(inactive).unwrap();

  assert!(s.find_organizations_by_domain("gmail.com").unwrap().is_empty());
  assert!(s.find_organizations_by_domain("").unwrap().is_empty());
  assert!(s.find_organizations_by_domain("dead.com").unwrap().is_empty());
}

#[test]
fn detect_all_groups_and_orders() {
  let s = store();
  // Three orgs on beta.com, two on alpha.com, one singleton, one public.
  org(&s, "B1", Some("beta.com"));
  org(&s, "B2", Some("www.beta.com"));
  let b3 = org(&s, "B3", None);
  s.add_identifier(NewIdentifier::new(
    EntityKind::Organization,
    b3,
    "domain",
    "https://beta.com/x",
  ))
  .unwrap();
  org(&s, "A1", Some("alpha.com"));
  org(&s, "A2", Some("alpha.com"));
  org(&s, "Solo", Some("solo.com"));
  org(&s, "Mail", Some("hotmail.com"));

  let groups = s.detect_duplicate_organizations().unwrap();
  assert_eq!(groups.len(), 2);
  assert!(groups.iter().all(|g| g.len() >= 2));
  assert_eq!(groups[0].domain, "beta.com");
  assert_eq!(groups[0].len(), 3);
  assert_eq!(groups[1].domain, "alpha.com");
}

// ─── Organization preview ────────────────────────────────────────────────────

#[test]
fn org_preview_counts_and_duplicate_relationships() {
  let s = store();
  let a = org(&s, "A", Some("a.com"));
  let b = org(&s, "B", Some("b.com"));
  let c = org(&s, "C", Some("c.com"));

  // A→C and B→C of the same type: one duplicate.
  for from in [a, b] {
    s.add_relationship(NewRelationship::new(
      EntityKind::Organization,
      from,
      EntityKind::Organization,
      c,
      "KNOWS",
    ))
    .unwrap();
  }
  // B's own extra dependents.
  let p = person(&s, "P");
  s.add_affiliation(NewAffiliation::new(p, b, "engineer")).unwrap();
  s.add_phone(EntityKind::Organization, b, "555-0100", None).unwrap();
  s.add_email(EntityKind::Organization, b, "info@b.com", None).unwrap();

  let preview = s.preview_organization_merge(a, b).unwrap();
  assert_eq!(preview.duplicate_relationships, 1);
  assert_eq!(preview.counts.relationships, 1);
  assert_eq!(preview.counts.affiliations, 1);
  assert_eq!(preview.counts.phones, 1);
  assert_eq!(preview.counts.emails, 1);
  assert_eq!(preview.counts.hierarchy_links, 0);
}

#[test]
fn org_preview_display_domain_falls_back_to_identifier() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", Some("b.com"));
  s.add_identifier(
    NewIdentifier::new(EntityKind::Organization, a, "domain", "acme.com")
      .primary(),
  )
  .unwrap();

  let preview = s.preview_organization_merge(a, b).unwrap();
  assert_eq!(preview.survivor.display_domain.as_deref(), Some("acme.com"));
  assert_eq!(preview.absorbed.display_domain.as_deref(), Some("b.com"));
}

#[test]
fn org_preview_missing_id_is_not_found() {
  let s = store();
  let a = org(&s, "A", None);
  let ghost = Uuid::new_v4();

  let err = s.preview_organization_merge(a, ghost).unwrap_err();
  assert_core_err(err, |e| {
    matches!(e, CoreError::OrganizationNotFound(id) if *id == ghost)
  });
}

// ─── Organization merge ──────────────────────────────────────────────────────

#[test]
fn org_merge_reassigns_children_and_deletes_absorbed() {
  let s = store();
  let a = org(&s, "A", Some("a.com"));
  let b = org(&s, "B", Some("b.com"));
  let c = org(&s, "C", Some("c.com"));
  let d = org(&s, "D", Some("d.com"));

  let p1 = person(&s, "P1");
  let p2 = person(&s, "P2");
  s.add_affiliation(NewAffiliation::new(p1, b, "engineer")).unwrap();
  // p2 affiliated with both sides under the same key: conflict.
  s.add_affiliation(NewAffiliation::new(p2, a, "advisor")).unwrap();
  s.add_affiliation(NewAffiliation::new(p2, b, "advisor")).unwrap();

  s.add_identifier(NewIdentifier::new(
    EntityKind::Organization,
    b,
    "domain",
    "b-alias.com",
  ))
  .unwrap();
  s.add_relationship(NewRelationship::new(
    EntityKind::Organization,
    b,
    EntityKind::Organization,
    c,
    "partner",
  ))
  .unwrap();
  // An edge between the pair: would become a self-edge, must be dropped.
  s.add_relationship(NewRelationship::new(
    EntityKind::Organization,
    a,
    EntityKind::Organization,
    b,
    "competitor",
  ))
  .unwrap();
  s.add_hierarchy_link(b, d, "subsidiary").unwrap();
  s.add_phone(EntityKind::Organization, b, "555-0100", None).unwrap();
  s.add_social_profile(EntityKind::Organization, b, "x", "https://x.com/b")
    .unwrap();

  let result = s.merge_organizations(a, b, actor()).unwrap();

  // Absorbed is gone; nothing references it any more.
  assert!(s.get_organization(b).unwrap().is_none());
  assert!(s.relationships_for(b).unwrap().is_empty());
  assert!(s.hierarchy_links_for(b).unwrap().is_empty());
  assert!(
    s.identifiers_for(EntityKind::Organization, b).unwrap().is_empty()
  );

  // Children now hang off the survivor.
  let affs: Vec<Uuid> = {
    let mut ids: Vec<Uuid> = s
      .affiliations_for_person(p1)
      .unwrap()
      .into_iter()
      .map(|x| x.org_id)
      .collect();
    ids.extend(
      s.affiliations_for_person(p2).unwrap().into_iter().map(|x| x.org_id),
    );
    ids
  };
  assert!(affs.iter().all(|id| *id == a));
  assert_eq!(affs.len(), 2);

  let rels = s.relationships_for(a).unwrap();
  assert!(rels.iter().all(|r| r.from_id != r.to_id));
  assert!(rels.iter().any(|r| r.from_id == a && r.to_id == c));
  let links = s.hierarchy_links_for(a).unwrap();
  assert_eq!(links.len(), 1);
  assert_eq!(links[0].parent_id, a);
  assert_eq!(links[0].child_id, d);

  // Counts reflect what actually happened.
  assert_eq!(result.counts.affiliations.reassigned, 1);
  assert_eq!(result.counts.affiliations.conflicts_dropped, 1);
  assert_eq!(result.counts.identifiers.reassigned, 1);
  assert_eq!(result.counts.relationships.reassigned, 1);
  assert_eq!(result.counts.relationships.conflicts_dropped, 1);
  assert_eq!(result.counts.hierarchy_links.reassigned, 1);
  assert_eq!(result.counts.phones.reassigned, 1);
  assert_eq!(result.counts.social_profiles.reassigned, 1);

  // Exactly one audit record for (A, B), carrying the same counts.
  let history = s.merge_history_for(b).unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].survivor_id, a);
  assert_eq!(history[0].absorbed_id, b);
  assert_eq!(history[0].counts.affiliations, result.counts.affiliations);
  match &history[0].snapshot.entity {
    graft_core::audit::SnapshotEntity::Organization(snap) => {
      assert_eq!(snap.org_id, b);
      assert_eq!(snap.name.as_deref(), Some("B"));
    }
    other => panic!("wrong snapshot entity: {other:?}"),
  }
  assert_eq!(history[0].snapshot.identifiers.len(), 1);
}

#[test]
fn duplicate_relationships_collapse_to_one() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  let c = org(&s, "C", None);
  for from in [a, b] {
    s.add_relationship(NewRelationship::new(
      EntityKind::Organization,
      from,
      EntityKind::Organization,
      c,
      "KNOWS",
    ))
    .unwrap();
  }

  assert_eq!(
    s.preview_organization_merge(a, b).unwrap().duplicate_relationships,
    1
  );

  s.merge_organizations(a, b, actor()).unwrap();

  let knows: Vec<_> = s
    .relationships_for(a)
    .unwrap()
    .into_iter()
    .filter(|r| r.rel_type == "KNOWS" && r.from_id == a && r.to_id == c)
    .collect();
  assert_eq!(knows.len(), 1);
}

#[test]
fn dangling_pair_references_are_repaired() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  let c = org(&s, "C", None);

  // B↔C symmetric; A→C plain. Merging B into A conflicts away B→C, so
  // C→B (re-pointed to C→A) holds a pair_id to a deleted row.
  s.add_relationship(
    NewRelationship::new(
      EntityKind::Organization,
      b,
      EntityKind::Organization,
      c,
      "partner",
    )
    .symmetric(),
  )
  .unwrap();
  s.add_relationship(NewRelationship::new(
    EntityKind::Organization,
    a,
    EntityKind::Organization,
    c,
    "partner",
  ))
  .unwrap();

  s.merge_organizations(a, b, actor()).unwrap();

  let rels = s.relationships_for(a).unwrap();
  let inbound = rels
    .iter()
    .find(|r| r.from_id == c && r.to_id == a)
    .expect("re-pointed reverse edge");
  assert_eq!(inbound.pair_id, None);
}

#[test]
fn hierarchy_link_between_pair_is_dropped() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  s.add_hierarchy_link(b, a, "subsidiary").unwrap();

  s.merge_organizations(a, b, actor()).unwrap();

  assert!(s.hierarchy_links_for(a).unwrap().is_empty());
}

#[test]
fn backfill_fills_only_empty_fields() {
  let s = store();
  let mut survivor = NewOrganization::named("A");
  survivor.industry = Some("Software".into());
  let a = s.add_organization(survivor).unwrap().org_id;

  let mut absorbed = NewOrganization::named("B").with_domain("b.com");
  absorbed.industry = Some("Hardware".into());
  absorbed.headquarters = Some("Berlin".into());
  absorbed.founded_year = Some(1999);
  let b = s.add_organization(absorbed).unwrap().org_id;

  let result = s.merge_organizations(a, b, actor()).unwrap();

  let merged = s.get_organization(a).unwrap().unwrap();
  assert_eq!(merged.industry.as_deref(), Some("Software")); // never overwritten
  assert_eq!(merged.domain.as_deref(), Some("b.com"));
  assert_eq!(merged.headquarters.as_deref(), Some("Berlin"));
  assert_eq!(merged.founded_year, Some(1999));
  assert_eq!(result.counts.backfilled_fields, 3);
}

#[test]
fn phone_numbers_deduplicate_by_value() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  s.add_phone(EntityKind::Organization, a, "555-0100", Some("main"))
    .unwrap();
  s.add_phone(EntityKind::Organization, b, "555-0100", Some("office"))
    .unwrap();
  s.add_phone(EntityKind::Organization, b, "555-0199", None).unwrap();

  let result = s.merge_organizations(a, b, actor()).unwrap();

  let mut numbers: Vec<String> = s
    .phones_for(EntityKind::Organization, a)
    .unwrap()
    .into_iter()
    .map(|p| p.number)
    .collect();
  numbers.sort();
  assert_eq!(numbers, vec!["555-0100", "555-0199"]);
  assert_eq!(result.counts.phones.deduplicated, 1);
}

#[test]
fn visibility_grants_copy_only_missing_users() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  let user1 = Uuid::new_v4();
  let user2 = Uuid::new_v4();
  s.add_visibility_grant(user1, EntityKind::Organization, b, "editor", true)
    .unwrap();
  s.add_visibility_grant(user2, EntityKind::Organization, a, "viewer", false)
    .unwrap();
  s.add_visibility_grant(user2, EntityKind::Organization, b, "editor", false)
    .unwrap();

  let result = s.merge_organizations(a, b, actor()).unwrap();
  assert_eq!(result.counts.visibility_grants_copied, 1);

  let grants = s
    .visibility_grants_for(EntityKind::Organization, a)
    .unwrap();
  assert_eq!(grants.len(), 2);
  let copied = grants.iter().find(|g| g.user_id == user1).unwrap();
  assert_eq!(copied.level, "editor");
  assert!(copied.is_owner);
  // user2 keeps the survivor grant untouched.
  let kept = grants.iter().find(|g| g.user_id == user2).unwrap();
  assert_eq!(kept.level, "viewer");
  assert!(
    s.visibility_grants_for(EntityKind::Organization, b)
      .unwrap()
      .is_empty()
  );
}

#[test]
fn scores_discarded_and_enrichment_repointed() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  s.add_computed_score(EntityKind::Organization, b, "strength", 0.7)
    .unwrap();
  s.add_enrichment_run(EntityKind::Organization, b, "clearbit", "done")
    .unwrap();

  let result = s.merge_organizations(a, b, actor()).unwrap();
  assert_eq!(result.counts.scores_discarded, 1);
  assert_eq!(result.counts.enrichment_runs_repointed, 1);

  assert!(
    s.computed_scores_for(EntityKind::Organization, b).unwrap().is_empty()
  );
  assert!(
    s.computed_scores_for(EntityKind::Organization, a).unwrap().is_empty()
  );
  let runs = s.enrichment_runs_for(EntityKind::Organization, a).unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].provider, "clearbit");
}

#[test]
fn audit_chain_repoints_older_survivors() {
  let s = store();
  let a = org(&s, "A", None);
  let b = org(&s, "B", None);
  let c = org(&s, "C", None);

  // C absorbed into B, then B absorbed into A: the first record must now
  // name A as its survivor.
  s.merge_organizations(b, c, actor()).unwrap();
  let second = s.merge_organizations(a, b, actor()).unwrap();
  assert_eq!(second.counts.audit_records_repointed, 1);

  let history = s.merge_history_for(c).unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].survivor_id, a);
  assert_eq!(history[0].absorbed_id, c);
}

#[test]
fn org_merge_validation_errors() {
  let s = store();
  let a = org(&s, "A", None);
  let ghost = Uuid::new_v4();
  let mut inactive = NewOrganization::named("Dead");
  inactive.status = OrgStatus::Inactive;
  let dead = s.add_organization(inactive).unwrap().org_id;

  assert_core_err(
    s.merge_organizations(a, a, actor()).unwrap_err(),
    |e| matches!(e, CoreError::SelfMerge(_)),
  );
  assert_core_err(
    s.merge_organizations(a, ghost, actor()).unwrap_err(),
    |e| matches!(e, CoreError::OrganizationNotFound(id) if *id == ghost),
  );
  assert_core_err(
    s.merge_organizations(a, dead, actor()).unwrap_err(),
    |e| matches!(e, CoreError::OrganizationInactive(id) if *id == dead),
  );

  // Nothing was written by any of the failed attempts.
  assert!(s.merge_history_for(a).unwrap().is_empty());
}

// ─── Person previews & merges ────────────────────────────────────────────────

#[test]
fn person_preview_counts_and_scalar_conflicts() {
  let s = store();
  let acme = org(&s, "Acme", Some("acme.com"));
  let p1 = s
    .add_person(NewPerson { name: Some("Jo".into()), source: Some("crm".into()) })
    .unwrap()
    .person_id;
  let p2 = s
    .add_person(NewPerson {
      name:   Some("Joanna".into()),
      source: Some("crm".into()),
    })
    .unwrap()
    .person_id;

  s.add_affiliation(NewAffiliation::new(p1, acme, "engineer")).unwrap();
  s.add_affiliation(NewAffiliation::new(p2, acme, "engineer")).unwrap();
  s.add_phone(EntityKind::Person, p1, "555-0100", None).unwrap();
  let convo = Uuid::new_v4();
  s.add_conversation_participant(convo, p1).unwrap();
  s.add_conversation_participant(convo, p2).unwrap();

  let preview = s.preview_person_merge(&[p1, p2]).unwrap();
  assert_eq!(preview.members.len(), 2);
  assert_eq!(preview.combined.affiliations, 2);
  assert_eq!(preview.combined.conversations, 2);
  assert_eq!(preview.combined.phones, 1);
  // Same (org, role) on both sides: collapses to one.
  assert_eq!(preview.distinct_affiliations, 1);
  assert_eq!(preview.names, vec!["Jo", "Joanna"]);
  assert_eq!(preview.sources, vec!["crm"]);
}

#[test]
fn person_preview_validation() {
  let s = store();
  let p1 = person(&s, "P1");
  let ghost = Uuid::new_v4();

  assert_core_err(
    s.preview_person_merge(&[p1]).unwrap_err(),
    |e| matches!(e, CoreError::BatchTooSmall(1)),
  );
  assert_core_err(
    s.preview_person_merge(&[p1, p1]).unwrap_err(),
    |e| matches!(e, CoreError::DuplicateBatchId(id) if *id == p1),
  );
  assert_core_err(
    s.preview_person_merge(&[p1, ghost]).unwrap_err(),
    |e| matches!(e, CoreError::PersonNotFound(id) if *id == ghost),
  );
}

#[test]
fn person_batch_merge_moves_everything_and_audits_each() {
  let s = store();
  let acme = org(&s, "Acme", Some("acme.com"));
  let survivor = person(&s, "Jo");
  let p2 = person(&s, "Joanna");
  let p3 = person(&s, "J. Smith");
  let p4 = person(&s, "Josephine");

  s.add_affiliation(NewAffiliation::new(p2, acme, "engineer")).unwrap();
  s.add_identifier(NewIdentifier::new(
    EntityKind::Person,
    p3,
    "linkedin",
    "jo-smith",
  ))
  .unwrap();
  s.add_phone(EntityKind::Person, p4, "555-0100", None).unwrap();
  let convo = Uuid::new_v4();
  s.add_conversation_participant(convo, survivor).unwrap();
  s.add_conversation_participant(convo, p2).unwrap();

  let result = s
    .merge_people(
      survivor,
      &[p2, p3, p4],
      PersonFieldOverrides {
        name:   Some("Jo Smith".into()),
        source: None,
      },
      actor(),
    )
    .unwrap();

  for gone in [p2, p3, p4] {
    assert!(s.get_person(gone).unwrap().is_none());
    assert_eq!(s.merge_history_for(gone).unwrap().len(), 1);
  }
  assert_eq!(s.merge_history_for(survivor).unwrap().len(), 3);

  let merged = s.get_person(survivor).unwrap().unwrap();
  assert_eq!(merged.name.as_deref(), Some("Jo Smith"));

  assert_eq!(result.counts.affiliations.reassigned, 1);
  assert_eq!(result.counts.identifiers.reassigned, 1);
  assert_eq!(result.counts.phones.reassigned, 1);
  // Shared conversation membership collapsed, not duplicated.
  assert_eq!(result.counts.conversations.conflicts_dropped, 1);
  let affs = s.affiliations_for_person(survivor).unwrap();
  assert_eq!(affs.len(), 1);
  assert_eq!(affs[0].org_id, acme);
}

#[test]
fn person_batch_infers_affiliations_from_email_identifiers() {
  let s = store();
  let acme = org(&s, "Acme", Some("acme.com"));
  org(&s, "Public", Some("gmail.com"));
  let survivor = person(&s, "Jo");
  let absorbed = person(&s, "Joanna");
  s.add_identifier(NewIdentifier::new(
    EntityKind::Person,
    absorbed,
    "email",
    "joanna@mail.acme.com",
  ))
  .unwrap();
  s.add_identifier(NewIdentifier::new(
    EntityKind::Person,
    absorbed,
    "email",
    "jo.personal@gmail.com",
  ))
  .unwrap();

  let result = s
    .merge_people(
      survivor,
      &[absorbed],
      PersonFieldOverrides::default(),
      actor(),
    )
    .unwrap();

  assert_eq!(result.counts.affiliations_inferred, 1);
  let affs = s.affiliations_for_person(survivor).unwrap();
  assert_eq!(affs.len(), 1);
  assert_eq!(affs[0].org_id, acme);
  assert_eq!(affs[0].role, "");
  assert!(affs[0].is_current);
}

#[test]
fn person_batch_merge_is_all_or_nothing() {
  let s = store();
  let survivor = person(&s, "Jo");
  let p2 = person(&s, "Joanna");
  let p3 = person(&s, "J. Smith");
  s.add_phone(EntityKind::Person, p2, "555-0100", None).unwrap();
  s.add_phone(EntityKind::Person, p3, "555-0199", None).unwrap();

  // Force a failure while processing the second absorbed id.
  s.conn()
    .execute_batch(&format!(
      "CREATE TRIGGER fail_on_second BEFORE INSERT ON merge_audit
       WHEN NEW.absorbed_id = '{p3}'
       BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
    ))
    .unwrap();

  let err = s
    .merge_people(
      survivor,
      &[p2, p3],
      PersonFieldOverrides::default(),
      actor(),
    )
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  // The first absorbed id's data is untouched: no partial batch.
  assert!(s.get_person(p2).unwrap().is_some());
  assert_eq!(s.phones_for(EntityKind::Person, p2).unwrap().len(), 1);
  assert!(s.phones_for(EntityKind::Person, survivor).unwrap().is_empty());
  assert!(s.merge_history_for(survivor).unwrap().is_empty());
}

#[test]
fn person_merge_validation_errors() {
  let s = store();
  let p1 = person(&s, "P1");
  let p2 = person(&s, "P2");
  let ghost = Uuid::new_v4();

  assert_core_err(
    s.merge_people(p1, &[], PersonFieldOverrides::default(), actor())
      .unwrap_err(),
    |e| matches!(e, CoreError::BatchTooSmall(1)),
  );
  assert_core_err(
    s.merge_people(p1, &[p1], PersonFieldOverrides::default(), actor())
      .unwrap_err(),
    |e| matches!(e, CoreError::SelfMerge(id) if *id == p1),
  );
  assert_core_err(
    s.merge_people(p1, &[p2, p2], PersonFieldOverrides::default(), actor())
      .unwrap_err(),
    |e| matches!(e, CoreError::DuplicateBatchId(id) if *id == p2),
  );
  assert_core_err(
    s.merge_people(p1, &[ghost], PersonFieldOverrides::default(), actor())
      .unwrap_err(),
    |e| matches!(e, CoreError::PersonNotFound(id) if *id == ghost),
  );
}
