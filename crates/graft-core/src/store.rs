//! The `GraphStore` trait — the engine's produced interface.
//!
//! Implemented by storage backends (e.g. `graft-store-sqlite`). Higher
//! layers depend on this abstraction, not on any concrete backend. The
//! insert/list surface stands in for the out-of-scope ingestion pipeline
//! and is what tests and the CLI use to seed a graph.
//!
//! Everything is synchronous: the engine is single-threaded business logic
//! over a transactional store, and each merge (or batch) runs inside one
//! backend transaction.

use uuid::Uuid;

use crate::{
  audit::{MergeAuditRecord, MergeResult},
  dedupe::DuplicateGroup,
  entity::{
    EntityKind, NewOrganization, NewPerson, Organization, OrganizationSummary,
    Person,
  },
  preview::{OrganizationMergePreview, PersonMergePreview},
  record::{
    Affiliation, ComputedScore, ConversationParticipant, EmailAddress,
    EnrichmentRun, EventAttendance, HierarchyLink, Identifier, NewAffiliation,
    NewIdentifier, NewRelationship, PhoneNumber, PostalAddress, Relationship,
    SocialProfile, VisibilityGrant,
  },
};

/// Caller-chosen winners for scalar conflicts surfaced by a person batch
/// preview. Applied to the survivor after all absorbed ids are processed.
#[derive(Debug, Clone, Default)]
pub struct PersonFieldOverrides {
  pub name:   Option<String>,
  pub source: Option<String>,
}

/// Abstraction over a Graft storage backend.
pub trait GraphStore {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  fn add_person(&self, new: NewPerson) -> Result<Person, Self::Error>;

  fn add_organization(
    &self,
    new: NewOrganization,
  ) -> Result<Organization, Self::Error>;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(&self, id: Uuid) -> Result<Option<Person>, Self::Error>;

  /// Retrieve an organization by id. Returns `None` if not found.
  fn get_organization(
    &self,
    id: Uuid,
  ) -> Result<Option<Organization>, Self::Error>;

  // ── Child records (ingestion surface) ─────────────────────────────────

  fn add_identifier(
    &self,
    new: NewIdentifier,
  ) -> Result<Identifier, Self::Error>;

  fn add_affiliation(
    &self,
    new: NewAffiliation,
  ) -> Result<Affiliation, Self::Error>;

  /// Insert a relationship edge; with `symmetric` set, also insert the
  /// reverse edge and cross-link the two rows via `pair_id`.
  fn add_relationship(
    &self,
    new: NewRelationship,
  ) -> Result<Relationship, Self::Error>;

  fn add_hierarchy_link(
    &self,
    parent_id: Uuid,
    child_id: Uuid,
    link_type: &str,
  ) -> Result<HierarchyLink, Self::Error>;

  fn add_event_attendance(
    &self,
    event_id: Uuid,
    entity_kind: EntityKind,
    entity_id: Uuid,
    role: Option<&str>,
  ) -> Result<EventAttendance, Self::Error>;

  fn add_conversation_participant(
    &self,
    conversation_id: Uuid,
    person_id: Uuid,
  ) -> Result<ConversationParticipant, Self::Error>;

  fn add_phone(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    number: &str,
    label: Option<&str>,
  ) -> Result<PhoneNumber, Self::Error>;

  fn add_address(
    &self,
    address: PostalAddress,
  ) -> Result<PostalAddress, Self::Error>;

  fn add_email(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    address: &str,
    label: Option<&str>,
  ) -> Result<EmailAddress, Self::Error>;

  fn add_social_profile(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    platform: &str,
    url: &str,
  ) -> Result<SocialProfile, Self::Error>;

  fn add_visibility_grant(
    &self,
    user_id: Uuid,
    entity_kind: EntityKind,
    entity_id: Uuid,
    level: &str,
    is_owner: bool,
  ) -> Result<VisibilityGrant, Self::Error>;

  fn add_computed_score(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    score_type: &str,
    value: f64,
  ) -> Result<ComputedScore, Self::Error>;

  fn add_enrichment_run(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
    provider: &str,
    status: &str,
  ) -> Result<EnrichmentRun, Self::Error>;

  // ── Child-record reads ────────────────────────────────────────────────

  fn identifiers_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<Identifier>, Self::Error>;

  fn affiliations_for_person(
    &self,
    person_id: Uuid,
  ) -> Result<Vec<Affiliation>, Self::Error>;

  /// Relationships where the entity is either endpoint.
  fn relationships_for(
    &self,
    entity_id: Uuid,
  ) -> Result<Vec<Relationship>, Self::Error>;

  /// Hierarchy links where the organization is parent or child.
  fn hierarchy_links_for(
    &self,
    org_id: Uuid,
  ) -> Result<Vec<HierarchyLink>, Self::Error>;

  fn phones_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<PhoneNumber>, Self::Error>;

  fn visibility_grants_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<VisibilityGrant>, Self::Error>;

  fn computed_scores_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<ComputedScore>, Self::Error>;

  fn enrichment_runs_for(
    &self,
    entity_kind: EntityKind,
    entity_id: Uuid,
  ) -> Result<Vec<EnrichmentRun>, Self::Error>;

  // ── Duplicate detection ───────────────────────────────────────────────

  /// Every active organization whose own domain field or any domain-type
  /// identifier normalizes to the given raw value. Empty or
  /// public-provider input yields no results.
  fn find_organizations_by_domain(
    &self,
    raw: &str,
  ) -> Result<Vec<OrganizationSummary>, Self::Error>;

  /// Scan all active organizations and group them by normalized domain.
  /// Groups of one are dropped; ordering is size-descending then
  /// domain-ascending.
  fn detect_duplicate_organizations(
    &self,
  ) -> Result<Vec<DuplicateGroup>, Self::Error>;

  // ── Previews (read-only) ──────────────────────────────────────────────

  fn preview_organization_merge(
    &self,
    survivor_id: Uuid,
    absorbed_id: Uuid,
  ) -> Result<OrganizationMergePreview, Self::Error>;

  fn preview_person_merge(
    &self,
    ids: &[Uuid],
  ) -> Result<PersonMergePreview, Self::Error>;

  // ── Merges ────────────────────────────────────────────────────────────

  /// Merge one organization into another. Both must exist and be active;
  /// survivor and absorbed must differ. Fully transactional: either every
  /// step commits or none does.
  fn merge_organizations(
    &self,
    survivor_id: Uuid,
    absorbed_id: Uuid,
    actor_id: Uuid,
  ) -> Result<MergeResult, Self::Error>;

  /// Merge a batch of people into one survivor inside a single
  /// transaction. Each absorbed id produces its own audit record; the
  /// batch is all-or-nothing.
  fn merge_people(
    &self,
    survivor_id: Uuid,
    absorbed_ids: &[Uuid],
    overrides: PersonFieldOverrides,
    actor_id: Uuid,
  ) -> Result<MergeResult, Self::Error>;

  // ── Audit log ─────────────────────────────────────────────────────────

  /// Merge records where the entity is survivor or absorbed, newest first.
  fn merge_history_for(
    &self,
    entity_id: Uuid,
  ) -> Result<Vec<MergeAuditRecord>, Self::Error>;
}
