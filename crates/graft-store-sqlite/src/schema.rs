//! SQL schema for the Graft SQLite store.
//!
//! Executed once at connection startup. UNIQUE indexes encode each
//! category's natural key; the merge executor deletes conflicting rows
//! before any re-point, so these constraints are a backstop, never an
//! expected failure path.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id  TEXT PRIMARY KEY,
    name       TEXT,
    source     TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organizations (
    org_id         TEXT PRIMARY KEY,
    name           TEXT,
    domain         TEXT,
    website        TEXT,
    industry       TEXT,
    description    TEXT,
    size           TEXT,
    employee_count INTEGER,
    founded_year   INTEGER,
    revenue_range  TEXT,
    funding_total  INTEGER,
    funding_stage  TEXT,
    headquarters   TEXT,
    status         TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'inactive'
    created_at     TEXT NOT NULL
);

-- Natural key (entity_kind, id_type, value) is global per kind: two
-- organizations can never register the same domain identifier.
CREATE TABLE IF NOT EXISTS identifiers (
    identifier_id TEXT PRIMARY KEY,
    entity_kind   TEXT NOT NULL,   -- 'person' | 'organization'
    entity_id     TEXT NOT NULL,
    id_type       TEXT NOT NULL,   -- 'domain', 'email', ...
    value         TEXT NOT NULL,
    is_primary    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (entity_kind, id_type, value)
);

-- role is NOT NULL DEFAULT '' so the natural key stays well-defined:
-- SQLite unique indexes treat NULLs as distinct.
CREATE TABLE IF NOT EXISTS affiliations (
    affiliation_id  TEXT PRIMARY KEY,
    person_id       TEXT NOT NULL REFERENCES persons(person_id),
    org_id          TEXT NOT NULL REFERENCES organizations(org_id),
    role            TEXT NOT NULL DEFAULT '',
    title           TEXT,
    is_primary      INTEGER NOT NULL DEFAULT 0,
    is_current      INTEGER NOT NULL DEFAULT 1,
    effective_start TEXT,
    effective_end   TEXT,
    UNIQUE (person_id, org_id, role, effective_start)
);

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id TEXT PRIMARY KEY,
    from_kind       TEXT NOT NULL,
    from_id         TEXT NOT NULL,
    to_kind         TEXT NOT NULL,
    to_id           TEXT NOT NULL,
    rel_type        TEXT NOT NULL,
    pair_id         TEXT,            -- twin row of a symmetric relationship
    UNIQUE (from_id, to_id, rel_type),
    CHECK  (from_id != to_id)
);

CREATE TABLE IF NOT EXISTS hierarchy_links (
    link_id   TEXT PRIMARY KEY,
    parent_id TEXT NOT NULL REFERENCES organizations(org_id),
    child_id  TEXT NOT NULL REFERENCES organizations(org_id),
    link_type TEXT NOT NULL,
    UNIQUE (parent_id, child_id, link_type),
    CHECK  (parent_id != child_id)
);

CREATE TABLE IF NOT EXISTS event_attendance (
    attendance_id TEXT PRIMARY KEY,
    event_id      TEXT NOT NULL,
    entity_kind   TEXT NOT NULL,
    entity_id     TEXT NOT NULL,
    role          TEXT,
    UNIQUE (event_id, entity_kind, entity_id)
);

CREATE TABLE IF NOT EXISTS conversation_participants (
    participant_id  TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    person_id       TEXT NOT NULL REFERENCES persons(person_id),
    UNIQUE (conversation_id, person_id)
);

-- No unique index: value-identical numbers under one owner are collapsed
-- by the merge executor's dedupe step, earliest created_at winning.
CREATE TABLE IF NOT EXISTS phone_numbers (
    phone_id    TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    number      TEXT NOT NULL,
    label       TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS postal_addresses (
    address_id  TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    street      TEXT,
    city        TEXT,
    region      TEXT,
    postal_code TEXT,
    country     TEXT
);

CREATE TABLE IF NOT EXISTS email_addresses (
    email_id    TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    address     TEXT NOT NULL,
    label       TEXT
);

CREATE TABLE IF NOT EXISTS social_profiles (
    profile_id  TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    platform    TEXT NOT NULL,
    url         TEXT NOT NULL,
    UNIQUE (entity_kind, entity_id, platform, url)
);

CREATE TABLE IF NOT EXISTS visibility_grants (
    grant_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    level       TEXT NOT NULL,
    is_owner    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user_id, entity_kind, entity_id)
);

CREATE TABLE IF NOT EXISTS computed_scores (
    score_id    TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    score_type  TEXT NOT NULL,
    value       REAL NOT NULL,
    computed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS enrichment_runs (
    run_id      TEXT PRIMARY KEY,
    entity_kind TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    provider    TEXT NOT NULL,
    status      TEXT NOT NULL,
    run_at      TEXT NOT NULL
);

-- Append-only, written exclusively by the merge executor. The sole
-- permitted mutation is re-pointing survivor_id when a past survivor is
-- itself absorbed by a later merge.
CREATE TABLE IF NOT EXISTS merge_audit (
    audit_id      TEXT PRIMARY KEY,
    survivor_id   TEXT NOT NULL,
    absorbed_id   TEXT NOT NULL,
    entity_kind   TEXT NOT NULL,
    snapshot_json TEXT NOT NULL,
    counts_json   TEXT NOT NULL,
    actor_id      TEXT NOT NULL,
    merged_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS identifiers_owner_idx
    ON identifiers(entity_kind, entity_id);
CREATE INDEX IF NOT EXISTS affiliations_person_idx ON affiliations(person_id);
CREATE INDEX IF NOT EXISTS affiliations_org_idx    ON affiliations(org_id);
CREATE INDEX IF NOT EXISTS relationships_from_idx  ON relationships(from_id);
CREATE INDEX IF NOT EXISTS relationships_to_idx    ON relationships(to_id);
CREATE INDEX IF NOT EXISTS phones_owner_idx
    ON phone_numbers(entity_kind, entity_id);
CREATE INDEX IF NOT EXISTS merge_audit_survivor_idx ON merge_audit(survivor_id);
CREATE INDEX IF NOT EXISTS merge_audit_absorbed_idx ON merge_audit(absorbed_id);

PRAGMA user_version = 1;
";
