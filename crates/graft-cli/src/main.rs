//! `graft` — command-line front end for the entity merge engine.
//!
//! Opens a SQLite graph store and exposes duplicate detection, merge
//! previews, merge execution and audit history as subcommands. All output
//! is pretty-printed JSON, suitable for piping into `jq`.
//!
//! # Usage
//!
//! ```
//! graft --db contacts.db dupes
//! graft --db contacts.db preview-org <SURVIVOR> <ABSORBED>
//! graft --db contacts.db merge-people <SURVIVOR> <ABSORBED>... --name "Jo Smith"
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use graft_core::{
  entity::{NewOrganization, NewPerson},
  store::{GraphStore, PersonFieldOverrides},
};
use graft_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "graft", about = "Entity merge & deduplication engine")]
struct Cli {
  /// Path to the SQLite database file.
  #[arg(long, env = "GRAFT_DB", default_value = "graft.db")]
  db: PathBuf,

  /// Acting user recorded in merge audit records.
  #[arg(long, env = "GRAFT_ACTOR")]
  actor: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Scan all active organizations and list duplicate groups by domain.
  Dupes,

  /// List active organizations matching a domain (field or identifier).
  FindDomain {
    /// Raw domain input; normalized before matching.
    domain: String,
  },

  /// Preview what merging one organization into another would touch.
  PreviewOrg {
    survivor: Uuid,
    absorbed: Uuid,
  },

  /// Preview a person batch merge (two or more ids).
  PreviewPeople {
    #[arg(required = true, num_args = 2..)]
    ids: Vec<Uuid>,
  },

  /// Merge one organization into another.
  MergeOrg {
    survivor: Uuid,
    absorbed: Uuid,
  },

  /// Merge one or more people into a surviving person.
  MergePeople {
    survivor: Uuid,
    #[arg(required = true)]
    absorbed: Vec<Uuid>,

    /// Winning name for the surviving record.
    #[arg(long)]
    name: Option<String>,

    /// Winning source for the surviving record.
    #[arg(long)]
    source: Option<String>,
  },

  /// Show merge audit records involving an entity, newest first.
  History { id: Uuid },

  /// Insert a person (seeding helper; ingestion is out of scope).
  AddPerson {
    #[arg(long)]
    name:   Option<String>,
    #[arg(long)]
    source: Option<String>,
  },

  /// Insert an organization (seeding helper).
  AddOrg {
    #[arg(long)]
    name:   Option<String>,
    #[arg(long)]
    domain: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let store = SqliteStore::open(&cli.db)
    .with_context(|| format!("failed to open store at {:?}", cli.db))?;
  // Merges are attributed to the nil actor unless one is given.
  let actor = cli.actor.unwrap_or(Uuid::nil());

  match cli.command {
    Command::Dupes => {
      let groups = store
        .detect_duplicate_organizations()
        .context("duplicate scan failed")?;
      print_json(&groups)
    }
    Command::FindDomain { domain } => {
      let orgs = store
        .find_organizations_by_domain(&domain)
        .context("domain lookup failed")?;
      print_json(&orgs)
    }
    Command::PreviewOrg { survivor, absorbed } => {
      let preview = store
        .preview_organization_merge(survivor, absorbed)
        .context("organization preview failed")?;
      print_json(&preview)
    }
    Command::PreviewPeople { ids } => {
      let preview = store
        .preview_person_merge(&ids)
        .context("person preview failed")?;
      print_json(&preview)
    }
    Command::MergeOrg { survivor, absorbed } => {
      let result = store
        .merge_organizations(survivor, absorbed, actor)
        .context("organization merge failed")?;
      print_json(&result)
    }
    Command::MergePeople { survivor, absorbed, name, source } => {
      let result = store
        .merge_people(
          survivor,
          &absorbed,
          PersonFieldOverrides { name, source },
          actor,
        )
        .context("person merge failed")?;
      print_json(&result)
    }
    Command::History { id } => {
      let records = store
        .merge_history_for(id)
        .context("audit lookup failed")?;
      print_json(&records)
    }
    Command::AddPerson { name, source } => {
      let person = store
        .add_person(NewPerson { name, source })
        .context("insert failed")?;
      print_json(&person)
    }
    Command::AddOrg { name, domain } => {
      let org = store
        .add_organization(NewOrganization {
          name,
          domain,
          ..NewOrganization::default()
        })
        .context("insert failed")?;
      print_json(&org)
    }
  }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!(
    "{}",
    serde_json::to_string_pretty(value).context("serialising output")?
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn db_flag_parses() {
    let matches = Cli::command()
      .get_matches_from(["graft", "--db", "/tmp/x.db", "dupes"]);
    assert_eq!(
      matches.get_one::<PathBuf>("db").map(|p| p.display().to_string()),
      Some("/tmp/x.db".to_owned())
    );
  }
}
