//! Error types for `graft-core`.
//!
//! Every variant here is detectable before a merge transaction opens; once
//! a transaction has started, the only remaining failure mode is a backend
//! error, which rolls the whole operation back.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("organization not found: {0}")]
  OrganizationNotFound(Uuid),

  #[error("organization {0} is not active")]
  OrganizationInactive(Uuid),

  #[error("cannot merge an entity into itself: {0}")]
  SelfMerge(Uuid),

  #[error("a batch merge needs at least two ids, got {0}")]
  BatchTooSmall(usize),

  #[error("duplicate id in batch: {0}")]
  DuplicateBatchId(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
