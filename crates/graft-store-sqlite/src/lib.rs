//! SQLite backend for the Graft entity merge engine.
//!
//! A single synchronous connection behind a mutex; every merge (or person
//! batch) runs inside one `rusqlite` transaction, which is the atomicity
//! guarantee the engine relies on: any failure after validation rolls the
//! whole operation back.

mod encode;
mod merge;
mod queries;
mod reassign;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
