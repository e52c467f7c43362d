//! Core types and trait definitions for the Graft entity merge engine.
//!
//! This crate is deliberately free of database dependencies. It holds the
//! domain model, the error taxonomy, the [`store::GraphStore`] trait that
//! backends implement, and the pure pieces of the engine: domain
//! normalization, duplicate grouping, and preview rollup math.

pub mod audit;
pub mod dedupe;
pub mod domain;
pub mod entity;
pub mod error;
pub mod preview;
pub mod record;
pub mod store;

pub use error::{Error, Result};
