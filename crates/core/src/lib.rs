//! Retail Agents Core - query, aggregation and classification types.
//!
//! This crate holds everything the retail search tools compute without
//! touching the network:
//! - [`query`] - typed clauses composed into a search request body
//! - [`aggregation`] - aggregation requests and decoding of bucketed responses
//! - [`classify`] - stock status, alert severity, readiness and share ratios
//! - [`envelope`] - the `{ok, data, error}` wrapper every tool returns
//! - [`fields`] - per-domain field-name tables
//! - [`hit`] - parsed hits and search results
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O and no HTTP
//! client. The `retail-agents-tools` crate drives these against a live
//! cluster.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregation;
pub mod classify;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod hit;
pub mod query;

pub use envelope::{ErrorInfo, ErrorKind, ResultEnvelope};
pub use error::{DecodeError, ValidationError};
pub use fields::FieldTables;
pub use hit::{HitRecord, SearchResult};
