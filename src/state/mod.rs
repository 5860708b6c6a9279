//! State module for tracking ingestion progress
//!
//! Every ingestion walks `Pending -> Fetched -> Sanitized -> Extracted -> Stored -> Indexed`
//! and ends in one of three terminal states. HTML handed in directly starts
//! at `Fetched`.
//!
//! - `Indexed`: stored and searchable
//! - `Degraded`: stored but not searchable until the next rebuild
//! - `Failed`: nothing was stored

mod ingest_state;

pub use ingest_state::{IngestState, IngestTracker};
