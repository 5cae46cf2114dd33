//! # Meta Stats
//!
//! Matchup, card and meta-share statistics for a competitive trading card game.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, deck identities, counters, snapshots)
//! - **reference**: Card and set reference lookups
//! - **normalize**: Deck identity keys
//! - **aggregate**: Matchup matrix, card and leader/base counters, partitioned folding
//! - **snapshot**: Snapshot building, rankings and week-over-week deltas
//! - **query**: Published snapshot store and read-only queries
//! - **storage**: Filesystem data lake operations (JSONL corpus, snapshot files)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod api;
pub mod config;
pub mod models;
pub mod normalize;
pub mod query;
pub mod reference;
pub mod snapshot;
pub mod storage;

pub use models::*;
