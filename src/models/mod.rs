//! Core data models for the aggregation engine.

mod identity;
mod ids;
mod matches;
mod snapshot;
mod stats;

pub use identity::*;
pub use ids::*;
pub use matches::*;
pub use snapshot::*;
pub use stats::*;
