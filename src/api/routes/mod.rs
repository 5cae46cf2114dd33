pub mod cards;
pub mod health;
pub mod leaders;
pub mod matchups;
pub mod snapshots;
