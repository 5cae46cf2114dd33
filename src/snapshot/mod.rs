//! Point-in-time meta snapshots.
//!
//! A snapshot is built once from a scoped corpus and never mutated
//! afterwards. Week-over-week deltas are computed by comparing two
//! snapshots of the same scope; they are never stored as primary data.

mod builder;
mod delta;
mod ranking;

pub use builder::*;
pub use delta::*;
pub use ranking::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{
    CardStatLine, CardStatsTable, Diagnostics, LeaderBaseStats, MatchupMatrix, SubjectStats,
};
use crate::models::{
    CardMatchupStat, DeckIdentity, DeltaOutcome, MirrorPolicy, SetShare, SnapshotId,
    SnapshotScope, Standing,
};

/// Immutable aggregate summary of one scope at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSnapshot {
    pub id: SnapshotId,
    pub scope: SnapshotScope,
    pub generated_at: DateTime<Utc>,

    /// Matches folded into the counters
    pub match_count: u64,
    /// Matches skipped as malformed
    pub skipped_count: u64,

    pub mirror_policy: MirrorPolicy,
    pub ranking_metric: RankingMetric,

    pub matchup_matrix: MatchupMatrix,
    pub card_stats: CardStatsTable,
    pub leader_base_stats: LeaderBaseStats,

    pub set_share: SetShare,
    pub block_share: SetShare,

    pub deck_standings: Vec<Standing>,
    pub leader_standings: Vec<Standing>,
    pub base_standings: Vec<Standing>,
}

impl MetaSnapshot {
    pub fn matchup_cell(&self, a: &DeckIdentity, b: &DeckIdentity) -> Option<&CardMatchupStat> {
        self.matchup_matrix.cell(a, b)
    }

    pub fn matchup_cell_by_key(&self, a: &str, b: &str) -> Option<&CardMatchupStat> {
        self.matchup_matrix.cell_by_key(a, b)
    }

    /// Aggregate record of a card, leader or base.
    ///
    /// Play-log card stats come first. Otherwise a leader id, then a base key,
    /// resolves to that subject's overall record. Basic bases aggregate under
    /// their aspect, so only unique bases answer to their card id.
    pub fn card_stats(&self, id: &str) -> Option<&CardMatchupStat> {
        self.card_stats
            .get(id)
            .map(|line| &line.stat)
            .or_else(|| self.subject(id).map(|stats| &stats.overall))
    }

    /// Full stat line behind [`MetaSnapshot::card_stats`]. Leader and base
    /// lines carry no play count.
    pub fn card_line(&self, id: &str) -> Option<CardStatLine> {
        if let Some(line) = self.card_stats.get(id) {
            return Some(line.clone());
        }
        self.subject(id).map(|stats| CardStatLine {
            stat: stats.overall,
            plays: 0,
            by_opponent: stats.by_opponent.clone(),
        })
    }

    fn subject(&self, id: &str) -> Option<&SubjectStats> {
        if id.is_empty() {
            return None;
        }
        self.leader(id).or_else(|| self.base(id))
    }

    pub fn leader(&self, leader_id: &str) -> Option<&SubjectStats> {
        self.leader_base_stats.leader(leader_id)
    }

    pub fn base(&self, base_key: &str) -> Option<&SubjectStats> {
        self.leader_base_stats.base(base_key)
    }

    pub fn deck_standing(&self, key: &str) -> Option<&Standing> {
        self.deck_standings.iter().find(|s| s.key == key)
    }
}

/// Output of one snapshot build.
#[derive(Debug, Clone)]
pub struct SnapshotBuild {
    pub snapshot: MetaSnapshot,
    pub delta: DeltaOutcome,
    pub diagnostics: Diagnostics,
}
