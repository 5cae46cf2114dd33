//! Snapshot scope, share distributions, standings and week-over-week deltas.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CardMatchupStat, EntityId, MatchResult, SnapshotId, Tier, TournamentId};

const WINDOW_KEY_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// What part of the corpus a snapshot covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotScope {
    Global,
    Tournament {
        id: TournamentId,
    },
    /// Half-open window `[from, to)` on match timestamps
    Window {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl SnapshotScope {
    /// Stable key for storage paths and lookups.
    pub fn key(&self) -> String {
        match self {
            SnapshotScope::Global => "global".to_string(),
            SnapshotScope::Tournament { id } => format!("tournament-{}", id),
            SnapshotScope::Window { from, to } => format!(
                "window-{}-{}",
                from.format(WINDOW_KEY_FORMAT),
                to.format(WINDOW_KEY_FORMAT)
            ),
        }
    }

    /// Parse a key produced by [`SnapshotScope::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "global" {
            return Some(SnapshotScope::Global);
        }
        if let Some(id) = key.strip_prefix("tournament-") {
            if id.is_empty() {
                return None;
            }
            return Some(SnapshotScope::Tournament {
                id: EntityId::from(id),
            });
        }
        let rest = key.strip_prefix("window-")?;
        let (from, to) = rest.split_once('-')?;
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, WINDOW_KEY_FORMAT)
                .ok()
                .map(|dt| dt.and_utc())
        };
        Some(SnapshotScope::Window {
            from: parse(from)?,
            to: parse(to)?,
        })
    }

    /// Whether a match belongs to this scope.
    pub fn contains(&self, m: &MatchResult) -> bool {
        match self {
            SnapshotScope::Global => true,
            SnapshotScope::Tournament { id } => m.tournament_id.as_ref() == Some(id),
            SnapshotScope::Window { from, to } => m.played_at >= *from && m.played_at < *to,
        }
    }
}

impl std::fmt::Display for SnapshotScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One bucket of a share distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntry {
    pub key: String,
    pub count: u64,
    /// Share of all deck appearances, in percent
    pub percentage: f64,
}

/// Distribution of deck appearances by set or rotation block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetShare {
    pub total: u64,
    /// Sorted by count descending, then key ascending
    pub entries: Vec<ShareEntry>,
}

impl SetShare {
    pub fn from_counts(counts: &BTreeMap<String, u64>) -> Self {
        let total: u64 = counts.values().sum();
        let mut entries: Vec<ShareEntry> = counts
            .iter()
            .map(|(key, &count)| ShareEntry {
                key: key.clone(),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                },
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Self { total, entries }
    }

    pub fn get(&self, key: &str) -> Option<&ShareEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Percentage for a key, zero when absent.
    pub fn percentage_of(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, |e| e.percentage)
    }
}

/// A ranked entry (deck identity, leader or base) in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 1-indexed rank
    pub placement: u32,
    pub key: String,
    pub stat: CardMatchupStat,
    pub appearances: u64,
    pub win_rate: f64,
    pub meta_share: f64,
    pub tier: Tier,
    /// Whether the entry met the minimum match count for ranking
    pub qualified: bool,
}

/// Direction of a placement change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Improved,
    Worse,
    Unchanged,
}

impl ArrowDirection {
    /// Lower placement numbers are better.
    pub fn between(placement_before: u32, placement_now: u32) -> Self {
        match placement_now.cmp(&placement_before) {
            std::cmp::Ordering::Less => ArrowDirection::Improved,
            std::cmp::Ordering::Greater => ArrowDirection::Worse,
            std::cmp::Ordering::Equal => ArrowDirection::Unchanged,
        }
    }
}

impl std::fmt::Display for ArrowDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrowDirection::Improved => write!(f, "improved"),
            ArrowDirection::Worse => write!(f, "worse"),
            ArrowDirection::Unchanged => write!(f, "unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDelta {
    pub key: String,
    pub placement_now: u32,
    pub placement_before: u32,
    pub arrow_direction: ArrowDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDelta {
    pub key: String,
    pub share_now: f64,
    pub share_before: f64,
    /// Percentage points
    pub delta: f64,
}

/// Differences between a snapshot and an earlier one of the same scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDelta {
    pub previous_id: SnapshotId,
    pub previous_generated_at: DateTime<Utc>,
    pub decks: Vec<PlacementDelta>,
    pub leaders: Vec<PlacementDelta>,
    pub set_share: Vec<ShareDelta>,
    pub block_share: Vec<ShareDelta>,
}

/// Result of comparing a snapshot against a previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeltaOutcome {
    NoPrevious,
    NoComparableSnapshot { expected: String, found: String },
    Computed(SnapshotDelta),
}

impl DeltaOutcome {
    pub fn computed(&self) -> Option<&SnapshotDelta> {
        match self {
            DeltaOutcome::Computed(delta) => Some(delta),
            _ => None,
        }
    }
}
