//! Deterministic standings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{CardMatchupStat, Standing, Tier};

/// What standings are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    #[default]
    WinRate,
    MetaShare,
}

/// One subject to be ranked.
#[derive(Debug, Clone)]
pub struct RankInput {
    pub key: String,
    pub stat: CardMatchupStat,
    pub appearances: u64,
}

/// Rank subjects, 1-indexed.
///
/// Order: qualified entries first, then the metric descending, then total
/// matches descending, then key ascending. The same input always yields the
/// same placements.
pub fn rank(
    inputs: Vec<RankInput>,
    total_appearances: u64,
    metric: RankingMetric,
    min_matches: u64,
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = inputs
        .into_iter()
        .map(|input| {
            let win_rate = input.stat.match_win_rate();
            let meta_share = if total_appearances == 0 {
                0.0
            } else {
                input.appearances as f64 / total_appearances as f64
            };
            Standing {
                placement: 0,
                qualified: input.stat.total_matches() >= min_matches,
                tier: Tier::from_win_rate(win_rate),
                key: input.key,
                stat: input.stat,
                appearances: input.appearances,
                win_rate,
                meta_share,
            }
        })
        .collect();

    standings.sort_by(|a, b| compare(a, b, metric));
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.placement = i as u32 + 1;
    }
    standings
}

fn compare(a: &Standing, b: &Standing, metric: RankingMetric) -> Ordering {
    let value = |s: &Standing| match metric {
        RankingMetric::WinRate => s.win_rate,
        RankingMetric::MetaShare => s.meta_share,
    };
    b.qualified
        .cmp(&a.qualified)
        .then_with(|| value(b).total_cmp(&value(a)))
        .then_with(|| b.stat.total_matches().cmp(&a.stat.total_matches()))
        .then_with(|| a.key.cmp(&b.key))
}
