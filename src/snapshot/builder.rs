//! Snapshot building over a scoped corpus.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

use super::{compare_snapshots, rank, MetaSnapshot, RankInput, SnapshotBuild};
use crate::aggregate::{fold_corpus, AggregateTables, Diagnostics};
use crate::config::AggregationConfig;
use crate::models::{
    CardMatchupStat, DeltaOutcome, EntityId, MatchResult, SetShare, SnapshotScope,
};
use crate::reference::CardReference;

/// Builds [`MetaSnapshot`]s. Holds configuration only; every build starts
/// from empty counters, so scopes never leak into each other.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    config: AggregationConfig,
}

impl SnapshotBuilder {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Build a snapshot stamped with the current time.
    pub fn build(
        &self,
        scope: SnapshotScope,
        corpus: &[MatchResult],
        reference: &dyn CardReference,
        previous: Option<&MetaSnapshot>,
    ) -> SnapshotBuild {
        self.build_at(scope, corpus, reference, previous, Utc::now())
    }

    /// Build a snapshot with an explicit generation time. The same corpus,
    /// scope and time always produce an identical snapshot.
    pub fn build_at(
        &self,
        scope: SnapshotScope,
        corpus: &[MatchResult],
        reference: &dyn CardReference,
        previous: Option<&MetaSnapshot>,
        generated_at: DateTime<Utc>,
    ) -> SnapshotBuild {
        let in_scope: Vec<&MatchResult> = corpus.iter().filter(|m| scope.contains(m)).collect();
        info!(
            "Building {} snapshot from {} of {} matches",
            scope,
            in_scope.len(),
            corpus.len()
        );

        let tables = fold_corpus(
            &in_scope,
            reference,
            self.config.mirror_policy,
            self.config.partitions,
        );

        let (snapshot, diagnostics) = self.assemble(scope, tables, generated_at);
        let delta = match previous {
            Some(previous) => compare_snapshots(previous, &snapshot),
            None => DeltaOutcome::NoPrevious,
        };

        info!(
            "Snapshot {} ({}): {} matches folded, {} skipped, {} decks, {} cards",
            snapshot.id,
            snapshot.scope,
            snapshot.match_count,
            snapshot.skipped_count,
            snapshot.deck_standings.len(),
            snapshot.card_stats.len()
        );

        SnapshotBuild {
            snapshot,
            delta,
            diagnostics,
        }
    }

    fn assemble(
        &self,
        scope: SnapshotScope,
        tables: AggregateTables,
        generated_at: DateTime<Utc>,
    ) -> (MetaSnapshot, Diagnostics) {
        let AggregateTables {
            matrix,
            cards,
            leader_base,
            appearances,
            diagnostics,
            matches_folded,
        } = tables;

        let metric = self.config.ranking_metric;
        let min_matches = self.config.min_matches_for_ranking;

        let deck_inputs = appearances
            .decks
            .iter()
            .map(|(key, &count)| RankInput {
                key: key.clone(),
                stat: matrix.record_for(key),
                appearances: count,
            })
            .collect();

        let leader_inputs = subject_inputs(&appearances.leaders, |k| {
            leader_base.leader(k).map(|s| s.overall)
        });
        let base_inputs = subject_inputs(&appearances.bases, |k| {
            leader_base.base(k).map(|s| s.overall)
        });

        let id = EntityId::generate(&[&scope.key(), &generated_at.to_rfc3339()]);

        let snapshot = MetaSnapshot {
            id,
            scope,
            generated_at,
            match_count: matches_folded,
            skipped_count: diagnostics.skipped.len() as u64,
            mirror_policy: self.config.mirror_policy,
            ranking_metric: metric,
            deck_standings: rank(deck_inputs, appearances.total, metric, min_matches),
            leader_standings: rank(leader_inputs, appearances.total, metric, min_matches),
            base_standings: rank(base_inputs, appearances.total, metric, min_matches),
            set_share: SetShare::from_counts(&appearances.sets),
            block_share: SetShare::from_counts(&appearances.blocks),
            matchup_matrix: matrix,
            card_stats: cards,
            leader_base_stats: leader_base,
        };
        (snapshot, diagnostics)
    }
}

fn subject_inputs<F>(counts: &BTreeMap<String, u64>, lookup: F) -> Vec<RankInput>
where
    F: Fn(&str) -> Option<CardMatchupStat>,
{
    counts
        .iter()
        .map(|(key, &count)| RankInput {
            key: key.clone(),
            stat: lookup(key).unwrap_or_default(),
            appearances: count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::models::{ArrowDirection, Decision, MirrorPolicy};
    use crate::normalize::normalize_deck;
    use crate::snapshot::RankingMetric;
    use pretty_assertions::assert_eq;

    fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new(AggregationConfig::default())
    }

    fn generated(day: u32) -> DateTime<Utc> {
        format!("2026-03-{:02}T00:00:00Z", day).parse().unwrap()
    }

    #[test]
    fn test_build_reference_scenario() {
        let t = table();
        let build = builder().build_at(SnapshotScope::Global, &scenario(), &t, None, generated(9));
        let snapshot = &build.snapshot;

        assert_eq!(build.delta, DeltaOutcome::NoPrevious);
        assert!(build.diagnostics.skipped.is_empty());
        assert_eq!(snapshot.match_count, 3);

        let x = normalize_deck(&deck_x(), &t).unwrap();
        let y = normalize_deck(&deck_y(), &t).unwrap();
        let xy = snapshot.matchup_cell(&x, &y).unwrap();
        assert_eq!((xy.match_wins, xy.match_losses), (1, 1));
        assert_eq!(snapshot.matchup_cell(&x, &x).unwrap().total, 3);

        // X and Y are both 1-1 outside the mirror; the tie falls back to key order
        let keys: Vec<&str> = snapshot.deck_standings.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec![y.key().as_str(), x.key().as_str()]);

        // X appeared four times (twice in the mirror), Y twice
        assert_eq!(snapshot.deck_standing(&x.key()).unwrap().appearances, 4);
        assert_eq!(snapshot.set_share.total, 6);
        assert_eq!(snapshot.set_share.get("SOR").unwrap().count, 4);
        assert_eq!(snapshot.block_share.get("block-1").unwrap().count, 6);
    }

    #[test]
    fn test_build_is_idempotent() {
        let t = table();
        let corpus = scenario();
        let first = builder().build_at(SnapshotScope::Global, &corpus, &t, None, generated(9));
        let second = builder().build_at(SnapshotScope::Global, &corpus, &t, None, generated(9));
        assert_eq!(first.snapshot, second.snapshot);
    }

    #[test]
    fn test_partitioned_build_matches_sequential() {
        let t = table();
        let corpus: Vec<MatchResult> = (0..30)
            .map(|i| {
                let (a, b) = if i % 2 == 0 {
                    (deck_x(), deck_z())
                } else {
                    (deck_y(), deck_x_prime())
                };
                let winner = if i % 3 == 0 { Decision::SideA } else { Decision::SideB };
                played(&format!("m{}", i), a, b, &[winner, winner], i)
            })
            .collect();

        let sequential = builder().build_at(SnapshotScope::Global, &corpus, &t, None, generated(9));
        let parallel = SnapshotBuilder::new(AggregationConfig {
            partitions: 3,
            ..Default::default()
        })
        .build_at(SnapshotScope::Global, &corpus, &t, None, generated(9));

        assert_eq!(sequential.snapshot, parallel.snapshot);
    }

    #[test]
    fn test_scopes_do_not_leak() {
        let t = table();
        let mut corpus = scenario();
        corpus[0] = corpus[0].clone().in_tournament("spring-open", 1);
        corpus[1] = corpus[1].clone().in_tournament("spring-open", 2);
        corpus[2] = corpus[2].clone().in_tournament("summer-open", 1);

        let spring = builder().build_at(
            SnapshotScope::Tournament {
                id: "spring-open".into(),
            },
            &corpus,
            &t,
            None,
            generated(9),
        );
        assert_eq!(spring.snapshot.match_count, 2);
        let x = normalize_deck(&deck_x(), &t).unwrap();
        assert!(spring.snapshot.matchup_cell(&x, &x).is_none());

        let window = builder().build_at(
            SnapshotScope::Window {
                from: at(0),
                to: at(61),
            },
            &corpus,
            &t,
            None,
            generated(9),
        );
        assert_eq!(window.snapshot.match_count, 2);
    }

    #[test]
    fn test_skipped_matches_are_reported() {
        let t = table();
        let mut corpus = scenario();
        let mut broken = corpus[0].clone();
        broken.id = "broken".into();
        broken.side_a.leader_id = None;
        corpus.push(broken);

        let build = builder().build_at(SnapshotScope::Global, &corpus, &t, None, generated(9));
        assert_eq!(build.snapshot.match_count, 3);
        assert_eq!(build.snapshot.skipped_count, 1);
        assert_eq!(build.diagnostics.skipped[0].match_id.as_str(), "broken");
    }

    #[test]
    fn test_week_over_week_delta() {
        let t = table();
        use Decision::*;
        // Week one: X dominates Z
        let week_one = vec![
            played("w1-1", deck_x(), deck_z(), &[SideA, SideA], 0),
            played("w1-2", deck_x(), deck_z(), &[SideA, SideA], 1),
        ];
        // Week two: Z turns it around
        let week_two = vec![
            played("w2-1", deck_z(), deck_x(), &[SideA, SideA], 0),
            played("w2-2", deck_z(), deck_x(), &[SideA, SideA], 1),
            played("w2-3", deck_z(), deck_y(), &[SideA, SideA], 2),
        ];

        let before = builder().build_at(SnapshotScope::Global, &week_one, &t, None, generated(2));
        let after = builder().build_at(
            SnapshotScope::Global,
            &week_two,
            &t,
            Some(&before.snapshot),
            generated(9),
        );

        let delta = after.delta.computed().unwrap();
        assert_eq!(delta.previous_id, before.snapshot.id);

        let x_key = normalize_deck(&deck_x(), &t).unwrap().key();
        let z_key = normalize_deck(&deck_z(), &t).unwrap().key();
        let x = delta.decks.iter().find(|d| d.key == x_key).unwrap();
        let z = delta.decks.iter().find(|d| d.key == z_key).unwrap();
        assert_eq!((x.placement_before, x.arrow_direction), (1, ArrowDirection::Worse));
        assert_eq!((z.placement_now, z.arrow_direction), (1, ArrowDirection::Improved));
        // Y was absent the week before
        assert_eq!(delta.decks.len(), 2);

        let twi = delta.set_share.iter().find(|s| s.key == "TWI").unwrap();
        assert!((twi.share_before - 50.0).abs() < 1e-9);
        assert!((twi.share_now - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_delta_against_other_scope_is_refused() {
        let t = table();
        let corpus = scenario();
        let tournament = builder().build_at(
            SnapshotScope::Tournament { id: "t-1".into() },
            &corpus,
            &t,
            None,
            generated(2),
        );
        let global = builder().build_at(
            SnapshotScope::Global,
            &corpus,
            &t,
            Some(&tournament.snapshot),
            generated(9),
        );
        assert_eq!(
            global.delta,
            DeltaOutcome::NoComparableSnapshot {
                expected: "global".to_string(),
                found: "tournament-t-1".to_string(),
            }
        );
    }

    #[test]
    fn test_mirror_policy_flows_into_snapshot() {
        let t = table();
        let config = AggregationConfig {
            mirror_policy: MirrorPolicy::Dedicated,
            ranking_metric: RankingMetric::MetaShare,
            ..Default::default()
        };
        let build = SnapshotBuilder::new(config).build_at(
            SnapshotScope::Global,
            &scenario(),
            &t,
            None,
            generated(9),
        );
        let x = normalize_deck(&deck_x(), &t).unwrap();
        let mirror = build.snapshot.matchup_cell(&x, &x).unwrap();
        assert_eq!(mirror.mirror_matches, 1);
        assert_eq!(mirror.match_draws, 0);
        assert_eq!(build.snapshot.ranking_metric, RankingMetric::MetaShare);
        // Meta share ranks the mirror-heavy X first
        assert_eq!(build.snapshot.deck_standings[0].key, x.key());
    }
}
