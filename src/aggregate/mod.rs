//! Aggregation of a match corpus into matchup, card and leader/base tables.
//!
//! Folding is an in-place accumulation: [`CorpusAggregator::fold_match`]
//! updates counters without copying, [`CorpusAggregator::snapshot`] clones
//! the current state out and [`CorpusAggregator::reset`] clears it. All
//! counters are plain sums, so partial aggregators over disjoint partitions
//! merge element-wise into the same totals as a single sequential fold.

mod appearances;
mod card_stats;
mod matchup;

pub use appearances::*;
pub use card_stats::*;
pub use matchup::*;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{DeckIdentity, Decision, GameTally, MatchId, MatchResult, MirrorPolicy, Side};
use crate::normalize::normalize_deck;
use crate::reference::CardReference;

/// Why a match was left out of the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("side {side:?} has no leader")]
    MissingLeader { side: Side },

    #[error("recorded outcome {recorded:?} contradicts game results ({derived:?})")]
    OutcomeMismatch { recorded: Decision, derived: Decision },

    #[error("no games and no recorded outcome")]
    EmptyMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Records skipped or partially understood during a fold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub skipped: Vec<SkippedRecord>,

    /// Leader and base ids missing from the reference table
    pub unknown_cards: std::collections::BTreeSet<String>,
}

impl Diagnostics {
    pub fn skip(&mut self, match_id: &MatchId, reason: SkipReason) {
        warn!("Skipping match {}: {}", match_id, reason);
        self.skipped.push(SkippedRecord {
            match_id: match_id.clone(),
            reason,
        });
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.skipped.extend(other.skipped);
        self.unknown_cards.extend(other.unknown_cards);
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unknown_cards.is_empty()
    }
}

/// A match whose identities and outcome have been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    pub identity_a: DeckIdentity,
    pub identity_b: DeckIdentity,
    pub decision: Decision,
    pub tally: GameTally,
}

impl ResolvedMatch {
    pub fn is_mirror(&self) -> bool {
        self.identity_a == self.identity_b
    }

    pub fn identity(&self, side: Side) -> &DeckIdentity {
        match side {
            Side::A => &self.identity_a,
            Side::B => &self.identity_b,
        }
    }
}

/// Normalize both decks and derive the match outcome by majority rule.
pub fn resolve_match(
    m: &MatchResult,
    reference: &dyn CardReference,
) -> Result<ResolvedMatch, SkipReason> {
    let identity_a =
        normalize_deck(&m.side_a, reference).ok_or(SkipReason::MissingLeader { side: Side::A })?;
    let identity_b =
        normalize_deck(&m.side_b, reference).ok_or(SkipReason::MissingLeader { side: Side::B })?;

    let decision = match (m.majority_outcome(), m.outcome) {
        (Some(derived), Some(recorded)) if derived != recorded => {
            return Err(SkipReason::OutcomeMismatch { recorded, derived });
        }
        (Some(derived), _) => derived,
        (None, Some(recorded)) => recorded,
        (None, None) => return Err(SkipReason::EmptyMatch),
    };

    Ok(ResolvedMatch {
        identity_a,
        identity_b,
        decision,
        tally: m.tally(),
    })
}

/// Accumulates every aggregate table over a corpus in one pass.
#[derive(Debug, Clone, Default)]
pub struct CorpusAggregator {
    policy: MirrorPolicy,
    pub matrix: MatchupMatrix,
    pub cards: CardStatsTable,
    pub leader_base: LeaderBaseStats,
    pub appearances: Appearances,
    pub diagnostics: Diagnostics,
    pub matches_folded: u64,
}

/// Cloned-out state of a [`CorpusAggregator`].
#[derive(Debug, Clone, Default)]
pub struct AggregateTables {
    pub matrix: MatchupMatrix,
    pub cards: CardStatsTable,
    pub leader_base: LeaderBaseStats,
    pub appearances: Appearances,
    pub diagnostics: Diagnostics,
    pub matches_folded: u64,
}

impl CorpusAggregator {
    pub fn new(policy: MirrorPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> MirrorPolicy {
        self.policy
    }

    /// Fold one match into every table. Malformed matches are recorded in
    /// the diagnostics and leave all counters untouched.
    pub fn fold_match(&mut self, m: &MatchResult, reference: &dyn CardReference) {
        let resolved = match resolve_match(m, reference) {
            Ok(resolved) => resolved,
            Err(reason) => {
                self.diagnostics.skip(&m.id, reason);
                return;
            }
        };

        for side in [Side::A, Side::B] {
            let deck = m.deck(side);
            for id in [deck.leader_id.as_deref(), deck.base_id.as_deref()]
                .into_iter()
                .flatten()
            {
                let id = id.trim();
                if !id.is_empty() && !reference.contains(id) {
                    self.diagnostics.unknown_cards.insert(id.to_string());
                }
            }
        }

        self.matrix.record(&resolved, self.policy);
        self.leader_base.record(&resolved, self.policy);
        self.cards.record(m, &resolved);
        self.appearances.record(&resolved, reference);
        self.matches_folded += 1;
    }

    pub fn fold_all<'a, I>(&mut self, corpus: I, reference: &dyn CardReference)
    where
        I: IntoIterator<Item = &'a MatchResult>,
    {
        for m in corpus {
            self.fold_match(m, reference);
        }
    }

    /// Add another aggregator's counters into this one.
    pub fn merge(&mut self, other: CorpusAggregator) {
        self.matrix.merge(&other.matrix);
        self.cards.merge(&other.cards);
        self.leader_base.merge(&other.leader_base);
        self.appearances.merge(&other.appearances);
        self.diagnostics.merge(other.diagnostics);
        self.matches_folded += other.matches_folded;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }

    pub fn snapshot(&self) -> AggregateTables {
        AggregateTables {
            matrix: self.matrix.clone(),
            cards: self.cards.clone(),
            leader_base: self.leader_base.clone(),
            appearances: self.appearances.clone(),
            diagnostics: self.diagnostics.clone(),
            matches_folded: self.matches_folded,
        }
    }

    pub fn into_tables(self) -> AggregateTables {
        AggregateTables {
            matrix: self.matrix,
            cards: self.cards,
            leader_base: self.leader_base,
            appearances: self.appearances,
            diagnostics: self.diagnostics,
            matches_folded: self.matches_folded,
        }
    }
}

/// Fold a corpus, splitting it into `partitions` contiguous chunks folded in
/// parallel and merged element-wise. One partition folds sequentially.
pub fn fold_corpus(
    corpus: &[&MatchResult],
    reference: &dyn CardReference,
    policy: MirrorPolicy,
    partitions: usize,
) -> AggregateTables {
    if partitions <= 1 || corpus.len() < 2 {
        let mut agg = CorpusAggregator::new(policy);
        agg.fold_all(corpus.iter().copied(), reference);
        return agg.into_tables();
    }

    let chunk_size = corpus.len().div_ceil(partitions);
    debug!(
        "Folding {} matches in {} partitions of up to {}",
        corpus.len(),
        partitions,
        chunk_size
    );

    corpus
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut agg = CorpusAggregator::new(policy);
            agg.fold_all(chunk.iter().copied(), reference);
            agg
        })
        .reduce(
            || CorpusAggregator::new(policy),
            |mut acc, part| {
                acc.merge(part);
                acc
            },
        )
        .into_tables()
}
