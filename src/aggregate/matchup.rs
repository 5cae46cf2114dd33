//! Head-to-head matchup matrix keyed by normalized deck identity pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{resolve_match, Diagnostics, ResolvedMatch};
use crate::models::{CardMatchupStat, DeckIdentity, MatchResult, MirrorPolicy, Side};
use crate::reference::CardReference;

/// Directed matchup cells: `cells[row][col]` holds the row deck's record
/// against the column deck. The diagonal holds mirror matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupMatrix {
    pub identities: BTreeMap<String, DeckIdentity>,
    pub cells: BTreeMap<String, BTreeMap<String, CardMatchupStat>>,
}

impl MatchupMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one match, collecting it into `diagnostics` if it cannot be
    /// resolved.
    pub fn fold_match(
        &mut self,
        m: &MatchResult,
        reference: &dyn CardReference,
        policy: MirrorPolicy,
        diagnostics: &mut Diagnostics,
    ) {
        match resolve_match(m, reference) {
            Ok(resolved) => self.record(&resolved, policy),
            Err(reason) => diagnostics.skip(&m.id, reason),
        }
    }

    /// Record a resolved match.
    ///
    /// A mirror updates only the diagonal cell: games from side A's view and
    /// the match under `policy`. Otherwise both directed cells are updated
    /// with complementary counts.
    pub fn record(&mut self, resolved: &ResolvedMatch, policy: MirrorPolicy) {
        let (a_wins, a_losses, draws) = resolved.tally.for_side(Side::A);

        if resolved.is_mirror() {
            let cell = self.cell_mut(&resolved.identity_a, &resolved.identity_a);
            cell.record_games(a_wins, a_losses, draws);
            cell.record_mirror_match(policy, resolved.decision.for_side(Side::A));
            return;
        }

        for side in [Side::A, Side::B] {
            let (wins, losses, draws) = resolved.tally.for_side(side);
            let cell = self.cell_mut(
                resolved.identity(side),
                resolved.identity(side.opponent()),
            );
            cell.record_games(wins, losses, draws);
            cell.record_match(resolved.decision.for_side(side));
        }
    }

    fn cell_mut(&mut self, row: &DeckIdentity, col: &DeckIdentity) -> &mut CardMatchupStat {
        let row_key = row.key();
        let col_key = col.key();
        self.identities
            .entry(row_key.clone())
            .or_insert_with(|| row.clone());
        self.identities
            .entry(col_key.clone())
            .or_insert_with(|| col.clone());
        self.cells
            .entry(row_key)
            .or_default()
            .entry(col_key)
            .or_default()
    }

    pub fn cell(&self, row: &DeckIdentity, col: &DeckIdentity) -> Option<&CardMatchupStat> {
        self.cell_by_key(&row.key(), &col.key())
    }

    pub fn cell_by_key(&self, row: &str, col: &str) -> Option<&CardMatchupStat> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn mirror(&self, identity: &DeckIdentity) -> Option<&CardMatchupStat> {
        self.cell(identity, identity)
    }

    /// A deck's record against every other identity, mirrors excluded.
    pub fn record_for(&self, row: &str) -> CardMatchupStat {
        let mut total = CardMatchupStat::default();
        if let Some(cols) = self.cells.get(row) {
            for (col, stat) in cols {
                if col != row {
                    total.merge(stat);
                }
            }
        }
        total
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn merge(&mut self, other: &MatchupMatrix) {
        for (key, identity) in &other.identities {
            self.identities
                .entry(key.clone())
                .or_insert_with(|| identity.clone());
        }
        for (row, cols) in &other.cells {
            let target = self.cells.entry(row.clone()).or_default();
            for (col, stat) in cols {
                target.entry(col.clone()).or_default().merge(stat);
            }
        }
    }
}
