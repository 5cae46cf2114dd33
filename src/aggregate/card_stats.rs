//! Per-card and per-leader/per-base statistics.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ResolvedMatch;
use crate::models::{CardMatchupStat, DeckIdentity, MatchResult, MirrorPolicy, Side};

/// A subject's record overall, against each opponent identity, and against
/// each opponent leader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    /// Record against other identities; mirror matches are excluded
    pub overall: CardMatchupStat,
    pub by_opponent: BTreeMap<String, CardMatchupStat>,
    /// `by_opponent` rolled up by the opponent's leader
    #[serde(default)]
    pub by_opponent_leader: BTreeMap<String, CardMatchupStat>,
}

impl SubjectStats {
    /// Record against every deck led by `leader_key`.
    pub fn against_leader(&self, leader_key: &str) -> Option<&CardMatchupStat> {
        self.by_opponent_leader.get(leader_key)
    }

    fn opponent_cells(&mut self, opponent: &DeckIdentity) -> [&mut CardMatchupStat; 2] {
        [
            self.by_opponent.entry(opponent.key()).or_default(),
            self.by_opponent_leader
                .entry(opponent.leader_key.clone())
                .or_default(),
        ]
    }

    fn merge(&mut self, other: &SubjectStats) {
        self.overall.merge(&other.overall);
        for (opponent, stat) in &other.by_opponent {
            self.by_opponent.entry(opponent.clone()).or_default().merge(stat);
        }
        for (leader, stat) in &other.by_opponent_leader {
            self.by_opponent_leader
                .entry(leader.clone())
                .or_default()
                .merge(stat);
        }
    }
}

/// Leader and base records keyed by the opponent's deck identity and leader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderBaseStats {
    pub leaders: BTreeMap<String, SubjectStats>,
    /// Keyed by normalized base key; the empty key is the unknown base
    pub bases: BTreeMap<String, SubjectStats>,
}

impl LeaderBaseStats {
    pub fn record(&mut self, resolved: &ResolvedMatch, policy: MirrorPolicy) {
        if resolved.is_mirror() {
            let identity = &resolved.identity_a;
            let (wins, losses, draws) = resolved.tally.for_side(Side::A);
            let result = resolved.decision.for_side(Side::A);
            for subject in [
                self.leaders.entry(identity.leader_key.clone()).or_default(),
                self.bases.entry(identity.base_key.clone()).or_default(),
            ] {
                for cell in subject.opponent_cells(identity) {
                    cell.record_games(wins, losses, draws);
                    cell.record_mirror_match(policy, result);
                }
            }
            return;
        }

        for side in [Side::A, Side::B] {
            let own = resolved.identity(side);
            let opponent = resolved.identity(side.opponent());
            let (wins, losses, draws) = resolved.tally.for_side(side);
            let result = resolved.decision.for_side(side);

            for subject in [
                self.leaders.entry(own.leader_key.clone()).or_default(),
                self.bases.entry(own.base_key.clone()).or_default(),
            ] {
                subject.overall.record_games(wins, losses, draws);
                subject.overall.record_match(result);
                for cell in subject.opponent_cells(opponent) {
                    cell.record_games(wins, losses, draws);
                    cell.record_match(result);
                }
            }
        }
    }

    pub fn leader(&self, leader_id: &str) -> Option<&SubjectStats> {
        self.leaders.get(leader_id)
    }

    pub fn base(&self, base_key: &str) -> Option<&SubjectStats> {
        self.bases.get(base_key)
    }

    pub fn merge(&mut self, other: &LeaderBaseStats) {
        for (key, stats) in &other.leaders {
            self.leaders.entry(key.clone()).or_default().merge(stats);
        }
        for (key, stats) in &other.bases {
            self.bases.entry(key.clone()).or_default().merge(stats);
        }
    }
}

/// One card's play count and win association.
///
/// Game counters count each game the card was played in once; match counters
/// count each match the card appeared in once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStatLine {
    #[serde(flatten)]
    pub stat: CardMatchupStat,

    /// Every logged play, repeats within a game included
    pub plays: u64,

    pub by_opponent: BTreeMap<String, CardMatchupStat>,
}

impl CardStatLine {
    fn merge(&mut self, other: &CardStatLine) {
        self.stat.merge(&other.stat);
        self.plays += other.plays;
        for (opponent, stat) in &other.by_opponent {
            self.by_opponent.entry(opponent.clone()).or_default().merge(stat);
        }
    }
}

/// Card statistics from per-game play logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardStatsTable {
    pub cards: BTreeMap<String, CardStatLine>,
}

impl CardStatsTable {
    /// Record a match's play logs. Games without a log contribute nothing.
    pub fn record(&mut self, m: &MatchResult, resolved: &ResolvedMatch) {
        if !m.has_card_plays() {
            return;
        }

        for side in [Side::A, Side::B] {
            let opponent_key = resolved.identity(side.opponent()).key();
            let mut in_match: BTreeSet<&str> = BTreeSet::new();

            for game in &m.games {
                let Some(log) = &game.cards_played else {
                    continue;
                };
                let result = game.winner.for_side(side);
                let mut in_game: BTreeSet<&str> = BTreeSet::new();

                for card in log.for_side(side) {
                    let card = card.trim();
                    if card.is_empty() {
                        continue;
                    }
                    let line = self.cards.entry(card.to_string()).or_default();
                    line.plays += 1;
                    if in_game.insert(card) {
                        line.stat.record_game(result);
                        line.by_opponent
                            .entry(opponent_key.clone())
                            .or_default()
                            .record_game(result);
                    }
                }
                in_match.extend(in_game);
            }

            let result = resolved.decision.for_side(side);
            for card in in_match {
                if let Some(line) = self.cards.get_mut(card) {
                    line.stat.record_match(result);
                    line.by_opponent
                        .entry(opponent_key.clone())
                        .or_default()
                        .record_match(result);
                }
            }
        }
    }

    pub fn get(&self, card_id: &str) -> Option<&CardStatLine> {
        self.cards.get(card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn merge(&mut self, other: &CardStatsTable) {
        for (card, line) in &other.cards {
            self.cards.entry(card.clone()).or_default().merge(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::resolve_match;
    use super::*;
    use crate::models::{Decision, GameResult};
    use crate::normalize::normalize_deck;

    #[test]
    fn test_leader_stats_keyed_by_opponent_identity() {
        let t = table();
        let mut stats = LeaderBaseStats::default();
        for m in scenario() {
            let resolved = resolve_match(&m, &t).unwrap();
            stats.record(&resolved, MirrorPolicy::CountAsDraw);
        }

        let y_key = normalize_deck(&deck_y(), &t).unwrap().key();
        let x_key = normalize_deck(&deck_x(), &t).unwrap().key();

        let leader_x = stats.leader("SOR-005").unwrap();
        let vs_y = &leader_x.by_opponent[&y_key];
        assert_eq!(vs_y.match_wins, 1);
        assert_eq!(vs_y.match_losses, 1);
        assert_eq!(vs_y.total, 5);

        // Mirror recorded once, outside the overall record
        let vs_self = &leader_x.by_opponent[&x_key];
        assert_eq!(vs_self.total, 3);
        assert_eq!(vs_self.match_draws, 1);
        assert_eq!(leader_x.overall.total_matches(), 2);

        let leader_y = stats.leader("SHD-010").unwrap();
        assert_eq!(leader_y.by_opponent[&x_key].match_wins, 1);
        assert_eq!(leader_y.overall.game_wins, 3);
    }

    #[test]
    fn test_leader_vs_leader_rolls_up_opponent_identities() {
        use Decision::*;
        let t = table();
        // Leader SHD-010 on two different bases
        let mut y_unique = deck_y();
        y_unique.base_id = Some("SOR-022".to_string());
        let corpus = vec![
            played("m1", deck_x(), deck_y(), &[SideA, SideA], 0),
            played("m2", deck_x(), y_unique, &[SideB, SideA, SideB], 1),
            played("m3", deck_x(), deck_x_prime(), &[SideA], 2),
        ];

        let mut stats = LeaderBaseStats::default();
        for m in &corpus {
            let resolved = resolve_match(m, &t).unwrap();
            stats.record(&resolved, MirrorPolicy::CountAsDraw);
        }

        let leader_x = stats.leader("SOR-005").unwrap();
        assert_eq!(leader_x.by_opponent.len(), 3);
        let vs_shd = leader_x.against_leader("SHD-010").unwrap();
        assert_eq!(vs_shd.total, 5);
        assert_eq!((vs_shd.match_wins, vs_shd.match_losses), (1, 1));
        assert_eq!((vs_shd.game_wins, vs_shd.game_losses), (3, 2));

        let vs_self = leader_x.against_leader("SOR-005").unwrap();
        assert_eq!(vs_self.match_draws, 1);
        assert_eq!(vs_self.total, 1);

        let leader_y = stats.leader("SHD-010").unwrap();
        assert_eq!(leader_y.against_leader("SOR-005").unwrap().match_wins, 1);
        assert_eq!(
            stats.base("Vigilance").unwrap().against_leader("SHD-010"),
            Some(vs_shd)
        );
        assert!(leader_x.against_leader("TWI-003").is_none());
    }

    #[test]
    fn test_base_stats_use_normalized_key() {
        let t = table();
        let mut stats = LeaderBaseStats::default();
        for m in scenario() {
            let resolved = resolve_match(&m, &t).unwrap();
            stats.record(&resolved, MirrorPolicy::default());
        }
        assert!(stats.base("Vigilance").is_some());
        assert!(stats.base("Command").is_some());
        assert!(stats.base("SOR-019").is_none());
    }

    #[test]
    fn test_unknown_base_aggregates_under_empty_key() {
        let t = table();
        let mut no_base = deck_z();
        no_base.base_id = None;
        let m = played("m1", no_base, deck_y(), &[Decision::SideA], 0);
        let resolved = resolve_match(&m, &t).unwrap();

        let mut stats = LeaderBaseStats::default();
        stats.record(&resolved, MirrorPolicy::default());
        assert_eq!(stats.base("").unwrap().overall.match_wins, 1);
    }

    #[test]
    fn test_card_stats_from_play_logs() {
        let t = table();
        let m = MatchResult::new("m1", deck_x(), deck_y(), at(0)).with_games(vec![
            GameResult::new(Decision::SideA)
                .with_cards(&["SOR-100", "SOR-100", "SOR-101"], &["SHD-200"]),
            GameResult::new(Decision::SideB)
                .with_cards(&["SOR-100"], &["SHD-200", "SHD-201"]),
            GameResult::new(Decision::SideA),
        ]);
        let resolved = resolve_match(&m, &t).unwrap();

        let mut cards = CardStatsTable::default();
        cards.record(&m, &resolved);

        let c100 = cards.get("SOR-100").unwrap();
        assert_eq!(c100.plays, 3);
        assert_eq!(c100.stat.total, 2);
        assert_eq!(c100.stat.game_wins, 1);
        assert_eq!(c100.stat.game_losses, 1);
        assert_eq!(c100.stat.match_wins, 1);
        assert!(c100.stat.is_consistent());

        let c201 = cards.get("SHD-201").unwrap();
        assert_eq!(c201.stat.game_wins, 1);
        assert_eq!(c201.stat.match_losses, 1);

        let y_key = normalize_deck(&deck_y(), &t).unwrap().key();
        assert_eq!(c100.by_opponent[&y_key].match_wins, 1);
        assert_eq!(cards.len(), 4);
    }

    #[test]
    fn test_card_stats_omitted_without_logs() {
        let t = table();
        let m = played("m1", deck_x(), deck_y(), &[Decision::SideA], 0);
        let resolved = resolve_match(&m, &t).unwrap();

        let mut cards = CardStatsTable::default();
        cards.record(&m, &resolved);
        assert!(cards.is_empty());
    }

    #[test]
    fn test_card_line_serializes_flat() {
        let mut line = CardStatLine::default();
        line.stat.record_games(1, 0, 0);
        line.plays = 2;
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["gameWins"], 1);
        assert_eq!(json["plays"], 2);
        assert!(json["byOpponent"].is_object());
    }
}
