//! Aggregate outcome counters.

use serde::{Deserialize, Serialize};

use super::SideResult;

/// Tier classification based on match win rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    /// Calculate tier from win rate.
    pub fn from_win_rate(win_rate: f64) -> Self {
        if win_rate >= 0.55 {
            Tier::S
        } else if win_rate >= 0.52 {
            Tier::A
        } else if win_rate >= 0.48 {
            Tier::B
        } else if win_rate >= 0.45 {
            Tier::C
        } else {
            Tier::D
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::S => write!(f, "S"),
            Tier::A => write!(f, "A"),
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
            Tier::D => write!(f, "D"),
        }
    }
}

/// How a mirror match (both sides normalize to the same identity) affects
/// match-level counters.
///
/// Game-level counters on the mirror cell always take side A's view, so its
/// `gameWins` and `gameLosses` depend on which seat the record stored first.
/// Swapping the sides of a mirror match swaps those two counters; `total`
/// and `gameDraws` are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorPolicy {
    /// One `matchDraws` per mirror match
    #[default]
    CountAsDraw,
    /// One `mirrorMatches` per mirror match; win/loss/draw untouched
    Dedicated,
    /// Side A's match result recorded as if the sides were distinct
    SeatA,
}

/// Outcome counters for a (subject, opponent) pair.
///
/// `total` counts games: `total == gameWins + gameLosses + gameDraws`.
/// Match counts are kept separately; see [`CardMatchupStat::total_matches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMatchupStat {
    pub total: u64,
    pub game_wins: u64,
    pub game_losses: u64,
    pub game_draws: u64,
    pub match_wins: u64,
    pub match_losses: u64,
    pub match_draws: u64,

    /// Mirror matches under [`MirrorPolicy::Dedicated`]
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mirror_matches: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl CardMatchupStat {
    /// Add game counts from the subject's perspective.
    pub fn record_games(&mut self, wins: u32, losses: u32, draws: u32) {
        self.game_wins += u64::from(wins);
        self.game_losses += u64::from(losses);
        self.game_draws += u64::from(draws);
        self.total += u64::from(wins) + u64::from(losses) + u64::from(draws);
    }

    /// Add a single game result.
    pub fn record_game(&mut self, result: SideResult) {
        match result {
            SideResult::Win => self.record_games(1, 0, 0),
            SideResult::Loss => self.record_games(0, 1, 0),
            SideResult::Draw => self.record_games(0, 0, 1),
        }
    }

    /// Add a match result from the subject's perspective.
    pub fn record_match(&mut self, result: SideResult) {
        match result {
            SideResult::Win => self.match_wins += 1,
            SideResult::Loss => self.match_losses += 1,
            SideResult::Draw => self.match_draws += 1,
        }
    }

    /// Add a mirror match under the given policy.
    pub fn record_mirror_match(&mut self, policy: MirrorPolicy, seat_a_result: SideResult) {
        match policy {
            MirrorPolicy::CountAsDraw => self.match_draws += 1,
            MirrorPolicy::Dedicated => self.mirror_matches += 1,
            MirrorPolicy::SeatA => self.record_match(seat_a_result),
        }
    }

    /// Matches with a recorded win, loss or draw.
    pub fn total_matches(&self) -> u64 {
        self.match_wins + self.match_losses + self.match_draws
    }

    /// Every match folded into this cell, mirrors included.
    pub fn matches_played(&self) -> u64 {
        self.total_matches() + self.mirror_matches
    }

    /// Game win rate as a fraction (0.0 to 1.0).
    pub fn game_win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.game_wins as f64 / self.total as f64
        }
    }

    /// Match win rate as a fraction (0.0 to 1.0). Draws count in the denominator.
    pub fn match_win_rate(&self) -> f64 {
        let total = self.total_matches();
        if total == 0 {
            0.0
        } else {
            self.match_wins as f64 / total as f64
        }
    }

    /// Element-wise counter addition.
    pub fn merge(&mut self, other: &CardMatchupStat) {
        self.total += other.total;
        self.game_wins += other.game_wins;
        self.game_losses += other.game_losses;
        self.game_draws += other.game_draws;
        self.match_wins += other.match_wins;
        self.match_losses += other.match_losses;
        self.match_draws += other.match_draws;
        self.mirror_matches += other.mirror_matches;
    }

    /// Whether the game total agrees with its parts.
    pub fn is_consistent(&self) -> bool {
        self.total == self.game_wins + self.game_losses + self.game_draws
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.matches_played() == 0
    }
}
