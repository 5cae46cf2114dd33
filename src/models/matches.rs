//! Match and game records supplied by the corpus loader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, MatchId, TournamentId};

/// One of the two seats in a match, in stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// The decision of a game or a match: one winning side, or a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    SideA,
    SideB,
    Draw,
}

/// A decision seen from one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideResult {
    Win,
    Loss,
    Draw,
}

impl Decision {
    /// View this decision from the given side.
    pub fn for_side(self, side: Side) -> SideResult {
        match (self, side) {
            (Decision::Draw, _) => SideResult::Draw,
            (Decision::SideA, Side::A) | (Decision::SideB, Side::B) => SideResult::Win,
            _ => SideResult::Loss,
        }
    }
}

/// Cards each side played in a single game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlayLog {
    #[serde(default)]
    pub side_a: Vec<String>,
    #[serde(default)]
    pub side_b: Vec<String>,
}

impl CardPlayLog {
    pub fn for_side(&self, side: Side) -> &[String] {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// One game within a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub winner: Decision,

    /// Per-game card plays, when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards_played: Option<CardPlayLog>,
}

impl GameResult {
    pub fn new(winner: Decision) -> Self {
        Self {
            winner,
            cards_played: None,
        }
    }

    /// Builder method to attach a card play log.
    pub fn with_cards(mut self, side_a: &[&str], side_b: &[&str]) -> Self {
        self.cards_played = Some(CardPlayLog {
            side_a: side_a.iter().map(|s| s.to_string()).collect(),
            side_b: side_b.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

/// A deck as recorded on one side of a match, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<String>,

    #[serde(default)]
    pub leader_id: Option<String>,

    #[serde(default)]
    pub base_id: Option<String>,

    /// Aspect of the base; falls back to the reference table when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_aspect: Option<String>,

    #[serde(default)]
    pub aspects: Vec<String>,
}

impl DeckRef {
    pub fn new(leader_id: &str, base_id: &str) -> Self {
        Self {
            leader_id: Some(leader_id.to_string()),
            base_id: Some(base_id.to_string()),
            ..Default::default()
        }
    }

    /// Builder method to set the base aspect.
    pub fn with_base_aspect(mut self, aspect: &str) -> Self {
        self.base_aspect = Some(aspect.to_string());
        self
    }

    /// Builder method to set the declared aspects.
    pub fn with_aspects(mut self, aspects: &[&str]) -> Self {
        self.aspects = aspects.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Game tally for a match, in stored side order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameTally {
    pub side_a: u32,
    pub side_b: u32,
    pub draws: u32,
}

impl GameTally {
    pub fn total(&self) -> u32 {
        self.side_a + self.side_b + self.draws
    }

    /// (wins, losses, draws) from the given side.
    pub fn for_side(&self, side: Side) -> (u32, u32, u32) {
        match side {
            Side::A => (self.side_a, self.side_b, self.draws),
            Side::B => (self.side_b, self.side_a, self.draws),
        }
    }
}

/// One completed match between two decks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: MatchId,

    pub side_a: DeckRef,

    pub side_b: DeckRef,

    /// Games in play order
    #[serde(default)]
    pub games: Vec<GameResult>,

    /// Recorded overall outcome; derived from `games` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Decision>,

    pub played_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<TournamentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl MatchResult {
    pub fn new(id: &str, side_a: DeckRef, side_b: DeckRef, played_at: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::from(id),
            side_a,
            side_b,
            games: Vec::new(),
            outcome: None,
            played_at,
            tournament_id: None,
            round: None,
        }
    }

    /// Builder method to set the games.
    pub fn with_games(mut self, games: Vec<GameResult>) -> Self {
        self.games = games;
        self
    }

    /// Builder method to set the recorded outcome.
    pub fn with_outcome(mut self, outcome: Decision) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Builder method to set the tournament context.
    pub fn in_tournament(mut self, tournament_id: &str, round: u32) -> Self {
        self.tournament_id = Some(EntityId::from(tournament_id));
        self.round = Some(round);
        self
    }

    pub fn deck(&self, side: Side) -> &DeckRef {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }

    pub fn tally(&self) -> GameTally {
        let mut tally = GameTally::default();
        for game in &self.games {
            match game.winner {
                Decision::SideA => tally.side_a += 1,
                Decision::SideB => tally.side_b += 1,
                Decision::Draw => tally.draws += 1,
            }
        }
        tally
    }

    /// Majority rule over game results. `None` when no games are recorded.
    pub fn majority_outcome(&self) -> Option<Decision> {
        if self.games.is_empty() {
            return None;
        }
        let tally = self.tally();
        Some(match tally.side_a.cmp(&tally.side_b) {
            std::cmp::Ordering::Greater => Decision::SideA,
            std::cmp::Ordering::Less => Decision::SideB,
            std::cmp::Ordering::Equal => Decision::Draw,
        })
    }

    /// Whether any game carries a card play log.
    pub fn has_card_plays(&self) -> bool {
        self.games.iter().any(|g| g.cards_played.is_some())
    }
}
