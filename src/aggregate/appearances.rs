//! Deck appearance counts behind meta share and set share.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ResolvedMatch;
use crate::models::Side;
use crate::reference::{CardReference, UNKNOWN_BUCKET};

/// Each side of each folded match is one deck appearance, mirrors included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearances {
    pub total: u64,
    pub decks: BTreeMap<String, u64>,
    pub leaders: BTreeMap<String, u64>,
    pub bases: BTreeMap<String, u64>,
    /// Keyed by the set of the deck's leader
    pub sets: BTreeMap<String, u64>,
    pub blocks: BTreeMap<String, u64>,
}

impl Appearances {
    pub fn record(&mut self, resolved: &ResolvedMatch, reference: &dyn CardReference) {
        for side in [Side::A, Side::B] {
            let identity = resolved.identity(side);
            let set = reference.set_of(&identity.leader_key);
            let block = set.and_then(|s| reference.block_of(s));

            self.total += 1;
            *self.decks.entry(identity.key()).or_default() += 1;
            *self.leaders.entry(identity.leader_key.clone()).or_default() += 1;
            *self.bases.entry(identity.base_key.clone()).or_default() += 1;
            *self
                .sets
                .entry(set.unwrap_or(UNKNOWN_BUCKET).to_string())
                .or_default() += 1;
            *self
                .blocks
                .entry(block.unwrap_or(UNKNOWN_BUCKET).to_string())
                .or_default() += 1;
        }
    }

    /// Share of all appearances, as a fraction.
    pub fn share(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }

    pub fn merge(&mut self, other: &Appearances) {
        self.total += other.total;
        for (target, source) in [
            (&mut self.decks, &other.decks),
            (&mut self.leaders, &other.leaders),
            (&mut self.bases, &other.bases),
            (&mut self.sets, &other.sets),
            (&mut self.blocks, &other.blocks),
        ] {
            for (key, count) in source {
                *target.entry(key.clone()).or_default() += count;
            }
        }
    }
}
