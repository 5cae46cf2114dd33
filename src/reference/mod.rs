//! Card and set reference data.
//!
//! The aggregation engine never decides on its own whether a base is basic or
//! which set a card belongs to; it asks a [`CardReference`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bucket name for ids the reference table does not know.
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Read-only lookups supplied by the card reference table.
pub trait CardReference: Send + Sync {
    /// Whether the card is a generic basic base.
    fn is_basic_base(&self, card_id: &str) -> bool;

    /// Set the card was printed in.
    fn set_of(&self, card_id: &str) -> Option<&str>;

    /// First aspect printed on the card.
    fn aspect_of(&self, card_id: &str) -> Option<&str>;

    /// Rotation block a set belongs to.
    fn block_of(&self, set_id: &str) -> Option<&str>;

    /// Whether the card id is known at all.
    fn contains(&self, card_id: &str) -> bool;
}

/// One row of the card reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub set: String,

    #[serde(default)]
    pub basic_base: bool,

    #[serde(default)]
    pub aspects: Vec<String>,
}

impl CardRecord {
    pub fn new(id: &str, set: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            set: set.to_string(),
            basic_base: false,
            aspects: Vec::new(),
        }
    }

    /// Builder method to mark the card as a basic base of an aspect.
    pub fn basic_base(mut self, aspect: &str) -> Self {
        self.basic_base = true;
        self.aspects = vec![aspect.to_string()];
        self
    }

    /// Builder method to set aspects.
    pub fn with_aspects(mut self, aspects: &[&str]) -> Self {
        self.aspects = aspects.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// In-memory reference table with a set to rotation-block mapping.
#[derive(Debug, Clone, Default)]
pub struct CardTable {
    cards: HashMap<String, CardRecord>,
    rotation: HashMap<String, String>,
}

impl CardTable {
    pub fn new(cards: Vec<CardRecord>, rotation: HashMap<String, String>) -> Self {
        let cards = cards.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self { cards, rotation }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, card_id: &str) -> Option<&CardRecord> {
        self.cards.get(card_id)
    }
}

impl CardReference for CardTable {
    fn is_basic_base(&self, card_id: &str) -> bool {
        self.cards.get(card_id).is_some_and(|c| c.basic_base)
    }

    fn set_of(&self, card_id: &str) -> Option<&str> {
        self.cards.get(card_id).map(|c| c.set.as_str())
    }

    fn aspect_of(&self, card_id: &str) -> Option<&str> {
        self.cards
            .get(card_id)
            .and_then(|c| c.aspects.first())
            .map(String::as_str)
    }

    fn block_of(&self, set_id: &str) -> Option<&str> {
        self.rotation.get(set_id).map(String::as_str)
    }

    fn contains(&self, card_id: &str) -> bool {
        self.cards.contains_key(card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CardTable {
        let mut rotation = HashMap::new();
        rotation.insert("SOR".to_string(), "block-1".to_string());
        CardTable::new(
            vec![
                CardRecord::new("SOR-019", "SOR").basic_base("Vigilance"),
                CardRecord::new("SOR-022", "SOR").with_aspects(&["Vigilance"]),
                CardRecord::new("TWI-005", "TWI"),
            ],
            rotation,
        )
    }

    #[test]
    fn test_lookups() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert!(t.is_basic_base("SOR-019"));
        assert!(!t.is_basic_base("SOR-022"));
        assert!(!t.is_basic_base("missing"));
        assert_eq!(t.set_of("TWI-005"), Some("TWI"));
        assert_eq!(t.aspect_of("SOR-019"), Some("Vigilance"));
        assert_eq!(t.aspect_of("TWI-005"), None);
        assert_eq!(t.block_of("SOR"), Some("block-1"));
        assert_eq!(t.block_of("TWI"), None);
        assert!(t.contains("SOR-022"));
        assert!(!t.contains("SOR-999"));
    }

    #[test]
    fn test_card_record_deserialization_defaults() {
        let record: CardRecord = serde_json::from_str(r#"{"id":"SOR-001","set":"SOR"}"#).unwrap();
        assert!(!record.basic_base);
        assert!(record.aspects.is_empty());
        assert!(record.name.is_empty());
    }
}
