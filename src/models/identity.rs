//! Normalized deck identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a deck: leader, normalized base key, and a sorted,
/// deduplicated aspect list.
///
/// Built by [`crate::normalize::normalize_deck_identity`]; two decks that
/// should aggregate together always produce equal identities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckIdentity {
    pub leader_key: String,

    /// Base card id, the base aspect for basic bases, or empty when unknown
    pub base_key: String,

    pub aspects: Vec<String>,
}

impl DeckIdentity {
    /// Stable string key used for map keys and tie-breaking.
    ///
    /// Fields are joined with `|` and aspects with `+`. A `|`, `+` or `\`
    /// inside a field is escaped with a backslash, so distinct identities
    /// never share a key.
    pub fn key(&self) -> String {
        let mut key = String::new();
        push_escaped(&mut key, &self.leader_key);
        key.push('|');
        push_escaped(&mut key, &self.base_key);
        key.push('|');
        for (i, aspect) in self.aspects.iter().enumerate() {
            if i > 0 {
                key.push('+');
            }
            push_escaped(&mut key, aspect);
        }
        key
    }

    /// Whether the base could not be resolved.
    pub fn has_unknown_base(&self) -> bool {
        self.base_key.is_empty()
    }
}

fn push_escaped(out: &mut String, field: &str) {
    for c in field.chars() {
        if matches!(c, '|' | '+' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
}

impl fmt::Display for DeckIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
