//! Canonical identity keys for decks, leaders and bases.
//!
//! Basic bases are generic and shared by many decks, so a basic base
//! collapses to its aspect. Unique bases keep their card id. Aspect lists are
//! sorted and deduplicated so declaration order never splits a bucket.

use crate::models::{DeckIdentity, DeckRef};
use crate::reference::CardReference;

/// Normalize a base to its aggregation key.
///
/// Returns the aspect for a basic base, the card id otherwise, and an empty
/// string when the base is missing. A basic base without a known aspect keeps
/// its card id.
pub fn normalize_base_key<F>(
    base_id: Option<&str>,
    base_aspect: Option<&str>,
    is_basic_base: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = match base_id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => return String::new(),
    };

    if is_basic_base(base_id) {
        if let Some(aspect) = base_aspect.map(str::trim).filter(|a| !a.is_empty()) {
            return aspect.to_string();
        }
    }

    base_id.to_string()
}

/// Sort and deduplicate an aspect list, dropping blank entries.
pub fn normalize_aspects<S: AsRef<str>>(aspects: &[S]) -> Vec<String> {
    let mut out: Vec<String> = aspects
        .iter()
        .map(|a| a.as_ref().trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Combine a leader id, normalized base key and aspect list into an identity.
pub fn normalize_deck_identity<F, S>(
    leader_id: &str,
    base_id: Option<&str>,
    base_aspect: Option<&str>,
    is_basic_base: F,
    aspects: &[S],
) -> DeckIdentity
where
    F: Fn(&str) -> bool,
    S: AsRef<str>,
{
    DeckIdentity {
        leader_key: leader_id.trim().to_string(),
        base_key: normalize_base_key(base_id, base_aspect, is_basic_base),
        aspects: normalize_aspects(aspects),
    }
}

/// Normalize a recorded deck against the reference table.
///
/// Returns `None` when the leader is missing, since a deck without a leader
/// has no identity. An unknown base or unknown leader id still normalizes.
pub fn normalize_deck(deck: &DeckRef, reference: &dyn CardReference) -> Option<DeckIdentity> {
    let leader_id = leader_key(deck)?;

    let base_aspect = deck.base_aspect.as_deref().or_else(|| {
        deck.base_id
            .as_deref()
            .and_then(|id| reference.aspect_of(id.trim()))
    });

    Some(normalize_deck_identity(
        &leader_id,
        deck.base_id.as_deref(),
        base_aspect,
        |id| reference.is_basic_base(id),
        deck.aspects.as_slice(),
    ))
}

/// Key a leader aggregates under.
pub fn leader_key(deck: &DeckRef) -> Option<String> {
    deck.leader_id
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{CardRecord, CardTable};
    use std::collections::HashMap;

    fn table() -> CardTable {
        CardTable::new(
            vec![
                CardRecord::new("SOR-019", "SOR").basic_base("Vigilance"),
                CardRecord::new("SOR-020", "SOR").basic_base("Command"),
                CardRecord::new("SHD-019", "SHD").basic_base("Vigilance"),
                CardRecord::new("SOR-022", "SOR").with_aspects(&["Vigilance"]),
                CardRecord::new("SOR-023", "SOR").with_aspects(&["Vigilance"]),
            ],
            HashMap::new(),
        )
    }

    #[test]
    fn test_basic_base_collapses_to_aspect() {
        let key = normalize_base_key(Some("SOR-019"), Some("Vigilance"), |_| true);
        assert_eq!(key, "Vigilance");
    }

    #[test]
    fn test_unique_base_keeps_id() {
        let key = normalize_base_key(Some("SOR-022"), Some("Vigilance"), |_| false);
        assert_eq!(key, "SOR-022");
    }

    #[test]
    fn test_missing_base_is_empty_key() {
        assert_eq!(normalize_base_key(None, Some("Vigilance"), |_| true), "");
        assert_eq!(normalize_base_key(Some("  "), None, |_| false), "");
    }

    #[test]
    fn test_basic_base_without_aspect_keeps_id() {
        assert_eq!(normalize_base_key(Some("SOR-019"), None, |_| true), "SOR-019");
    }

    #[test]
    fn test_aspects_sorted_and_deduplicated() {
        let a = normalize_deck_identity(
            "L1",
            Some("B1"),
            None,
            |_| false,
            &["Villainy", "Aggression", "Villainy"],
        );
        let b = normalize_deck_identity("L1", Some("B1"), None, |_| false, &["Aggression", "Villainy"]);
        assert_eq!(a, b);
        assert_eq!(a.aspects, vec!["Aggression", "Villainy"]);
    }

    #[test]
    fn test_two_basic_prints_of_same_aspect_collapse() {
        let t = table();
        let a = DeckRef::new("SOR-005", "SOR-019").with_aspects(&["Vigilance", "Villainy"]);
        let b = DeckRef::new("SOR-005", "SHD-019").with_aspects(&["Villainy", "Vigilance"]);
        assert_eq!(normalize_deck(&a, &t), normalize_deck(&b, &t));
        assert_eq!(normalize_deck(&a, &t).unwrap().base_key, "Vigilance");
    }

    #[test]
    fn test_basic_bases_of_different_aspects_stay_apart() {
        let t = table();
        let a = DeckRef::new("SOR-005", "SOR-019");
        let b = DeckRef::new("SOR-005", "SOR-020");
        assert_ne!(normalize_deck(&a, &t), normalize_deck(&b, &t));
    }

    #[test]
    fn test_unique_bases_of_same_aspect_do_not_collapse() {
        let t = table();
        let a = DeckRef::new("SOR-005", "SOR-022").with_aspects(&["Vigilance"]);
        let b = DeckRef::new("SOR-005", "SOR-023").with_aspects(&["Vigilance"]);
        assert_ne!(normalize_deck(&a, &t), normalize_deck(&b, &t));
    }

    #[test]
    fn test_deck_base_aspect_overrides_reference() {
        let t = table();
        let deck = DeckRef::new("SOR-005", "SOR-019").with_base_aspect("Command");
        assert_eq!(normalize_deck(&deck, &t).unwrap().base_key, "Command");
    }

    #[test]
    fn test_missing_leader_has_no_identity() {
        let t = table();
        let deck = DeckRef {
            base_id: Some("SOR-019".to_string()),
            ..Default::default()
        };
        assert!(normalize_deck(&deck, &t).is_none());
        assert!(leader_key(&deck).is_none());
    }

    #[test]
    fn test_unknown_ids_still_normalize() {
        let t = table();
        let deck = DeckRef::new("XYZ-001", "XYZ-100");
        let id = normalize_deck(&deck, &t).unwrap();
        assert_eq!(id.leader_key, "XYZ-001");
        assert_eq!(id.base_key, "XYZ-100");
    }

    #[test]
    fn test_missing_base_still_normalizes() {
        let t = table();
        let deck = DeckRef {
            leader_id: Some("SOR-005".to_string()),
            ..Default::default()
        };
        let id = normalize_deck(&deck, &t).unwrap();
        assert!(id.has_unknown_base());
    }
}
