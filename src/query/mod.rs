//! Read-only access to published snapshots.
//!
//! A [`SnapshotStore`] holds the latest snapshot of every scope behind an
//! `Arc`. Publishing swaps the `Arc`, so readers holding the previous
//! snapshot keep a consistent view while a rebuild is published.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::models::{CardMatchupStat, DeckIdentity, SnapshotScope};
use crate::snapshot::MetaSnapshot;

/// Latest published snapshot per scope.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: RwLock<HashMap<String, Arc<MetaSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Snapshots are replaced whole, so a poisoned lock still guards a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<MetaSnapshot>>> {
        self.latest.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<MetaSnapshot>>> {
        self.latest.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `snapshot` the latest of its scope.
    pub fn publish(&self, snapshot: MetaSnapshot) -> Arc<MetaSnapshot> {
        let snapshot = Arc::new(snapshot);
        let key = snapshot.scope.key();
        info!("Publishing snapshot {} for {}", snapshot.id, key);
        self.write().insert(key, Arc::clone(&snapshot));
        snapshot
    }

    pub fn latest(&self, scope: &SnapshotScope) -> Option<Arc<MetaSnapshot>> {
        self.latest_by_key(&scope.key())
    }

    pub fn latest_by_key(&self, scope_key: &str) -> Option<Arc<MetaSnapshot>> {
        self.read().get(scope_key).cloned()
    }

    /// Scope keys with a published snapshot, sorted.
    pub fn scope_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Read-only queries over the latest snapshots. Queries without a scope
/// read the global snapshot.
#[derive(Debug, Clone)]
pub struct QueryFacade {
    store: Arc<SnapshotStore>,
}

impl QueryFacade {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn latest_snapshot(&self, scope: &SnapshotScope) -> Option<Arc<MetaSnapshot>> {
        self.store.latest(scope)
    }

    /// Record of deck `a` against deck `b` in the global snapshot.
    pub fn matchup_cell(&self, a: &DeckIdentity, b: &DeckIdentity) -> Option<CardMatchupStat> {
        self.matchup_cell_in(&SnapshotScope::Global, a, b)
    }

    pub fn matchup_cell_in(
        &self,
        scope: &SnapshotScope,
        a: &DeckIdentity,
        b: &DeckIdentity,
    ) -> Option<CardMatchupStat> {
        self.latest_snapshot(scope)?.matchup_cell(a, b).copied()
    }

    /// Matchup lookup by identity keys.
    pub fn matchup_cell_by_key_in(
        &self,
        scope: &SnapshotScope,
        a: &str,
        b: &str,
    ) -> Option<CardMatchupStat> {
        self.latest_snapshot(scope)?.matchup_cell_by_key(a, b).copied()
    }

    /// Aggregate record of a card, leader or base id in the global snapshot.
    /// See [`MetaSnapshot::card_stats`] for the lookup order.
    pub fn card_stats(&self, card_id: &str) -> Option<CardMatchupStat> {
        self.card_stats_in(&SnapshotScope::Global, card_id)
    }

    pub fn card_stats_in(&self, scope: &SnapshotScope, card_id: &str) -> Option<CardMatchupStat> {
        self.latest_snapshot(scope)?.card_stats(card_id).copied()
    }
}
