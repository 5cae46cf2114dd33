//! Week-over-week comparison of two snapshots.

use std::collections::{BTreeSet, HashMap};

use super::MetaSnapshot;
use crate::models::{
    ArrowDirection, DeltaOutcome, PlacementDelta, SetShare, ShareDelta, SnapshotDelta, Standing,
};

/// Compare `current` against an earlier snapshot.
///
/// Snapshots of different scopes are not comparable and yield
/// [`DeltaOutcome::NoComparableSnapshot`].
pub fn compare_snapshots(previous: &MetaSnapshot, current: &MetaSnapshot) -> DeltaOutcome {
    if previous.scope != current.scope {
        return DeltaOutcome::NoComparableSnapshot {
            expected: current.scope.key(),
            found: previous.scope.key(),
        };
    }

    DeltaOutcome::Computed(SnapshotDelta {
        previous_id: previous.id.clone(),
        previous_generated_at: previous.generated_at,
        decks: placement_deltas(&previous.deck_standings, &current.deck_standings),
        leaders: placement_deltas(&previous.leader_standings, &current.leader_standings),
        set_share: share_deltas(&previous.set_share, &current.set_share),
        block_share: share_deltas(&previous.block_share, &current.block_share),
    })
}

/// Placement changes for entries present in both standings, in current order.
pub fn placement_deltas(before: &[Standing], now: &[Standing]) -> Vec<PlacementDelta> {
    let before: HashMap<&str, u32> = before
        .iter()
        .map(|s| (s.key.as_str(), s.placement))
        .collect();

    now.iter()
        .filter_map(|s| {
            let placement_before = *before.get(s.key.as_str())?;
            Some(PlacementDelta {
                key: s.key.clone(),
                placement_now: s.placement,
                placement_before,
                arrow_direction: ArrowDirection::between(placement_before, s.placement),
            })
        })
        .collect()
}

/// Share changes in percentage points over the union of keys, sorted by key.
/// A key missing from one side counts as zero share there.
pub fn share_deltas(before: &SetShare, now: &SetShare) -> Vec<ShareDelta> {
    let keys: BTreeSet<&str> = before
        .entries
        .iter()
        .chain(now.entries.iter())
        .map(|e| e.key.as_str())
        .collect();

    keys.into_iter()
        .map(|key| {
            let share_before = before.percentage_of(key);
            let share_now = now.percentage_of(key);
            ShareDelta {
                key: key.to_string(),
                share_now,
                share_before,
                delta: share_now - share_before,
            }
        })
        .collect()
}
