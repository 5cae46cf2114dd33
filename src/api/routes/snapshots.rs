use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{SnapshotId, SnapshotScope};
use crate::snapshot::MetaSnapshot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub scope: String,
    pub id: SnapshotId,
    pub generated_at: DateTime<Utc>,
    pub match_count: u64,
    pub skipped_count: u64,
}

#[derive(Debug, Serialize)]
pub struct SnapshotsResponse {
    pub snapshots: Vec<SnapshotSummary>,
}

pub async fn list_snapshots(State(state): State<AppState>) -> Json<SnapshotsResponse> {
    let store = state.facade.store();
    let snapshots = store
        .scope_keys()
        .into_iter()
        .filter_map(|key| store.latest_by_key(&key))
        .map(|s| SnapshotSummary {
            scope: s.scope.key(),
            id: s.id.clone(),
            generated_at: s.generated_at,
            match_count: s.match_count,
            skipped_count: s.skipped_count,
        })
        .collect();

    Json(SnapshotsResponse { snapshots })
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(scope_key): Path<String>,
) -> Result<Json<MetaSnapshot>, ApiError> {
    let scope = SnapshotScope::from_key(&scope_key)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid scope '{}'", scope_key)))?;

    let snapshot = state
        .facade
        .latest_snapshot(&scope)
        .ok_or_else(|| ApiError::NotFound(format!("no snapshot for scope {}", scope_key)))?;

    Ok(Json(MetaSnapshot::clone(&snapshot)))
}
