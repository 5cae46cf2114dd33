use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use super::matchups::ScopeParams;
use crate::aggregate::SubjectStats;
use crate::api::state::AppState;
use crate::api::{resolve_scope, ApiError};
use crate::models::Standing;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderResponse {
    pub scope: String,
    pub leader_id: String,
    #[serde(flatten)]
    pub stats: SubjectStats,
    /// Placement among leaders, when ranked
    pub standing: Option<Standing>,
}

pub async fn get_leader(
    State(state): State<AppState>,
    Path(leader_id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<LeaderResponse>, ApiError> {
    let scope = resolve_scope(params.scope.as_deref())?;

    let not_found =
        || ApiError::NotFound(format!("no stats for leader {} in scope {}", leader_id, scope));
    let snapshot = state.facade.latest_snapshot(&scope).ok_or_else(not_found)?;
    let stats = snapshot.leader(&leader_id).cloned().ok_or_else(not_found)?;
    let standing = snapshot
        .leader_standings
        .iter()
        .find(|s| s.key == leader_id)
        .cloned();

    Ok(Json(LeaderResponse {
        scope: scope.key(),
        leader_id,
        stats,
        standing,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_get_leader() {
        let app = build_router(test_state());
        let (status, json) = get_json(app, "/api/leaders/SOR-005").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["leaderId"], "SOR-005");
        // Mirrors are excluded from a leader's overall record
        assert_eq!(json["overall"]["matchWins"], 2);
        assert_eq!(json["overall"]["matchLosses"], 1);
        let vs_y = &json["byOpponent"]["SHD-010|Command|Command+Heroism"];
        assert_eq!(vs_y["matchWins"], 2);
        assert_eq!(vs_y["total"], 8);
        assert_eq!(json["standing"]["placement"], 1);
    }

    #[tokio::test]
    async fn test_unknown_leader_is_not_found() {
        let app = build_router(test_state());
        let (status, _) = get_json(app, "/api/leaders/SOR-999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
