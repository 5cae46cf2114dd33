use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{resolve_scope, ApiError};
use crate::models::CardMatchupStat;

#[derive(Debug, Deserialize)]
pub struct ScopeParams {
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupResponse {
    pub scope: String,
    pub deck_a: String,
    pub deck_b: String,
    pub stat: CardMatchupStat,
    pub game_win_rate: f64,
    pub match_win_rate: f64,
}

/// Record of deck identity `deck_a` against `deck_b`, both given as
/// identity keys.
pub async fn get_matchup(
    State(state): State<AppState>,
    Path((deck_a, deck_b)): Path<(String, String)>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<MatchupResponse>, ApiError> {
    let scope = resolve_scope(params.scope.as_deref())?;

    let stat = state
        .facade
        .matchup_cell_by_key_in(&scope, &deck_a, &deck_b)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "no matchup {} vs {} in scope {}",
                deck_a, deck_b, scope
            ))
        })?;

    Ok(Json(MatchupResponse {
        scope: scope.key(),
        deck_a,
        deck_b,
        game_win_rate: stat.game_win_rate(),
        match_win_rate: stat.match_win_rate(),
        stat,
    }))
}

#[cfg(test)]
mod tests {
    use crate::aggregate::fixtures::{deck_x, deck_y, deck_z, table};
    use crate::api::build_router;
    use crate::api::test_support::*;
    use crate::normalize::normalize_deck;
    use axum::http::StatusCode;

    fn key_of(deck: crate::models::DeckRef) -> String {
        encode_key(&normalize_deck(&deck, &table()).unwrap().key())
    }

    #[tokio::test]
    async fn test_get_matchup_cell() {
        let app = build_router(test_state());
        let uri = format!("/api/matchups/{}/{}", key_of(deck_x()), key_of(deck_y()));
        let (status, json) = get_json(app, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["scope"], "global");
        assert_eq!(json["deckA"], "SOR-005|Vigilance|Vigilance+Villainy");
        assert_eq!(json["stat"]["total"], 8);
        assert_eq!(json["stat"]["gameWins"], 4);
        assert_eq!(json["stat"]["gameLosses"], 4);
        assert_eq!(json["stat"]["matchWins"], 2);
        assert_eq!(json["stat"]["matchLosses"], 1);
        assert!(json["stat"].get("mirrorMatches").is_none());
    }

    #[tokio::test]
    async fn test_get_mirror_cell() {
        let app = build_router(test_state());
        let x = key_of(deck_x());
        let (status, json) = get_json(app, &format!("/api/matchups/{}/{}", x, x)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stat"]["total"], 3);
        assert_eq!(json["stat"]["matchDraws"], 1);
    }

    #[tokio::test]
    async fn test_unplayed_matchup_is_not_found() {
        let app = build_router(test_state());
        let uri = format!("/api/matchups/{}/{}", key_of(deck_x()), key_of(deck_z()));
        let (status, json) = get_json(app, &uri).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_matchup_in_empty_scope() {
        let app = build_router(test_state());
        let uri = format!(
            "/api/matchups/{}/{}?scope=tournament-t-1",
            key_of(deck_x()),
            key_of(deck_y())
        );
        let (status, _) = get_json(app, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
