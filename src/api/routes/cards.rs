use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use super::matchups::ScopeParams;
use crate::aggregate::CardStatLine;
use crate::api::state::AppState;
use crate::api::{resolve_scope, ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub scope: String,
    pub card_id: String,
    #[serde(flatten)]
    pub line: CardStatLine,
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<CardResponse>, ApiError> {
    let scope = resolve_scope(params.scope.as_deref())?;

    let line = state
        .facade
        .latest_snapshot(&scope)
        .and_then(|snapshot| snapshot.card_line(&card_id))
        .ok_or_else(|| {
            ApiError::NotFound(format!("no stats for card {} in scope {}", card_id, scope))
        })?;

    Ok(Json(CardResponse {
        scope: scope.key(),
        card_id,
        line,
    }))
}
