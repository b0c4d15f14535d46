use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::collections::HashMap;
use tracing::{info, instrument};

use super::{
    models::GameView,
    types::{
        ActiveGameQuery, FinishGameRequest, GameHistoryEntry, GameStartedResponse,
        StartGameRequest, VoteRequest,
    },
    words::Category,
};
use crate::shared::{ApiResponse, AppError, AppState};

/// GET /api/game/{code}/active?playerId=
///
/// The running game as the given player may see it; `data` is null when
/// nothing is running or the player is not part of it.
#[instrument(name = "active_game", skip(state, query))]
pub async fn active_game(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    Query(query): Query<ActiveGameQuery>,
) -> Result<Json<ApiResponse<GameView>>, AppError> {
    let view = state
        .coordinator
        .active_game_view(&room_code, &query.player_id)
        .await?;

    Ok(Json(match view {
        Some(view) => ApiResponse::ok("Active game", view),
        None => ApiResponse::ok_empty("No active game"),
    }))
}

/// GET /api/game/{code}/history
#[instrument(name = "game_history", skip(state))]
pub async fn game_history(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> Result<Json<ApiResponse<Vec<GameHistoryEntry>>>, AppError> {
    let games = state.coordinator.game_history(&room_code).await?;
    let entries: Vec<GameHistoryEntry> = games.iter().map(GameHistoryEntry::from).collect();

    Ok(Json(ApiResponse::ok("Game history", entries)))
}

/// POST /api/game/{code}/start
/// Body is optional: `{ "triggeredBy": "<playerId>" }`
#[instrument(name = "start_game", skip(state, request))]
pub async fn start_game(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    request: Option<Json<StartGameRequest>>,
) -> Result<Json<ApiResponse<GameStartedResponse>>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let game = state
        .coordinator
        .start_game(&room_code, request.triggered_by.as_deref())
        .await?;

    info!(game_id = %game.id, "Game started over HTTP");
    Ok(Json(ApiResponse::ok(
        "Game started",
        GameStartedResponse::from(&game),
    )))
}

/// POST /api/game/{code}/finish
/// Body is optional: `{ "citizensAnsweredCorrectly": true }`
#[instrument(name = "finish_game", skip(state, request))]
pub async fn finish_game(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    request: Option<Json<FinishGameRequest>>,
) -> Result<Json<ApiResponse<GameHistoryEntry>>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let game = state
        .coordinator
        .finish_game(
            &room_code,
            request.citizens_answered_correctly.unwrap_or(false),
        )
        .await?;

    info!(game_id = %game.id, "Game finished over HTTP");
    Ok(Json(ApiResponse::ok(
        "Game finished",
        GameHistoryEntry::from(&game),
    )))
}

/// POST /api/game/{code}/vote
/// Returns the current tally
#[instrument(name = "cast_vote", skip(state, request))]
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<ApiResponse<HashMap<String, u32>>>, AppError> {
    let tally = state
        .coordinator
        .cast_vote(&room_code, &request.voter_id, &request.target_id)
        .await?;

    Ok(Json(ApiResponse::ok("Vote recorded", tally)))
}

/// GET /api/category/all
#[instrument(name = "list_categories", skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let categories = state.coordinator.word_source().categories();
    Ok(Json(ApiResponse::ok("Categories", categories)))
}
