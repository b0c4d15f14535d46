use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};
use uuid::Uuid;

use super::types::{PlayerResponse, RegisterPlayerRequest, ValidateTokenRequest};
use crate::shared::{ApiResponse, AppError, AppState};

/// HTTP handler for registering a player
///
/// POST /api/player/register
/// Returns a generated player id and a JWT carrying it
#[instrument(name = "register_player", skip(state, request))]
pub async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<RegisterPlayerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlayerResponse>>), AppError> {
    let player_name = request.player_name.trim().to_string();
    if player_name.is_empty() {
        return Err(AppError::BadRequest("Player name is required".to_string()));
    }

    let player_id = Uuid::new_v4().to_string();
    let token = state.tokens.issue(&player_id, &player_name)?;

    info!(player_id = %player_id, "Player registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Player registered successfully",
            PlayerResponse {
                player_id,
                player_name,
                token,
            },
        )),
    ))
}

/// HTTP handler for checking a previously issued token
///
/// POST /api/player/validate
#[instrument(name = "validate_player", skip(state, request))]
pub async fn validate_player(
    State(state): State<AppState>,
    Json(request): Json<ValidateTokenRequest>,
) -> Result<Json<ApiResponse<PlayerResponse>>, AppError> {
    let claims = state.tokens.verify(&request.token)?;

    Ok(Json(ApiResponse::ok(
        "Token is valid",
        PlayerResponse {
            player_id: claims.player_id,
            player_name: claims.player_name,
            token: request.token,
        },
    )))
}
