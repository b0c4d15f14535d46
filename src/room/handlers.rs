use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::{
    models::Player,
    types::{CreateRoomRequest, DeleteRoomQuery, JoinRoomRequest, LeaveRoomRequest, RoomResponse},
};
use crate::coordinator::{JoinOutcome, RoomSettings};
use crate::shared::{ApiResponse, AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /api/room/create
/// Returns room information with a generated code
#[instrument(name = "create_room", skip(state, request), fields(host_id = %request.host_id))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomResponse>>), AppError> {
    let room = state
        .coordinator
        .create_room(RoomSettings {
            name: request.room_name,
            capacity: request.max_players,
            password: request.password,
            host_id: request.host_id,
            host_name: request.host_name,
        })
        .await?;

    info!(room_code = %room.code, "Room created successfully");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Room created", RoomResponse::from(&room))),
    ))
}

/// POST /api/room/join
#[instrument(name = "join_room", skip(state, request), fields(room_code = %request.room_code))]
pub async fn join_room(
    State(state): State<AppState>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let outcome = state
        .coordinator
        .join_room(
            &request.room_code,
            &request.player_id,
            &request.player_name,
            request.password.as_deref(),
        )
        .await?;

    let message = match outcome {
        JoinOutcome::Joined(_) => "Joined room",
        JoinOutcome::AlreadyPresent(_) => "Already in room",
    };

    Ok(Json(ApiResponse::ok(
        message,
        RoomResponse::from(outcome.room()),
    )))
}

/// POST /api/room/leave
///
/// `data` is null when the departing player was the last one and the room is gone
#[instrument(name = "leave_room", skip(state, request), fields(room_code = %request.room_code))]
pub async fn leave_room(
    State(state): State<AppState>,
    Json(request): Json<LeaveRoomRequest>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let remaining = state
        .coordinator
        .leave_room(&request.room_code, &request.player_id)
        .await?;

    Ok(Json(match remaining {
        Some(room) => ApiResponse::ok("Left room", RoomResponse::from(&room)),
        None => ApiResponse::ok_empty("Left room, room deleted"),
    }))
}

/// GET /api/room/available
/// Rooms with free seats, newest first
#[instrument(name = "available_rooms", skip(state))]
pub async fn available_rooms(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RoomResponse>>>, AppError> {
    let rooms: Vec<RoomResponse> = state
        .coordinator
        .available_rooms()
        .await
        .iter()
        .map(RoomResponse::from)
        .collect();

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Ok(Json(ApiResponse::ok("Available rooms", rooms)))
}

/// GET /api/room/{code}
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> Result<Json<ApiResponse<RoomResponse>>, AppError> {
    let room = state.coordinator.room(&room_code).await?;
    Ok(Json(ApiResponse::ok("Room found", RoomResponse::from(&room))))
}

/// GET /api/room/{code}/players
#[instrument(name = "room_players", skip(state))]
pub async fn room_players(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> Result<Json<ApiResponse<Vec<Player>>>, AppError> {
    let room = state.coordinator.room(&room_code).await?;
    Ok(Json(ApiResponse::ok("Room players", room.players)))
}

/// DELETE /api/room/{code}?hostId=
/// Only the current host may delete a room
#[instrument(name = "delete_room", skip(state, query))]
pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    Query(query): Query<DeleteRoomQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state
        .coordinator
        .delete_room(&room_code, &query.host_id)
        .await?;

    info!(room_code = %room_code, "Room deleted by host");
    Ok(Json(ApiResponse::ok_empty("Room deleted")))
}
