use async_trait::async_trait;
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::socket::{Connection, MessageHandler};
use crate::coordinator::{ClientCommand, CoordinatorError, SessionCoordinator};
use crate::event::RoomSubscription;
use crate::shared::{AppError, AppState};

/// Parses client frames into commands and hands them to the coordinator
pub struct CommandHandler {
    coordinator: SessionCoordinator,
    session_id: String,
}

impl CommandHandler {
    pub fn new(coordinator: SessionCoordinator, session_id: String) -> Self {
        Self {
            coordinator,
            session_id,
        }
    }
}

#[async_trait]
impl MessageHandler for CommandHandler {
    async fn handle_message(&self, player_id: &str, room_code: &str, message: String) {
        match serde_json::from_str::<ClientCommand>(&message) {
            Ok(command) => {
                debug!(
                    player_id = %player_id,
                    room_code = %room_code,
                    command = command.name(),
                    "Received command"
                );
                self.coordinator
                    .handle_command(room_code, player_id, &self.session_id, command)
                    .await;
            }
            Err(e) => {
                warn!(
                    player_id = %player_id,
                    room_code = %room_code,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.coordinator
                    .broadcaster()
                    .error_to(player_id, "Unrecognized command")
                    .await;
            }
        }
    }
}

/// Picks the token out of `Sec-WebSocket-Protocol`, which may list several values
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("sec-websocket-protocol")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| {
            value
                .split(',')
                .map(str::trim)
                .find(|part| !part.is_empty())
                .map(str::to_string)
        })
}

/// WebSocket endpoint that handles authentication via Sec-WebSocket-Protocol header
/// GET /ws/{room_code} with JWT token in Sec-WebSocket-Protocol header
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_code): Path<String>,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!(room_code = %room_code, "WebSocket connection requested");

    let token = token_from_headers(&headers).ok_or_else(|| {
        warn!("Missing or invalid Sec-WebSocket-Protocol header");
        AppError::Unauthorized("Missing authentication token".to_string())
    })?;
    let claims = app_state.tokens.verify(&token)?;

    if !app_state.coordinator.rooms().room_exists(&room_code).await {
        warn!(room_code = %room_code, "Room not found, rejecting WebSocket connection");
        return Err(CoordinatorError::RoomNotFound(room_code).into());
    }

    info!(
        room_code = %room_code,
        player_id = %claims.player_id,
        "WebSocket authentication successful"
    );

    // Browsers drop the connection unless the offered protocol is echoed back
    Ok(ws.protocols([token]).on_upgrade(move |socket| {
        handle_websocket_connection(socket, room_code, claims.player_id, app_state)
    }))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    room_code: String,
    player_id: String,
    app_state: AppState,
) {
    let connection_id = Uuid::new_v4().to_string();
    info!(
        room_code = %room_code,
        player_id = %player_id,
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connections()
        .add_connection(player_id.clone(), connection_id.clone(), outbound_sender.clone())
        .await;

    let subscription = RoomSubscription::new(
        room_code.clone(),
        player_id.clone(),
        app_state.event_bus().clone(),
    )
    .start(outbound_sender)
    .await;

    let coordinator = app_state.coordinator.clone();

    // A returning member gets its session re-attached and its game snapshot;
    // newcomers have to send JOIN first
    match coordinator
        .attach_session(&room_code, &player_id, &connection_id)
        .await
    {
        Ok(_) => {
            if let Err(e) = coordinator.send_active_game(&room_code, &player_id).await {
                debug!(error = %e, "No game snapshot for reconnecting player");
            }
        }
        Err(e) => debug!(error = %e, "Connected player is not a room member yet"),
    }

    let message_handler = Arc::new(CommandHandler::new(
        coordinator.clone(),
        connection_id.clone(),
    ));

    let connection = Connection::new(
        player_id.clone(),
        room_code.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                room_code = %room_code,
                player_id = %player_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                room_code = %room_code,
                player_id = %player_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    subscription.abort();
    app_state
        .connections()
        .remove_connection(&player_id, &connection_id)
        .await;

    // The player stays in the room, only marked inactive
    if let Err(e) = coordinator
        .detach_session(&room_code, &player_id, &connection_id)
        .await
    {
        debug!(error = %e, "Nothing to detach after disconnect");
    }
}
