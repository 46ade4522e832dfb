use super::error::GameError;
use super::registry::RoomRegistry;
use super::session::{Request, SessionHub};
use crate::config::ServerConfig;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SessionHub>,
}

impl AppState {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            hub: Arc::new(SessionHub::new(registry)),
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match self {
            GameError::RoomNotFound | GameError::PlayerNotFound => StatusCode::NOT_FOUND,
            GameError::DeckExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::RoomFull
            | GameError::AlreadyInRoom
            | GameError::GameAlreadyStarted
            | GameError::ColorChoicePending => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = json!({ "code": self.code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub async fn list_rooms(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.registry().list_rooms())
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    Ok(Json(state.hub.registry().room_view(&code)?))
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Runs one connection: a writer task drains the outbound queue while this
/// task feeds inbound frames to the hub.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (player_id, mut outbound) = state.hub.connect();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("failed to encode message for {}: {}", player_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            Message::Text(text) => match serde_json::from_str::<Request>(text.as_str()) {
                Ok(request) => state.hub.handle(player_id, request),
                Err(e) => state.hub.reject_frame(player_id, e.to_string()),
            },
            Message::Binary(_) => {
                state
                    .hub
                    .reject_frame(player_id, "binary frames are not supported".to_string());
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Dropping the connection's sender ends the writer
    state.hub.disconnect(player_id);
    if let Err(e) = writer.await {
        warn!("writer for {} ended abnormally: {}", player_id, e);
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::permissive();
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_response(DefaultOnResponse::new().include_headers(true));

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/rooms", get(list_rooms))
        .route("/rooms/{code}", get(get_room))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

pub async fn start_api_server(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting UNO room server...");
    let room_config = config.room_config()?;
    let state = AppState::new(RoomRegistry::new(room_config));

    let listener = TcpListener::bind(config.bind).await?;
    info!("Listening on http://{} (WebSocket at /ws)", listener.local_addr()?);
    serve(listener, state).await?;

    Ok(())
}
