//! Connection-facing façade over the [`RoomRegistry`].
//!
//! Each request gets exactly one reply on its own connection; state changes
//! are fanned out to everyone in the affected room. Errors only ever go back
//! to the connection that caused them.

use super::card::{Card, Color};
use super::error::GameError;
use super::game::GameEvent;
use super::player::PlayerId;
use super::registry::RoomRegistry;
use super::room::{ChatMessage, RoomCode};
use super::view::{GameView, RoomSummary, RoomView, Snapshot};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outbound queue depth per connection.
pub const OUTBOUND_BUFFER: usize = 256;

/// Error code for frames that are not a well-formed request.
pub const INVALID_REQUEST: &str = "invalid_request";

/// One inbound frame: an optional correlation id plus the operation.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub request_id: Option<u64>,
    #[serde(flatten)]
    pub message: ClientMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        player_name: String,
    },
    JoinRoom {
        room_code: String,
        player_name: String,
    },
    LeaveRoom,
    SetReady {
        is_ready: bool,
    },
    StartGame,
    PlayCard {
        card_index: usize,
        #[serde(default)]
        chosen_color: Option<String>,
    },
    DrawCard,
    ChooseColor {
        color: String,
    },
    SendChatMessage {
        text: String,
    },
    ListRooms,
    GetRoom {
        room_code: String,
    },
}

/// Direct answer to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    RoomCreated { room_code: RoomCode, room: RoomView },
    RoomJoined { room: RoomView },
    RoomList { rooms: Vec<RoomSummary> },
    Room { room: RoomView },
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        player_id: PlayerId,
    },
    Reply {
        request_id: Option<u64>,
        response: Response,
    },
    OperationError {
        request_id: Option<u64>,
        code: String,
        message: String,
    },
    RoomUpdated {
        room: RoomView,
    },
    RoomListUpdated {
        rooms: Vec<RoomSummary>,
    },
    GameStarted {
        game: GameView,
    },
    GameStateUpdated {
        game: GameView,
    },
    /// Sent only to the player who drew.
    CardDrawn {
        card: Card,
    },
    GameEnded {
        winner_id: PlayerId,
        winner_name: String,
    },
    ChatMessage {
        message: ChatMessage,
    },
}

impl ServerMessage {
    pub fn error(request_id: Option<u64>, err: GameError) -> Self {
        ServerMessage::OperationError {
            request_id,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

struct Connection {
    sender: mpsc::Sender<ServerMessage>,
    room: Option<RoomCode>,
}

pub struct SessionHub {
    registry: RoomRegistry,
    connections: DashMap<PlayerId, Connection>,
}

impl SessionHub {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            connections: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Registers a new connection and hands back its id and outbound queue.
    pub fn connect(&self) -> (PlayerId, mpsc::Receiver<ServerMessage>) {
        let player_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(OUTBOUND_BUFFER);
        self.connections
            .insert(player_id, Connection { sender, room: None });
        self.send(player_id, ServerMessage::Connected { player_id });
        info!("connection {} opened", player_id);
        (player_id, receiver)
    }

    /// Drops the connection, leaving its room the same way `leave_room` would.
    pub fn disconnect(&self, player_id: PlayerId) {
        let room = self
            .connections
            .remove(&player_id)
            .and_then(|(_, conn)| conn.room);
        if let Some(code) = room {
            if let Err(err) = self.leave(player_id, &code) {
                debug!("disconnect of {} from {}: {}", player_id, code, err);
            }
            self.broadcast_room_list();
        }
        info!("connection {} closed", player_id);
    }

    /// Answers a frame that could not be parsed as a request.
    pub fn reject_frame(&self, player_id: PlayerId, reason: String) {
        debug!("unparseable frame from {}: {}", player_id, reason);
        self.send(
            player_id,
            ServerMessage::OperationError {
                request_id: None,
                code: INVALID_REQUEST.to_string(),
                message: reason,
            },
        );
    }

    /// Applies one request and sends its reply (or error) to the requester.
    pub fn handle(&self, player_id: PlayerId, request: Request) {
        let reply = match self.dispatch(player_id, request.message) {
            Ok(response) => ServerMessage::Reply {
                request_id: request.request_id,
                response,
            },
            Err(err) => {
                if err.is_internal() {
                    error!("internal error for {}: {}", player_id, err);
                } else {
                    debug!("request from {} refused: {}", player_id, err);
                }
                ServerMessage::error(request.request_id, err)
            }
        };
        self.send(player_id, reply);
    }

    pub fn dispatch(
        &self,
        player_id: PlayerId,
        message: ClientMessage,
    ) -> Result<Response, GameError> {
        match message {
            ClientMessage::CreateRoom { player_name } => {
                if self.current_room(player_id).is_some() {
                    return Err(GameError::AlreadyInRoom);
                }
                let (room_code, snapshot) = self.registry.create_room(player_id, &player_name);
                self.set_room(player_id, Some(room_code.clone()));
                self.broadcast_room_list();
                Ok(Response::RoomCreated {
                    room_code,
                    room: snapshot.room,
                })
            }
            ClientMessage::JoinRoom {
                room_code,
                player_name,
            } => {
                let room_code = super::registry::normalize_room_code(&room_code);
                match self.current_room(player_id) {
                    Some(current) if current != room_code => return Err(GameError::AlreadyInRoom),
                    _ => {}
                }
                let (snapshot, seated) =
                    self.registry
                        .join_room(&room_code, player_id, &player_name)?;
                self.set_room(player_id, Some(room_code));
                if seated {
                    self.publish_room(&snapshot);
                    self.broadcast_room_list();
                }
                Ok(Response::RoomJoined {
                    room: snapshot.room,
                })
            }
            ClientMessage::LeaveRoom => {
                let code = self.require_room(player_id)?;
                self.leave(player_id, &code)?;
                self.broadcast_room_list();
                Ok(Response::Ok)
            }
            ClientMessage::SetReady { is_ready } => {
                let code = self.require_room(player_id)?;
                let snapshot = self.registry.set_ready(&code, player_id, is_ready)?;
                self.publish_room(&snapshot);
                Ok(Response::Ok)
            }
            ClientMessage::StartGame => {
                let code = self.require_room(player_id)?;
                let (_, snapshot) = self.registry.start_game(&code, player_id)?;
                self.publish_room(&snapshot);
                for game in &snapshot.games {
                    self.send(game.viewer, ServerMessage::GameStarted { game: game.clone() });
                }
                self.broadcast_room_list();
                Ok(Response::Ok)
            }
            ClientMessage::PlayCard {
                card_index,
                chosen_color,
            } => {
                let code = self.require_room(player_id)?;
                // Unknown names count as `wild`: refused for a wild card, ignored otherwise
                let chosen_color = chosen_color
                    .as_deref()
                    .map(|c| c.parse::<Color>().unwrap_or(Color::Wild));
                let (event, snapshot) =
                    self.registry
                        .play_card(&code, player_id, card_index, chosen_color)?;
                self.publish_game(&snapshot);
                if let GameEvent::PlayerWins { player_id, .. } = event {
                    self.publish_winner(&snapshot, player_id);
                }
                Ok(Response::Ok)
            }
            ClientMessage::DrawCard => {
                let code = self.require_room(player_id)?;
                let (event, snapshot) = self.registry.draw_card(&code, player_id)?;
                if let GameEvent::CardDrawn { card, .. } = event {
                    self.send(player_id, ServerMessage::CardDrawn { card });
                }
                self.publish_game(&snapshot);
                Ok(Response::Ok)
            }
            ClientMessage::ChooseColor { color } => {
                let code = self.require_room(player_id)?;
                let color = parse_color(&color)?;
                let (_, snapshot) = self.registry.choose_color(&code, player_id, color)?;
                self.publish_game(&snapshot);
                Ok(Response::Ok)
            }
            ClientMessage::SendChatMessage { text } => {
                // Chat from outside a room is dropped without complaint
                let Some(code) = self.current_room(player_id) else {
                    return Ok(Response::Ok);
                };
                if let Some((message, snapshot)) =
                    self.registry.add_message(&code, player_id, &text)?
                {
                    for recipient in snapshot.recipients() {
                        self.send(
                            recipient,
                            ServerMessage::ChatMessage {
                                message: message.clone(),
                            },
                        );
                    }
                }
                Ok(Response::Ok)
            }
            ClientMessage::ListRooms => Ok(Response::RoomList {
                rooms: self.registry.list_rooms(),
            }),
            ClientMessage::GetRoom { room_code } => Ok(Response::Room {
                room: self.registry.room_view(&room_code)?,
            }),
        }
    }

    fn leave(&self, player_id: PlayerId, code: &str) -> Result<(), GameError> {
        self.set_room(player_id, None);
        let (departure, snapshot) = self.registry.leave_room(code, player_id)?;
        if let Some(snapshot) = snapshot {
            self.publish_room(&snapshot);
            if !snapshot.games.is_empty() {
                self.publish_game(&snapshot);
            }
            if let Some(winner) = departure.winner {
                self.publish_winner(&snapshot, winner);
            }
        }
        Ok(())
    }

    fn current_room(&self, player_id: PlayerId) -> Option<RoomCode> {
        self.connections
            .get(&player_id)
            .and_then(|conn| conn.room.clone())
    }

    fn require_room(&self, player_id: PlayerId) -> Result<RoomCode, GameError> {
        self.current_room(player_id).ok_or(GameError::NotInRoom)
    }

    fn set_room(&self, player_id: PlayerId, room: Option<RoomCode>) {
        if let Some(mut conn) = self.connections.get_mut(&player_id) {
            conn.room = room;
        }
    }

    fn send(&self, player_id: PlayerId, message: ServerMessage) {
        let Some(sender) = self
            .connections
            .get(&player_id)
            .map(|conn| conn.sender.clone())
        else {
            return;
        };
        if let Err(err) = sender.try_send(message) {
            warn!("dropping message for {}: {}", player_id, err);
        }
    }

    fn publish_room(&self, snapshot: &Snapshot) {
        for recipient in snapshot.recipients() {
            self.send(
                recipient,
                ServerMessage::RoomUpdated {
                    room: snapshot.room.clone(),
                },
            );
        }
    }

    /// Sends every seated player their own view of the table.
    fn publish_game(&self, snapshot: &Snapshot) {
        for game in &snapshot.games {
            self.send(
                game.viewer,
                ServerMessage::GameStateUpdated { game: game.clone() },
            );
        }
    }

    fn publish_winner(&self, snapshot: &Snapshot, winner_id: PlayerId) {
        let winner_name = snapshot
            .room
            .players
            .iter()
            .find(|p| p.id == winner_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        for recipient in snapshot.recipients() {
            self.send(
                recipient,
                ServerMessage::GameEnded {
                    winner_id,
                    winner_name: winner_name.clone(),
                },
            );
        }
    }

    fn broadcast_room_list(&self) {
        let rooms = self.registry.list_rooms();
        let senders: Vec<_> = self
            .connections
            .iter()
            .map(|conn| conn.sender.clone())
            .collect();
        for sender in senders {
            if let Err(err) = sender.try_send(ServerMessage::RoomListUpdated {
                rooms: rooms.clone(),
            }) {
                warn!("dropping room list update: {}", err);
            }
        }
    }
}

fn parse_color(color: &str) -> Result<Color, GameError> {
    color
        .parse::<Color>()
        .ok()
        .filter(|c| c.is_choosable())
        .ok_or(GameError::InvalidColor)
}
