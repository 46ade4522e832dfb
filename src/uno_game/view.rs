//! Outbound snapshots of a room.
//!
//! Nothing here exposes another player's cards: hands only ever leave the
//! server inside the [`GameView`] addressed to their owner.

use super::card::{Card, CardType, Color};
use super::player::{Player, PlayerId};
use super::room::{ChatMessage, Room, RoomCode, RoomState};
use super::rules::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub card_count: usize,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_host: player.is_host,
            is_ready: player.is_ready,
            card_count: player.hand.len(),
        }
    }
}

/// Public view of a room, safe to send to anyone in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub players: Vec<PlayerView>,
    pub state: RoomState,
    pub messages: Vec<ChatMessage>,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl RoomView {
    pub fn of(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            host_id: room.host_id,
            players: room.players.iter().map(PlayerView::from).collect(),
            state: room.state,
            messages: room.messages.iter().cloned().collect(),
            winner: room.winner,
            created_at: room.created_at,
            version: room.version,
        }
    }
}

/// The table as seen from one seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub code: RoomCode,
    pub viewer: PlayerId,
    pub state: RoomState,
    pub players: Vec<PlayerView>,
    /// The viewer's own cards, in hand order.
    pub hand: Vec<Card>,
    pub top_card: Option<Card>,
    pub current_color: Option<Color>,
    pub current_value: Option<CardType>,
    pub current_player: Option<PlayerId>,
    pub direction: Direction,
    pub deck_count: usize,
    pub discard_count: usize,
    pub pending_color: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub version: u64,
}

impl GameView {
    pub fn for_player(room: &Room, viewer: PlayerId) -> Self {
        let hand = room
            .player(viewer)
            .map(|p| p.hand.clone())
            .unwrap_or_default();
        Self {
            code: room.code.clone(),
            viewer,
            state: room.state,
            players: room.players.iter().map(PlayerView::from).collect(),
            hand,
            top_card: room.discard_pile.top().cloned(),
            current_color: room.current_color,
            current_value: room.current_value,
            current_player: room.current_player_id(),
            direction: room.direction,
            deck_count: room.deck.len(),
            discard_count: room.discard_pile.len(),
            pending_color: room.pending_color,
            winner: room.winner,
            version: room.version,
        }
    }
}

/// Lobby listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub host_name: String,
    pub player_count: usize,
    pub created_at: DateTime<Utc>,
}

impl RoomSummary {
    pub fn of(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            host_name: room
                .host()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            player_count: room.players.len(),
            created_at: room.created_at,
        }
    }
}

/// Everything needed to notify a room after one mutation, captured while
/// the room was still locked.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub room: RoomView,
    /// One view per seated player; empty while in the lobby.
    pub games: Vec<GameView>,
}

impl Snapshot {
    pub fn capture(room: &Room) -> Self {
        let games = if room.state == RoomState::Lobby {
            Vec::new()
        } else {
            room.players
                .iter()
                .map(|p| GameView::for_player(room, p.id))
                .collect()
        };
        Self {
            room: RoomView::of(room),
            games,
        }
    }

    pub fn recipients(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.room.players.iter().map(|p| p.id)
    }
}
