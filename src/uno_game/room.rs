//! A room: its seats, lobby lifecycle and chat.
//!
//! Turn-by-turn play lives in [`super::game`].

use super::card::{CardType, Color};
use super::deck::{DiscardPile, DrawPile};
use super::error::GameError;
use super::player::{PlayerId, Player};
use super::rules::Direction;
use crate::config::RoomConfig;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};
use uuid::Uuid;

pub type RoomCode = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Lobby,
    Playing,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// What a departure changed, for the caller to report.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub player: Player,
    pub new_host: Option<PlayerId>,
    /// Set when the departure left too few players to continue.
    pub winner: Option<PlayerId>,
    pub room_empty: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: PlayerId,
    /// Seating order, which is also join order and turn order.
    pub players: Vec<Player>,
    pub state: RoomState,
    pub deck: DrawPile,
    pub discard_pile: DiscardPile,
    pub current_player: Option<usize>,
    pub direction: Direction,
    pub current_color: Option<Color>,
    pub current_value: Option<CardType>,
    /// Player who still has to name a color for the wild on top.
    pub pending_color: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub messages: VecDeque<ChatMessage>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every accepted mutation so clients can drop stale snapshots.
    pub version: u64,
    pub(super) config: RoomConfig,
    pub(super) rng: StdRng,
    /// Set once the last player leaves; a closed room accepts nobody.
    pub(super) closed: bool,
}

impl Room {
    pub fn new(
        code: RoomCode,
        host_id: PlayerId,
        host_name: &str,
        config: RoomConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            code,
            host_id,
            players: vec![Player::new(host_id, host_name, true)],
            state: RoomState::Lobby,
            deck: DrawPile::default(),
            discard_pile: DiscardPile::default(),
            current_player: None,
            direction: Direction::Clockwise,
            current_color: None,
            current_value: None,
            pending_color: None,
            winner: None,
            messages: VecDeque::new(),
            created_at: Utc::now(),
            version: 0,
            config,
            rng,
            closed: false,
        }
    }

    pub fn player_index(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.player(self.host_id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player
            .and_then(|seat| self.players.get(seat))
            .map(|p| p.id)
    }

    /// Every card held, stacked or discarded. 108 for the whole of a game.
    pub fn cards_in_play(&self) -> usize {
        self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + self.deck.len()
            + self.discard_pile.len()
    }

    /// Seats a new player. Joining again with a seated id is a no-op.
    pub fn join(&mut self, player_id: PlayerId, name: &str) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::RoomNotFound);
        }
        if self.player_index(player_id).is_some() {
            return Ok(());
        }
        if self.state != RoomState::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull);
        }

        let player = Player::new(player_id, name, false);
        info!("{} joined room {}", player.name, self.code);
        self.players.push(player);
        Ok(())
    }

    pub fn set_ready(&mut self, player_id: PlayerId, is_ready: bool) -> Result<(), GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        player.is_ready = is_ready;
        debug!("{} in room {} ready={}", player.name, self.code, is_ready);
        Ok(())
    }

    /// Removes a player, keeping host, turn pointer and card count consistent.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Departure, GameError> {
        let seat = self
            .player_index(player_id)
            .ok_or(GameError::PlayerNotFound)?;
        let mut player = self.players.remove(seat);

        // The departing hand goes under the draw pile so no card is lost
        for card in player.hand.drain(..) {
            self.deck.push_bottom(card);
        }

        if self.players.is_empty() {
            self.closed = true;
            info!("room {} is empty", self.code);
            return Ok(Departure {
                player,
                new_host: None,
                winner: None,
                room_empty: true,
            });
        }

        let new_host = if self.host_id == player_id {
            let heir = &mut self.players[0];
            heir.is_host = true;
            self.host_id = heir.id;
            info!("host of room {} passed to {}", self.code, heir.name);
            Some(heir.id)
        } else {
            None
        };

        let winner = if self.state == RoomState::Playing {
            self.repair_after_departure(seat, player_id)
        } else {
            None
        };

        Ok(Departure {
            player,
            new_host,
            winner,
            room_empty: false,
        })
    }

    /// Fixes the turn state after the player at `seat` has been removed.
    /// Returns the winner if the game cannot go on.
    fn repair_after_departure(&mut self, seat: usize, player_id: PlayerId) -> Option<PlayerId> {
        if self.players.len() < 2 {
            let last = self.players[0].id;
            self.finish_game(last);
            return Some(last);
        }

        if self.pending_color == Some(player_id) {
            let color = *Color::CHOOSABLE
                .choose(&mut self.rng)
                .unwrap_or(&Color::Red);
            self.set_color(color);
            self.pending_color = None;
            debug!("room {}: wild color defaulted to {}", self.code, color);
        }

        let num_players = self.players.len();
        let current = self.current_player.unwrap_or(0);
        let next = if seat < current {
            current - 1
        } else if seat == current {
            // The turn moves on to whoever was next, not back to the seat before
            match self.direction {
                Direction::Clockwise => seat % num_players,
                Direction::CounterClockwise => (seat + num_players - 1) % num_players,
            }
        } else {
            current
        };
        self.current_player = Some(next);
        None
    }

    /// Appends a chat line. Blank text is dropped without error.
    pub fn add_message(
        &mut self,
        player_id: PlayerId,
        text: &str,
    ) -> Result<Option<ChatMessage>, GameError> {
        let player = self.player(player_id).ok_or(GameError::PlayerNotFound)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            player_id,
            player_name: player.name.clone(),
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        self.messages.push_back(message.clone());
        while self.messages.len() > self.config.max_chat_history {
            self.messages.pop_front();
        }
        Ok(Some(message))
    }
}
