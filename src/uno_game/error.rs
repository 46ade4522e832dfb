use serde::Serialize;
use thiserror::Error;

/// Every way a room operation can be refused.
///
/// A refused operation never mutates the room it was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("already in a room")]
    AlreadyInRoom,
    #[error("not in a room")]
    NotInRoom,
    #[error("player is not in this room")]
    PlayerNotFound,
    #[error("game has already started")]
    GameAlreadyStarted,
    #[error("no game in progress")]
    GameNotInProgress,
    #[error("only the host can start the game")]
    NotHost,
    #[error("not enough players to start")]
    NotEnoughPlayers,
    #[error("not every player is ready")]
    NotAllReady,
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid card index")]
    InvalidCardIndex,
    #[error("invalid move")]
    InvalidMove,
    #[error("waiting for a wild color to be chosen")]
    ColorChoicePending,
    #[error("no color choice is pending")]
    NotWaitingForColor,
    #[error("invalid color")]
    InvalidColor,
    #[error("deck exhausted")]
    DeckExhausted,
}

impl GameError {
    /// Stable identifier sent to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "room_not_found",
            GameError::RoomFull => "room_full",
            GameError::AlreadyInRoom => "already_in_room",
            GameError::NotInRoom => "not_in_room",
            GameError::PlayerNotFound => "player_not_found",
            GameError::GameAlreadyStarted => "game_already_started",
            GameError::GameNotInProgress => "game_not_in_progress",
            GameError::NotHost => "not_host",
            GameError::NotEnoughPlayers => "not_enough_players",
            GameError::NotAllReady => "not_all_ready",
            GameError::NotYourTurn => "not_your_turn",
            GameError::InvalidCardIndex => "invalid_card_index",
            GameError::InvalidMove => "invalid_move",
            GameError::ColorChoicePending => "color_choice_pending",
            GameError::NotWaitingForColor => "not_waiting_for_color",
            GameError::InvalidColor => "invalid_color",
            GameError::DeckExhausted => "deck_exhausted",
        }
    }

    /// Errors that point at a broken invariant rather than a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(self, GameError::DeckExhausted)
    }
}
