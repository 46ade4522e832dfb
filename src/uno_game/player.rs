use super::card::Card;
use super::error::GameError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection-scoped identity handed out by the transport layer.
pub type PlayerId = Uuid;

const MAX_NAME_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, is_host: bool) -> Self {
        Self {
            id,
            name: normalize_name(name),
            is_host,
            is_ready: false,
            hand: Vec::new(),
        }
    }

    /// Adds a card to the player's hand.
    pub fn add_card(&mut self, card: Card) {
        self.hand.push(card);
    }

    /// Looks at the card at `card_index` without taking it.
    pub fn card(&self, card_index: usize) -> Result<&Card, GameError> {
        self.hand.get(card_index).ok_or(GameError::InvalidCardIndex)
    }

    /// Removes a card from the player's hand at the specified index.
    pub fn remove_card(&mut self, card_index: usize) -> Result<Card, GameError> {
        if card_index < self.hand.len() {
            Ok(self.hand.remove(card_index))
        } else {
            Err(GameError::InvalidCardIndex)
        }
    }

    /// Checks if the player has won (i.e., their hand is empty).
    pub fn has_won(&self) -> bool {
        self.hand.is_empty()
    }
}

/// Trims and bounds a display name, falling back to "Player".
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}
