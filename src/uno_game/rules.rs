//! Move legality and the effect each card has on turn order.

use super::card::{Card, CardType, Color};
use serde::{Deserialize, Serialize};

/// Represents the direction of play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn reverse(&self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// A card may be played if it is wild or matches the current color or value.
pub fn is_valid_move(card: &Card, current_color: Color, current_value: CardType) -> bool {
    card.color == Color::Wild || card.color == current_color || card.card_type == current_value
}

/// One seat along `direction`, wrapping around the table.
pub fn step(current: usize, direction: Direction, num_players: usize) -> usize {
    match direction {
        Direction::Clockwise => (current + 1) % num_players,
        Direction::CounterClockwise => (current + num_players - 1) % num_players,
    }
}

/// `steps` single-seat moves along `direction`.
pub fn advance(current: usize, direction: Direction, steps: usize, num_players: usize) -> usize {
    (0..steps).fold(current, |seat, _| step(seat, direction, num_players))
}

/// What resolving a card does to the table once its color is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    /// Flip direction before moving the turn pointer.
    pub reverses: bool,
    /// Cards the next seat draws before the pointer moves.
    pub victim_draws: usize,
    /// Seats the turn pointer moves.
    pub steps: usize,
    /// The player must name a color before the effect applies.
    pub needs_color: bool,
}

impl Effect {
    const fn pass(steps: usize) -> Self {
        Self {
            reverses: false,
            victim_draws: 0,
            steps,
            needs_color: false,
        }
    }
}

pub fn effect_of(card_type: CardType) -> Effect {
    match card_type {
        CardType::Number(_) => Effect::pass(1),
        CardType::Skip => Effect::pass(2),
        // With two players the flip alone hands the turn straight back, so
        // the single step lands on the opponent either way.
        CardType::Reverse => Effect {
            reverses: true,
            ..Effect::pass(1)
        },
        CardType::DrawTwo => Effect {
            victim_draws: 2,
            ..Effect::pass(2)
        },
        CardType::Wild => Effect {
            needs_color: true,
            ..Effect::pass(1)
        },
        CardType::WildDrawFour => Effect {
            needs_color: true,
            victim_draws: 4,
            ..Effect::pass(2)
        },
    }
}
