//! Deck construction, shuffling and the draw pile / discard pile pair.
//!
//! The last element of each pile is its top.

use super::card::{Card, CardId, CardType, Color};
use super::error::GameError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

pub const DECK_SIZE: usize = 108;

/// Wild and wild draw four cards in a deck; none of them may open play.
pub const WILD_CARDS: usize = 8;

/// Builds the canonical 108-card set in a fixed order with ids `0..108`.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    let mut next_id = 0u8;
    let mut push = |deck: &mut Vec<Card>, color: Color, card_type: CardType| {
        deck.push(Card::new(CardId(next_id), color, card_type));
        next_id += 1;
    };

    for color in [Color::Red, Color::Blue, Color::Green, Color::Yellow] {
        // One zero per color
        push(&mut deck, color, CardType::Number(0));

        // Two of each 1-9
        for number in 1..=9 {
            push(&mut deck, color, CardType::Number(number));
            push(&mut deck, color, CardType::Number(number));
        }

        // Two of each action card
        for _ in 0..2 {
            push(&mut deck, color, CardType::Skip);
            push(&mut deck, color, CardType::Reverse);
            push(&mut deck, color, CardType::DrawTwo);
        }
    }

    for _ in 0..4 {
        push(&mut deck, Color::Wild, CardType::Wild);
        push(&mut deck, Color::Wild, CardType::WildDrawFour);
    }

    deck
}

/// Uniform in-place Fisher-Yates shuffle.
pub fn shuffle<R: Rng + ?Sized>(cards: &mut [Card], rng: &mut R) {
    cards.shuffle(rng);
}

/// Face-down pile players draw from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawPile {
    cards: Vec<Card>,
}

impl DrawPile {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Slides a card under the pile.
    pub fn push_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

/// Face-up pile of played cards. Its top decides what can be played next.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscardPile {
    cards: Vec<Card>,
}

impl DiscardPile {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Card> {
        self.cards.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

/// Cards that can still be drawn, counting what a reshuffle would recover.
pub fn drawable(deck: &DrawPile, discard: &DiscardPile) -> usize {
    deck.len() + discard.len().saturating_sub(1)
}

/// Turns everything under the discard top into a freshly shuffled draw pile.
///
/// Played wilds go back colorless.
pub fn reshuffle<R: Rng + ?Sized>(deck: &mut DrawPile, discard: &mut DiscardPile, rng: &mut R) {
    let Some(top) = discard.cards.pop() else {
        return;
    };
    let mut recycled = std::mem::take(&mut discard.cards);
    for card in recycled.iter_mut().filter(|c| c.is_wild()) {
        card.color = Color::Wild;
    }
    shuffle(&mut recycled, rng);
    // Anything still in the draw pile stays on top of the recycled cards
    recycled.append(&mut deck.cards);
    deck.cards = recycled;
    discard.cards.push(top);
}

/// Pops the top of the draw pile, reshuffling the discard pile first when
/// the draw pile is empty.
pub fn draw<R: Rng + ?Sized>(
    deck: &mut DrawPile,
    discard: &mut DiscardPile,
    rng: &mut R,
) -> Result<Card, GameError> {
    if deck.is_empty() {
        reshuffle(deck, discard, rng);
    }
    deck.pop().ok_or(GameError::DeckExhausted)
}
