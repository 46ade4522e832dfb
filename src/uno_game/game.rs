//! The turn state machine: lobby -> playing -> ended.

use super::card::{Card, Color};
use super::deck::{build_deck, draw, drawable, shuffle, DrawPile, DECK_SIZE, WILD_CARDS};
use super::error::GameError;
use super::player::PlayerId;
use super::room::{Room, RoomState};
use super::rules::{advance, effect_of, is_valid_move, step, Direction, Effect};
use tracing::{debug, info};

/// Cards forced on the next player by a draw-two or wild draw four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalty {
    pub player_id: PlayerId,
    pub cards: usize,
}

/// What a successful turn operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        first_player: PlayerId,
        top_card: Card,
    },
    CardPlayed {
        player_id: PlayerId,
        card: Card,
        penalty: Option<Penalty>,
    },
    /// A wild was played without a color; the player must choose one.
    ColorRequested {
        player_id: PlayerId,
        card: Card,
    },
    ColorChosen {
        player_id: PlayerId,
        color: Color,
        penalty: Option<Penalty>,
    },
    CardDrawn {
        player_id: PlayerId,
        card: Card,
    },
    PlayerWins {
        player_id: PlayerId,
        card: Card,
    },
}

impl Room {
    /// Deals a fresh game. Host only; needs enough players, all ready.
    pub fn start_game(&mut self, by: PlayerId) -> Result<GameEvent, GameError> {
        if self.state != RoomState::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.player_index(by).is_none() {
            return Err(GameError::PlayerNotFound);
        }
        if by != self.host_id {
            return Err(GameError::NotHost);
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers);
        }
        if !self.players.iter().all(|p| p.is_ready) {
            return Err(GameError::NotAllReady);
        }
        if self.players.len() * self.config.hand_size + WILD_CARDS + 1 > DECK_SIZE {
            return Err(GameError::DeckExhausted);
        }

        let mut cards = build_deck();
        shuffle(&mut cards, &mut self.rng);
        self.deck = DrawPile::new(cards);
        self.discard_pile.clear();

        // Deal one card at a time in seating order
        for _ in 0..self.config.hand_size {
            for player in self.players.iter_mut() {
                let card = self.deck.pop().ok_or(GameError::DeckExhausted)?;
                player.add_card(card);
            }
        }

        // Wilds cannot open the discard pile; they go under the draw pile
        let mut opening = None;
        for _ in 0..self.deck.len() {
            let card = self.deck.pop().ok_or(GameError::DeckExhausted)?;
            if !card.is_wild() {
                opening = Some(card);
                break;
            }
            self.deck.push_bottom(card);
        }
        let top_card = opening.ok_or(GameError::DeckExhausted)?;

        self.current_color = Some(top_card.color);
        self.current_value = Some(top_card.card_type);
        self.discard_pile.push(top_card.clone());
        self.current_player = Some(0);
        self.direction = Direction::Clockwise;
        self.pending_color = None;
        self.winner = None;
        self.state = RoomState::Playing;

        let first_player = self.players[0].id;
        info!(
            "game started in room {} with {} players, top card {}",
            self.code,
            self.players.len(),
            top_card
        );
        Ok(GameEvent::GameStarted {
            first_player,
            top_card,
        })
    }

    /// Plays the card at `card_index` from the acting player's hand.
    ///
    /// `chosen_color` settles a wild immediately; without it the room waits
    /// for [`Room::choose_color`]. It is ignored for colored cards.
    pub fn play_card(
        &mut self,
        player_id: PlayerId,
        card_index: usize,
        chosen_color: Option<Color>,
    ) -> Result<GameEvent, GameError> {
        let seat = self.turn_seat(player_id)?;
        let (current_color, current_value) = match (self.current_color, self.current_value) {
            (Some(color), Some(value)) => (color, value),
            _ => return Err(GameError::GameNotInProgress),
        };

        let card = self.players[seat].card(card_index)?;
        if !is_valid_move(card, current_color, current_value) {
            return Err(GameError::InvalidMove);
        }
        let is_wild = card.is_wild();
        let chosen_color = if is_wild { chosen_color } else { None };
        if chosen_color.is_some_and(|c| !c.is_choosable()) {
            return Err(GameError::InvalidColor);
        }

        let effect = effect_of(card.card_type);
        let wins = self.players[seat].hand.len() == 1;
        let resolves_now = !is_wild || chosen_color.is_some();
        // Once played, the current top becomes recyclable too
        if !wins && resolves_now && effect.victim_draws > self.deck.len() + self.discard_pile.len()
        {
            return Err(GameError::DeckExhausted);
        }

        // Validation is done; from here on the move is applied
        let card = self.players[seat].remove_card(card_index)?;
        self.discard_pile.push(card.clone());
        self.current_value = Some(card.card_type);
        self.current_color = if is_wild { None } else { Some(card.color) };
        if let Some(color) = chosen_color {
            self.set_color(color);
        }
        debug!("room {}: {} played {}", self.code, self.players[seat].name, card);

        if self.players[seat].has_won() {
            // A colorless winning wild leaves the previous color in place
            if self.current_color.is_none() {
                self.current_color = Some(current_color);
            }
            self.finish_game(player_id);
            return Ok(GameEvent::PlayerWins { player_id, card });
        }

        if is_wild && chosen_color.is_none() {
            self.pending_color = Some(player_id);
            return Ok(GameEvent::ColorRequested { player_id, card });
        }

        let penalty = self.resolve_effect(seat, effect)?;
        Ok(GameEvent::CardPlayed {
            player_id,
            card,
            penalty,
        })
    }

    /// Draws one card for the acting player and ends their turn.
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<GameEvent, GameError> {
        let seat = self.turn_seat(player_id)?;
        let card = draw(&mut self.deck, &mut self.discard_pile, &mut self.rng)?;
        self.players[seat].add_card(card.clone());
        self.current_player = Some(step(seat, self.direction, self.players.len()));
        debug!("room {}: {} drew a card", self.code, self.players[seat].name);
        Ok(GameEvent::CardDrawn { player_id, card })
    }

    /// Names the color of the wild on top of the discard pile and applies
    /// the rest of its effect.
    pub fn choose_color(&mut self, player_id: PlayerId, color: Color) -> Result<GameEvent, GameError> {
        if self.state != RoomState::Playing {
            return Err(GameError::GameNotInProgress);
        }
        match self.pending_color {
            None => return Err(GameError::NotWaitingForColor),
            Some(owner) if owner != player_id => return Err(GameError::NotYourTurn),
            Some(_) => {}
        }
        if !color.is_choosable() {
            return Err(GameError::InvalidColor);
        }
        let (seat, effect) = match (self.player_index(player_id), self.discard_pile.top()) {
            (Some(seat), Some(top)) => (seat, effect_of(top.card_type)),
            _ => return Err(GameError::PlayerNotFound),
        };
        if effect.victim_draws > drawable(&self.deck, &self.discard_pile) {
            return Err(GameError::DeckExhausted);
        }

        self.set_color(color);
        self.pending_color = None;
        debug!("room {}: color set to {}", self.code, color);

        let penalty = self.resolve_effect(seat, effect)?;
        Ok(GameEvent::ColorChosen {
            player_id,
            color,
            penalty,
        })
    }

    /// Seat of `player_id` if they may take a turn action right now.
    fn turn_seat(&self, player_id: PlayerId) -> Result<usize, GameError> {
        if self.state != RoomState::Playing {
            return Err(GameError::GameNotInProgress);
        }
        let seat = self
            .player_index(player_id)
            .ok_or(GameError::PlayerNotFound)?;
        if self.pending_color.is_some() {
            return Err(GameError::ColorChoicePending);
        }
        if self.current_player != Some(seat) {
            return Err(GameError::NotYourTurn);
        }
        Ok(seat)
    }

    /// Applies direction, penalty draws and pointer movement for a card
    /// played from `seat`.
    fn resolve_effect(&mut self, seat: usize, effect: Effect) -> Result<Option<Penalty>, GameError> {
        let num_players = self.players.len();
        if effect.reverses {
            self.direction = self.direction.reverse();
        }

        let penalty = if effect.victim_draws > 0 {
            let victim = step(seat, self.direction, num_players);
            for _ in 0..effect.victim_draws {
                let card = draw(&mut self.deck, &mut self.discard_pile, &mut self.rng)?;
                self.players[victim].add_card(card);
            }
            Some(Penalty {
                player_id: self.players[victim].id,
                cards: effect.victim_draws,
            })
        } else {
            None
        };

        self.current_player = Some(advance(seat, self.direction, effect.steps, num_players));
        Ok(penalty)
    }

    /// Colors the wild on top of the discard pile.
    pub(super) fn set_color(&mut self, color: Color) {
        if let Some(top) = self.discard_pile.top_mut() {
            top.color = color;
        }
        self.current_color = Some(color);
    }

    pub(super) fn finish_game(&mut self, winner: PlayerId) {
        self.state = RoomState::Ended;
        self.winner = Some(winner);
        self.current_player = None;
        self.pending_color = None;
        let name = self
            .player(winner)
            .map(|p| p.name.as_str())
            .unwrap_or("unknown");
        info!("game in room {} won by {}", self.code, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uno_game::card::{CardId, CardType};
    use crate::uno_game::room::tests::room_with;
    use uuid::Uuid;

    /// Everything a failed operation must leave untouched.
    fn fingerprint(room: &Room) -> String {
        format!(
            "{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
            room.players,
            room.deck,
            room.discard_pile,
            room.current_player,
            room.direction,
            room.current_color,
            room.current_value,
            room.pending_color,
            room.state
        )
    }

    fn started(names: &[&str]) -> (Room, Vec<PlayerId>) {
        let (mut room, ids) = room_with(names);
        for id in &ids {
            room.set_ready(*id, true).unwrap();
        }
        room.start_game(ids[0]).unwrap();
        (room, ids)
    }

    /// Puts a known card on top of the discard pile, keeping the 108-card
    /// set intact.
    fn force_top(room: &mut Room, color: Color, card_type: CardType) {
        let card = take_card(room, &|c: &Card| c.color == color && c.card_type == card_type);
        room.discard_pile.push(card);
        room.current_color = Some(color);
        room.current_value = Some(card_type);
    }

    fn take_from_deck(room: &mut Room, pred: &dyn Fn(&Card) -> bool) -> Option<Card> {
        let mut rest = Vec::new();
        let mut found = None;
        while let Some(card) = room.deck.pop() {
            if found.is_none() && pred(&card) {
                found = Some(card);
            } else {
                rest.push(card);
            }
        }
        for card in rest {
            room.deck.push_bottom(card);
        }
        found
    }

    /// Takes a matching card from the draw pile, or swaps one out of a hand
    /// for the top of the draw pile when none is left there.
    fn take_card(room: &mut Room, pred: &dyn Fn(&Card) -> bool) -> Card {
        if let Some(card) = take_from_deck(room, pred) {
            return card;
        }
        let spare = room.deck.pop().expect("draw pile is empty");
        for player in room.players.iter_mut() {
            if let Some(pos) = player.hand.iter().position(|c| pred(c)) {
                return std::mem::replace(&mut player.hand[pos], spare);
            }
        }
        panic!("no matching card outside the discard pile");
    }

    /// Moves a matching card from the draw pile into a player's hand and
    /// returns its index there.
    fn give(room: &mut Room, seat: usize, pred: impl Fn(&Card) -> bool) -> usize {
        let card = take_card(room, &pred);
        room.players[seat].add_card(card);
        room.players[seat].hand.len() - 1
    }

    /// Drops every card but one into the draw pile.
    fn leave_one_card(room: &mut Room, seat: usize, pred: impl Fn(&Card) -> bool) -> usize {
        let index = give(room, seat, pred);
        let keep = room.players[seat].hand.remove(index);
        for card in room.players[seat].hand.drain(..) {
            room.deck.push_bottom(card);
        }
        room.players[seat].hand.push(keep);
        0
    }

    #[test]
    fn test_start_three_player_game() {
        let (room, _) = started(&["Alice", "Bob", "Carol"]);

        assert_eq!(room.state, RoomState::Playing);
        assert!(room.players.iter().all(|p| p.hand.len() == 7));
        assert_eq!(room.deck.len(), 108 - 21 - 1);
        assert_eq!(room.discard_pile.len(), 1);
        assert_eq!(room.current_player, Some(0));
        assert_eq!(room.direction, Direction::Clockwise);
        assert_eq!(room.cards_in_play(), DECK_SIZE);

        let top = room.discard_pile.top().unwrap();
        assert!(!top.is_wild());
        assert_eq!(room.current_color, Some(top.color));
        assert_eq!(room.current_value, Some(top.card_type));
    }

    #[test]
    fn test_start_gating() {
        let (mut room, ids) = room_with(&["Alice", "Bob"]);
        room.set_ready(ids[0], true).unwrap();

        assert_eq!(room.start_game(ids[1]), Err(GameError::NotHost));
        assert_eq!(room.start_game(ids[0]), Err(GameError::NotAllReady));

        room.set_ready(ids[1], true).unwrap();
        assert!(room.start_game(ids[0]).is_ok());
        assert_eq!(room.start_game(ids[0]), Err(GameError::GameAlreadyStarted));
    }

    #[test]
    fn test_start_refuses_deal_without_opening_card() {
        let (mut room, ids) = room_with(&["Alice", "Bob"]);
        room.config.hand_size = 50;
        for id in &ids {
            room.set_ready(*id, true).unwrap();
        }
        assert_eq!(room.start_game(ids[0]), Err(GameError::DeckExhausted));
        assert_eq!(room.state, RoomState::Lobby);
        assert!(room.players.iter().all(|p| p.hand.is_empty()));
    }

    #[test]
    fn test_start_needs_two_players() {
        let (mut room, ids) = room_with(&["Alice"]);
        room.set_ready(ids[0], true).unwrap();
        assert_eq!(room.start_game(ids[0]), Err(GameError::NotEnoughPlayers));
        assert_eq!(room.state, RoomState::Lobby);
    }

    #[test]
    fn test_play_out_of_turn() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let before = fingerprint(&room);
        assert_eq!(room.play_card(ids[1], 0, None), Err(GameError::NotYourTurn));
        assert_eq!(room.draw_card(ids[1]), Err(GameError::NotYourTurn));
        assert_eq!(fingerprint(&room), before);
    }

    #[test]
    fn test_play_bad_index() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let before = fingerprint(&room);
        assert_eq!(
            room.play_card(ids[0], 99, None),
            Err(GameError::InvalidCardIndex)
        );
        assert_eq!(fingerprint(&room), before);
    }

    #[test]
    fn test_invalid_move_leaves_state_unchanged() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        force_top(&mut room, Color::Red, CardType::Number(3));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Blue && c.card_type == CardType::Number(5)
        });

        let before = fingerprint(&room);
        assert_eq!(
            room.play_card(ids[0], index, None),
            Err(GameError::InvalidMove)
        );
        assert_eq!(fingerprint(&room), before);
    }

    #[test]
    fn test_play_number_card() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        force_top(&mut room, Color::Red, CardType::Number(3));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Red && c.card_type == CardType::Number(7)
        });

        let event = room.play_card(ids[0], index, None).unwrap();
        assert!(matches!(event, GameEvent::CardPlayed { penalty: None, .. }));
        assert_eq!(room.current_player, Some(1));
        assert_eq!(room.current_color, Some(Color::Red));
        assert_eq!(room.current_value, Some(CardType::Number(7)));
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_value_match_changes_color() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        force_top(&mut room, Color::Red, CardType::Skip);
        let index = give(&mut room, 0, |c| {
            c.color == Color::Green && c.card_type == CardType::Skip
        });

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.current_color, Some(Color::Green));
    }

    #[test]
    fn test_skip_three_players() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        force_top(&mut room, Color::Blue, CardType::Number(1));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Blue && c.card_type == CardType::Skip
        });

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.current_player, Some(2));
    }

    #[test]
    fn test_reverse_four_players() {
        let (mut room, ids) = started(&["A", "B", "C", "D"]);
        force_top(&mut room, Color::Yellow, CardType::Number(4));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Yellow && c.card_type == CardType::Reverse
        });

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.direction, Direction::CounterClockwise);
        assert_eq!(room.current_player, Some(3));
    }

    #[test]
    fn test_reverse_two_players_passes_to_opponent() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        force_top(&mut room, Color::Green, CardType::Number(4));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Green && c.card_type == CardType::Reverse
        });

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.direction, Direction::CounterClockwise);
        assert_eq!(room.current_player, Some(1));
        assert_eq!(room.play_card(ids[0], 0, None), Err(GameError::NotYourTurn));
    }

    #[test]
    fn test_draw_two_penalises_next_player() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        force_top(&mut room, Color::Red, CardType::Number(9));
        let index = give(&mut room, 0, |c| {
            c.color == Color::Red && c.card_type == CardType::DrawTwo
        });
        let bob_before = room.players[1].hand.len();

        let event = room.play_card(ids[0], index, None).unwrap();
        assert_eq!(
            event,
            GameEvent::CardPlayed {
                player_id: ids[0],
                card: room.discard_pile.top().unwrap().clone(),
                penalty: Some(Penalty {
                    player_id: ids[1],
                    cards: 2
                }),
            }
        );
        assert_eq!(room.players[1].hand.len(), bob_before + 2);
        assert_eq!(room.current_player, Some(2));
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_wild_waits_for_color() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        let index = give(&mut room, 0, |c| c.card_type == CardType::Wild);

        let event = room.play_card(ids[0], index, None).unwrap();
        assert!(matches!(event, GameEvent::ColorRequested { .. }));
        assert_eq!(room.pending_color, Some(ids[0]));
        assert_eq!(room.current_player, Some(0));

        assert_eq!(room.draw_card(ids[0]), Err(GameError::ColorChoicePending));
        assert_eq!(room.draw_card(ids[1]), Err(GameError::ColorChoicePending));
        assert_eq!(
            room.choose_color(ids[1], Color::Red),
            Err(GameError::NotYourTurn)
        );
        assert_eq!(
            room.choose_color(ids[0], Color::Wild),
            Err(GameError::InvalidColor)
        );

        room.choose_color(ids[0], Color::Blue).unwrap();
        assert_eq!(room.pending_color, None);
        assert_eq!(room.current_color, Some(Color::Blue));
        assert_eq!(room.discard_pile.top().unwrap().color, Color::Blue);
        assert_eq!(room.current_player, Some(1));
    }

    #[test]
    fn test_wild_draw_four_after_color_choice() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        let index = give(&mut room, 0, |c| c.card_type == CardType::WildDrawFour);
        let bob_before = room.players[1].hand.len();

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.players[1].hand.len(), bob_before);

        let event = room.choose_color(ids[0], Color::Yellow).unwrap();
        assert_eq!(
            event,
            GameEvent::ColorChosen {
                player_id: ids[0],
                color: Color::Yellow,
                penalty: Some(Penalty {
                    player_id: ids[1],
                    cards: 4
                }),
            }
        );
        assert_eq!(room.players[1].hand.len(), bob_before + 4);
        assert_eq!(room.current_player, Some(2));
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_wild_with_color_resolves_in_one_step() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let index = give(&mut room, 0, |c| c.card_type == CardType::Wild);

        let event = room.play_card(ids[0], index, Some(Color::Green)).unwrap();
        assert!(matches!(event, GameEvent::CardPlayed { .. }));
        assert_eq!(room.pending_color, None);
        assert_eq!(room.current_color, Some(Color::Green));
        assert_eq!(room.current_player, Some(1));
    }

    #[test]
    fn test_wild_with_invalid_color_is_rejected() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let index = give(&mut room, 0, |c| c.card_type == CardType::Wild);
        let before = fingerprint(&room);

        assert_eq!(
            room.play_card(ids[0], index, Some(Color::Wild)),
            Err(GameError::InvalidColor)
        );
        assert_eq!(fingerprint(&room), before);
    }

    #[test]
    fn test_choose_color_without_wild() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        assert_eq!(
            room.choose_color(ids[0], Color::Red),
            Err(GameError::NotWaitingForColor)
        );
    }

    #[test]
    fn test_winning_card_skips_effect() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        force_top(&mut room, Color::Red, CardType::Number(2));
        let index = leave_one_card(&mut room, 0, |c| {
            c.color == Color::Red && c.card_type == CardType::DrawTwo
        });
        let bob_before = room.players[1].hand.len();

        let event = room.play_card(ids[0], index, None).unwrap();
        assert!(matches!(event, GameEvent::PlayerWins { player_id, .. } if player_id == ids[0]));
        assert_eq!(room.state, RoomState::Ended);
        assert_eq!(room.winner, Some(ids[0]));
        assert_eq!(room.players[1].hand.len(), bob_before);
        assert_eq!(room.direction, Direction::Clockwise);
        assert_eq!(room.cards_in_play(), DECK_SIZE);
        assert_eq!(room.draw_card(ids[1]), Err(GameError::GameNotInProgress));
    }

    #[test]
    fn test_winning_wild_needs_no_color() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let index = leave_one_card(&mut room, 0, |c| c.card_type == CardType::WildDrawFour);
        let color_before = room.current_color;

        room.play_card(ids[0], index, None).unwrap();
        assert_eq!(room.state, RoomState::Ended);
        assert_eq!(room.pending_color, None);
        assert_eq!(room.current_color, color_before);
        assert!(room.current_color.is_some_and(|c| c.is_choosable()));
    }

    #[test]
    fn test_draw_ends_turn() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        let event = room.draw_card(ids[0]).unwrap();

        let GameEvent::CardDrawn { card, .. } = event else {
            panic!("expected CardDrawn");
        };
        assert_eq!(room.players[0].hand.last(), Some(&card));
        assert_eq!(room.players[0].hand.len(), 8);
        assert_eq!(room.current_player, Some(1));
    }

    #[test]
    fn test_draw_from_empty_deck_reshuffles() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        // Move the whole draw pile under the discard top
        let top = room.discard_pile.top().unwrap().clone();
        room.discard_pile.clear();
        while let Some(card) = room.deck.pop() {
            room.discard_pile.push(card);
        }
        room.discard_pile.push(top.clone());
        let recyclable = room.discard_pile.len() - 1;

        room.draw_card(ids[0]).unwrap();

        assert_eq!(room.discard_pile.len(), 1);
        assert_eq!(room.discard_pile.top(), Some(&top));
        assert_eq!(room.deck.len(), recyclable - 1);
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_departure_of_current_player_mid_game() {
        let (mut room, ids) = started(&["A", "B", "C", "D"]);
        room.current_player = Some(3);
        room.leave(ids[3]).unwrap();
        assert_eq!(room.current_player, Some(0));

        room.direction = Direction::CounterClockwise;
        room.current_player = Some(1);
        room.leave(ids[1]).unwrap();
        assert_eq!(room.current_player, Some(0));
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_departure_before_current_player() {
        let (mut room, ids) = started(&["A", "B", "C"]);
        room.current_player = Some(2);
        room.leave(ids[0]).unwrap();
        assert_eq!(room.current_player, Some(1));
        assert_eq!(room.current_player_id(), Some(ids[2]));
    }

    #[test]
    fn test_departure_leaving_one_player_ends_game() {
        let (mut room, ids) = started(&["Alice", "Bob"]);
        let departure = room.leave(ids[0]).unwrap();

        assert_eq!(departure.winner, Some(ids[1]));
        assert_eq!(room.state, RoomState::Ended);
        assert_eq!(room.cards_in_play(), DECK_SIZE);
    }

    #[test]
    fn test_departure_with_pending_color() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        let index = give(&mut room, 0, |c| c.card_type == CardType::WildDrawFour);
        room.play_card(ids[0], index, None).unwrap();

        room.leave(ids[0]).unwrap();
        assert_eq!(room.pending_color, None);
        assert!(room.current_color.is_some_and(|c| c.is_choosable()));
        assert_eq!(room.current_player_id(), Some(ids[1]));
        assert_eq!(room.players[0].hand.len(), 7);
    }

    #[test]
    fn test_unknown_player_cannot_act() {
        let (mut room, _) = started(&["Alice", "Bob"]);
        assert_eq!(
            room.draw_card(Uuid::new_v4()),
            Err(GameError::PlayerNotFound)
        );
        assert_eq!(
            room.play_card(Uuid::new_v4(), 0, Some(Color::Red)),
            Err(GameError::PlayerNotFound)
        );
    }

    #[test]
    fn test_card_ids_stay_unique_through_play() {
        let (mut room, ids) = started(&["Alice", "Bob", "Carol"]);
        for turn in 0..30 {
            let Some(seat) = room.current_player else { break };
            let id = ids.iter().find(|id| room.player_index(**id) == Some(seat)).copied();
            let Some(id) = id else { break };
            let (color, value) = (room.current_color.unwrap(), room.current_value.unwrap());
            let playable = room.players[seat]
                .hand
                .iter()
                .position(|c| is_valid_move(c, color, value));
            match playable {
                Some(index) => {
                    room.play_card(id, index, Some(Color::CHOOSABLE[turn % 4])).unwrap();
                }
                None => {
                    room.draw_card(id).unwrap();
                }
            }
            if room.state == RoomState::Ended {
                break;
            }
        }

        let mut seen: Vec<CardId> = room
            .players
            .iter()
            .flat_map(|p| p.hand.iter())
            .chain(room.deck.iter())
            .chain(room.discard_pile.iter())
            .map(|c| c.id)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), DECK_SIZE);
    }
}
