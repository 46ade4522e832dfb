//! Room code -> room map shared by every connection.
//!
//! Each room sits behind its own mutex, so operations on different rooms
//! never wait on each other. Lock order is always map shard first, then
//! room, and a shard is never held while waiting on a room.

use super::card::Color;
use super::error::GameError;
use super::game::GameEvent;
use super::player::PlayerId;
use super::room::{ChatMessage, Departure, Room, RoomCode, RoomState};
use super::view::{RoomSummary, RoomView, Snapshot};
use crate::config::RoomConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

pub const CODE_LEN: usize = 6;

/// Uppercase letters and digits without the look-alikes 0/O and 1/I.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// Codes are typed by people; accept any case and stray whitespace.
pub fn normalize_room_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

type SharedRoom = Arc<Mutex<Room>>;

pub struct RoomRegistry {
    rooms: DashMap<RoomCode, SharedRoom>,
    config: RoomConfig,
    rooms_created: AtomicU64,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
            rooms_created: AtomicU64::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(&normalize_room_code(code))
    }

    fn room_rng(&self) -> StdRng {
        let n = self.rooms_created.fetch_add(1, Ordering::Relaxed);
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }

    fn room(&self, code: &str) -> Result<SharedRoom, GameError> {
        self.rooms
            .get(&normalize_room_code(code))
            .map(|entry| entry.value().clone())
            .ok_or(GameError::RoomNotFound)
    }

    /// Runs `f` under the room's lock and captures the result for fan-out.
    /// A refused operation neither bumps the version nor yields a snapshot.
    fn mutate<T>(
        &self,
        code: &str,
        f: impl FnOnce(&mut Room) -> Result<T, GameError>,
    ) -> Result<(T, Snapshot), GameError> {
        let shared = self.room(code)?;
        let mut room = shared.lock();
        if room.is_closed() {
            return Err(GameError::RoomNotFound);
        }
        let value = f(&mut room)?;
        room.version += 1;
        Ok((value, Snapshot::capture(&room)))
    }

    /// Opens a new lobby with `host_id` as its only player.
    pub fn create_room(&self, host_id: PlayerId, host_name: &str) -> (RoomCode, Snapshot) {
        let mut rng = rand::rng();
        loop {
            let code = generate_room_code(&mut rng);
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                let room = Room::new(
                    code.clone(),
                    host_id,
                    host_name,
                    self.config.clone(),
                    self.room_rng(),
                );
                let snapshot = Snapshot::capture(&room);
                slot.insert(Arc::new(Mutex::new(room)));
                info!("room {} created by {}", code, host_id);
                return (code, snapshot);
            }
        }
    }

    /// Seats a player. The flag is false when the player was already seated;
    /// such a rejoin changes nothing and keeps the version.
    pub fn join_room(
        &self,
        code: &str,
        player_id: PlayerId,
        name: &str,
    ) -> Result<(Snapshot, bool), GameError> {
        let shared = self.room(code)?;
        let mut room = shared.lock();
        if room.is_closed() {
            return Err(GameError::RoomNotFound);
        }
        if room.player_index(player_id).is_some() {
            return Ok((Snapshot::capture(&room), false));
        }
        room.join(player_id, name)?;
        room.version += 1;
        Ok((Snapshot::capture(&room), true))
    }

    /// Removes a player and deletes the room once it is empty. The snapshot
    /// is `None` when the room is gone.
    pub fn leave_room(
        &self,
        code: &str,
        player_id: PlayerId,
    ) -> Result<(Departure, Option<Snapshot>), GameError> {
        let shared = self.room(code)?;
        let (departure, snapshot) = {
            let mut room = shared.lock();
            if room.is_closed() {
                return Err(GameError::RoomNotFound);
            }
            let departure = room.leave(player_id)?;
            room.version += 1;
            let snapshot = (!departure.room_empty).then(|| Snapshot::capture(&room));
            (departure, snapshot)
        };

        if departure.room_empty {
            let code = normalize_room_code(code);
            self.rooms
                .remove_if(&code, |_, current| Arc::ptr_eq(current, &shared));
            info!("room {} deleted", code);
        }
        Ok((departure, snapshot))
    }

    pub fn set_ready(
        &self,
        code: &str,
        player_id: PlayerId,
        is_ready: bool,
    ) -> Result<Snapshot, GameError> {
        self.mutate(code, |room| room.set_ready(player_id, is_ready))
            .map(|((), snapshot)| snapshot)
    }

    pub fn start_game(
        &self,
        code: &str,
        player_id: PlayerId,
    ) -> Result<(GameEvent, Snapshot), GameError> {
        self.mutate(code, |room| room.start_game(player_id))
    }

    pub fn play_card(
        &self,
        code: &str,
        player_id: PlayerId,
        card_index: usize,
        chosen_color: Option<Color>,
    ) -> Result<(GameEvent, Snapshot), GameError> {
        self.mutate(code, |room| {
            room.play_card(player_id, card_index, chosen_color)
        })
    }

    pub fn draw_card(
        &self,
        code: &str,
        player_id: PlayerId,
    ) -> Result<(GameEvent, Snapshot), GameError> {
        self.mutate(code, |room| room.draw_card(player_id))
    }

    pub fn choose_color(
        &self,
        code: &str,
        player_id: PlayerId,
        color: Color,
    ) -> Result<(GameEvent, Snapshot), GameError> {
        self.mutate(code, |room| room.choose_color(player_id, color))
    }

    pub fn add_message(
        &self,
        code: &str,
        player_id: PlayerId,
        text: &str,
    ) -> Result<Option<(ChatMessage, Snapshot)>, GameError> {
        let (message, snapshot) = self.mutate(code, |room| room.add_message(player_id, text))?;
        Ok(message.map(|m| (m, snapshot)))
    }

    pub fn room_view(&self, code: &str) -> Result<RoomView, GameError> {
        let shared = self.room(code)?;
        let room = shared.lock();
        if room.is_closed() {
            return Err(GameError::RoomNotFound);
        }
        Ok(RoomView::of(&room))
    }

    /// Rooms still in the lobby, oldest first.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        // Collect handles first so no shard is held while locking rooms
        let handles: Vec<SharedRoom> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut rooms: Vec<RoomSummary> = handles
            .iter()
            .filter_map(|shared| {
                let room = shared.lock();
                (room.state == RoomState::Lobby && !room.is_closed()).then(|| RoomSummary::of(&room))
            })
            .collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        rooms
    }
}
