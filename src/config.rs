use crate::uno_game::deck::{DECK_SIZE, WILD_CARDS};
use clap::Parser;
use std::net::SocketAddr;

/// Command-line configuration for the room server.
#[derive(Debug, Clone, Parser)]
#[command(name = "uno-server", about = "Multiplayer UNO room server", version)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Seats per room
    #[arg(long, default_value_t = 10)]
    pub max_players: usize,

    /// Players needed before the host can start
    #[arg(long, default_value_t = 2)]
    pub min_players: usize,

    /// Cards dealt to each player
    #[arg(long, default_value_t = 7)]
    pub hand_size: usize,

    /// Chat messages kept per room
    #[arg(long, default_value_t = 100)]
    pub max_chat_history: usize,

    /// Fixed RNG seed for reproducible deals
    #[arg(long)]
    pub seed: Option<u64>,

    /// tracing filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl ServerConfig {
    pub fn room_config(&self) -> Result<RoomConfig, String> {
        let config = RoomConfig {
            max_players: self.max_players,
            min_players: self.min_players,
            hand_size: self.hand_size,
            max_chat_history: self.max_chat_history,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Room rules shared by every room in a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    pub max_players: usize,
    pub min_players: usize,
    pub hand_size: usize,
    pub max_chat_history: usize,
    /// Seeds each room's RNG (offset by room creation order) when set.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 10,
            min_players: 2,
            hand_size: 7,
            max_chat_history: 100,
            seed: None,
        }
    }
}

impl RoomConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < 2 {
            return Err("min_players must be at least 2".to_string());
        }
        if self.max_players < self.min_players {
            return Err(format!(
                "max_players ({}) is below min_players ({})",
                self.max_players, self.min_players
            ));
        }
        if self.hand_size == 0 {
            return Err("hand_size must be at least 1".to_string());
        }
        // A full deal must leave at least one non-wild card to open with
        if self.max_players * self.hand_size + WILD_CARDS + 1 > DECK_SIZE {
            return Err(format!(
                "{} players x {} cards does not fit in a {DECK_SIZE}-card deck",
                self.max_players, self.hand_size
            ));
        }
        Ok(())
    }
}
