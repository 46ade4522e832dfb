pub mod api;
pub mod card;
pub mod deck;
pub mod error;
pub mod game;
pub mod player;
pub mod registry;
pub mod room;
pub mod rules;
pub mod session;
pub mod view;

pub use card::{Card, CardId, CardType, Color};
pub use error::GameError;
pub use game::GameEvent;
pub use player::{Player, PlayerId};
pub use registry::RoomRegistry;
pub use room::{Room, RoomCode, RoomState};
pub use session::{ClientMessage, Request, Response, ServerMessage, SessionHub};
