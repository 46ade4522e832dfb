pub mod config;
pub mod uno_game;
