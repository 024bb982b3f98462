//! Game domain entities

pub mod models;

pub use models::{City, Player, Tile};
