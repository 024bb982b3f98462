//! Game entity models
//!
//! `Player` doubles as the identity record: the credential store reads and
//! writes it against the users table. `City` and `Tile` are declared data
//! carriers with a persisted schema; no handler exercises them yet.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;

/// Player account row
///
/// `password_hash` and `security_stamp` never leave the server; both are
/// skipped on serialization.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Opaque value rotated to invalidate prior sessions on
    /// security-relevant account changes
    #[serde(skip_serializing)]
    pub security_stamp: String,
    pub created_at: Option<String>,
}

/// A settlement owned by a player
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct City {
    pub id: String,
    /// Owning player's id
    pub mayor: String,
    /// Tile list, stored as a JSON column
    #[serde(
        serialize_with = "serialize_tiles",
        deserialize_with = "deserialize_tiles"
    )]
    pub tiles: Option<String>,
    pub created_at: Option<String>,
}

/// A single map tile within a city
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Tile {
    pub x: i64,
    pub y: i64,
}

/// Serializes tiles from JSON string to array for API responses
fn serialize_tiles<S>(tiles: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match tiles {
        Some(tiles_json) => {
            let tiles_vec: Vec<Tile> =
                serde_json::from_str(tiles_json).unwrap_or_else(|_| Vec::new());
            tiles_vec.serialize(serializer)
        }
        None => Vec::<Tile>::new().serialize(serializer),
    }
}

/// Deserializes tiles from array to JSON string for database storage
fn deserialize_tiles<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tiles_vec: Option<Vec<Tile>> = Option::deserialize(deserializer)?;
    match tiles_vec {
        Some(vec) => serde_json::to_string(&vec)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
