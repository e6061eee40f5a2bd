//! Common data types used throughout the application

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Game entity as stored in the catalog database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Upstream catalog identifier
    pub id: i64,
    pub name: String,
    /// Upstream genre identifiers attached to this game
    pub genres: Vec<i64>,
    /// Raw upstream payload, serialized as JSON
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Genre entity as stored in the catalog database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    /// Upstream catalog identifier
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Raw upstream payload, serialized as JSON
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Game record as returned by the catalog API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgdbGame {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub storyline: String,
    #[serde(default)]
    pub platforms: Vec<i64>,
    #[serde(default)]
    pub genres: Vec<i64>,
}

/// Genre record as returned by the catalog API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgdbGenre {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// Token endpoint response for the client-credentials exchange
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitchTokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Work signal consumed by the games sync worker.
///
/// Aliases accept the field spellings that external publishers emit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamesSyncSignal {
    #[serde(default, alias = "platformIds", alias = "PlatformIds")]
    pub platform_ids: Vec<i64>,
}

/// Work signal consumed by the genres sync worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenresSyncSignal {
    /// Free-form trigger note, ignored by the handler
    #[serde(default, alias = "triggeredBy", alias = "TriggeredBy")]
    pub triggered_by: Option<String>,
}

impl Game {
    /// Build a storable entity from the upstream DTO, stamping audit times.
    pub fn from_dto(dto: &IgdbGame, data: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: dto.id,
            name: dto.name.clone(),
            genres: dto.genres.clone(),
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Genre {
    /// Build a storable entity from the upstream DTO, stamping audit times.
    pub fn from_dto(dto: &IgdbGenre, data: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: dto.id,
            name: dto.name.clone(),
            slug: dto.slug.clone(),
            data,
            created_at: now,
            updated_at: now,
        }
    }
}
