//! Query DTOs - Data Transfer Objects per query parameters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// DTO per query parameters di caricamento feed
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Cursore per recuperare i messaggi persi dopo un gap
#[derive(Serialize, Deserialize, Debug)]
pub struct SinceQuery {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UnreadQuery {
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AdminMessagesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}
