//! Database models for configurators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{ClientId, ConfiguratorId, ThemeId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConfiguratorDBResponse {
    pub id: ConfiguratorId,
    pub client_id: ClientId,
    /// Opaque shareable identifier used by embeds (`cfg-...`); the UUID never
    /// leaves the dashboard API.
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency_code: String,
    pub currency_symbol: String,
    pub published: bool,
    pub theme_id: Option<ThemeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConfiguratorCreateDBRequest {
    pub client_id: ClientId,
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency_code: String,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfiguratorUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub published: Option<bool>,
    pub theme_id: Option<Option<ThemeId>>,
}
