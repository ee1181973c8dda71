//! API models for configurators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::configurators::ConfiguratorDBResponse;
use crate::types::{ConfiguratorId, ThemeId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfiguratorResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ConfiguratorId,
    /// Opaque shareable id referenced by embeds
    pub public_id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency_code: String,
    pub currency_symbol: String,
    pub published: bool,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub theme_id: Option<ThemeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfiguratorDBResponse> for ConfiguratorResponse {
    fn from(db: ConfiguratorDBResponse) -> Self {
        Self {
            id: db.id,
            public_id: db.public_id,
            name: db.name,
            description: db.description,
            currency_code: db.currency_code,
            currency_symbol: db.currency_symbol,
            published: db.published,
            theme_id: db.theme_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConfiguratorCreate {
    pub name: String,
    pub description: Option<String>,
    /// ISO 4217 code used for display only; prices never convert
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfiguratorUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub published: Option<bool>,
    /// Present-and-null detaches the theme; absent leaves it unchanged
    #[serde(default, deserialize_with = "crate::api::models::double_option")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub theme_id: Option<Option<ThemeId>>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListConfiguratorsQuery {
    // Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    // Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}
