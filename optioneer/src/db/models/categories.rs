//! Database models for categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{CategoryId, ConfiguratorId};

/// Fixed vocabulary of category kinds. Purely descriptive; the embed uses it
/// to pick an input widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "category_type", rename_all = "lowercase")]
pub enum CategoryType {
    Generic,
    Color,
    Dimension,
    Material,
    Feature,
    Accessory,
    Power,
    Text,
    Finish,
    Custom,
}

impl Default for CategoryType {
    fn default() -> Self {
        CategoryType::Generic
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub configurator_id: ConfiguratorId,
    pub name: String,
    pub category_type: CategoryType,
    pub position: i32,
    /// Options in primary categories count against the client's plan limit
    pub is_primary: bool,
    /// Customers must select an option here to complete a quote
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub configurator_id: ConfiguratorId,
    pub name: String,
    pub category_type: CategoryType,
    pub position: i32,
    /// None lets the repository apply the default: the first category of a
    /// configurator is primary, later ones are not.
    pub is_primary: Option<bool>,
    pub is_required: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdateDBRequest {
    pub name: Option<String>,
    pub category_type: Option<CategoryType>,
    pub position: Option<i32>,
    pub is_primary: Option<bool>,
    pub is_required: Option<bool>,
}
