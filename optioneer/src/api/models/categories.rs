//! API models for categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::categories::{CategoryDBResponse, CategoryType};
use crate::types::CategoryId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CategoryId,
    pub name: String,
    pub category_type: CategoryType,
    pub position: i32,
    /// Options here count against the plan capacity limit
    pub is_primary: bool,
    /// Customers must pick an option here to complete a quote
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(db: CategoryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            category_type: db.category_type,
            position: db.position,
            is_primary: db.is_primary,
            is_required: db.is_required,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default)]
    pub category_type: CategoryType,
    #[serde(default)]
    pub position: i32,
    /// Omitted means: primary if this is the configurator's first category
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub is_required: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub category_type: Option<CategoryType>,
    pub position: Option<i32>,
    pub is_primary: Option<bool>,
    pub is_required: Option<bool>,
}
