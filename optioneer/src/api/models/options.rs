//! API models for product options.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::options::{OptionDBResponse, OptionWithEdges};
use crate::types::{CategoryId, OptionId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OptionId,
    #[schema(value_type = String, format = "uuid")]
    pub category_id: CategoryId,
    pub label: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
    #[schema(value_type = Vec<String>)]
    pub incompatible_with: Vec<OptionId>,
    #[schema(value_type = Vec<String>)]
    pub depends_on: Vec<OptionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OptionWithEdges> for OptionResponse {
    fn from(db: OptionWithEdges) -> Self {
        let OptionWithEdges {
            option,
            incompatible_with,
            depends_on,
        } = db;
        Self {
            id: option.id,
            category_id: option.category_id,
            label: option.label,
            description: option.description,
            price: option.price,
            sku: option.sku,
            image_url: option.image_url,
            is_default: option.is_default,
            incompatible_with,
            depends_on,
            created_at: option.created_at,
            updated_at: option.updated_at,
        }
    }
}

impl From<OptionDBResponse> for OptionResponse {
    fn from(option: OptionDBResponse) -> Self {
        OptionWithEdges {
            option,
            incompatible_with: Vec::new(),
            depends_on: Vec::new(),
        }
        .into()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OptionCreate {
    pub label: String,
    pub description: Option<String>,
    /// Non-negative; zero is a valid price
    #[schema(value_type = String)]
    pub price: Decimal,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    /// Options this one cannot be combined with. Targets outside the
    /// configurator are skipped, not errors; skips are reported back.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub incompatible_with: Vec<OptionId>,
    /// Options this one requires
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub depends_on: Vec<OptionId>,
}

/// Create response: the option plus any relation targets that were skipped
/// during bulk edge assignment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OptionCreateResponse {
    #[serde(flatten)]
    pub option: OptionResponse,
    #[schema(value_type = Vec<String>)]
    pub skipped_incompatibilities: Vec<OptionId>,
    #[schema(value_type = Vec<String>)]
    pub skipped_dependencies: Vec<OptionId>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OptionUpdate {
    pub label: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: Option<bool>,
}

/// Body for adding a relation edge to an existing option.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EdgeRequest {
    #[schema(value_type = String, format = "uuid")]
    pub option_id: OptionId,
}
