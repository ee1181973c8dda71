//! Database models for product options and their relation edges.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{CategoryId, OptionId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OptionDBResponse {
    pub id: OptionId,
    pub category_id: CategoryId,
    pub label: String,
    pub description: Option<String>,
    /// Non-negative; stored as NUMERIC so price math never touches floats
    pub price: Decimal,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An option together with its outgoing relation edges, assembled by the
/// repository from the edge tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionWithEdges {
    #[serde(flatten)]
    pub option: OptionDBResponse,
    /// Symmetric incompatibility edges (queryable from either side)
    pub incompatible_with: Vec<OptionId>,
    /// Directed dependency edges: this option requires each listed option
    pub depends_on: Vec<OptionId>,
}

#[derive(Debug, Clone)]
pub struct OptionCreateDBRequest {
    pub category_id: CategoryId,
    pub label: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OptionUpdateDBRequest {
    pub label: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_default: Option<bool>,
}
