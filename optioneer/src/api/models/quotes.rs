//! API models for quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

use crate::db::models::quotes::{QuoteDBResponse, QuoteStatus};
use crate::types::{CategoryId, ConfiguratorId, OptionId, QuoteId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: QuoteId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub configurator_id: Option<ConfiguratorId>,
    /// Shareable public lookup key
    pub quote_code: String,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    #[schema(value_type = Object)]
    pub selected_options: serde_json::Value,
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub currency_code: String,
    pub status: QuoteStatus,
    pub open_count: i32,
    pub last_opened_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuoteDBResponse> for QuoteResponse {
    fn from(db: QuoteDBResponse) -> Self {
        Self {
            id: db.id,
            configurator_id: db.configurator_id,
            quote_code: db.quote_code,
            customer_name: db.customer_name,
            customer_email: db.customer_email,
            customer_phone: db.customer_phone,
            customer_company: db.customer_company,
            customer_message: db.customer_message,
            selected_options: db.selected_options,
            configuration: db.configuration,
            total_price: db.total_price,
            currency_code: db.currency_code,
            status: db.status,
            open_count: db.open_count,
            last_opened_at: db.last_opened_at,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Quote submission, from the embed (with `public_key`) or the dashboard
/// (with a session).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteCreate {
    /// Embed credential; ignored when a session is present
    pub public_key: Option<String>,
    /// Configurator the selection was made against, by private id
    /// (dashboard) ...
    #[schema(value_type = Option<String>, format = "uuid")]
    pub configurator_id: Option<ConfiguratorId>,
    /// ... or by public id (embed)
    pub configurator_public_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    /// Category -> selected option
    #[serde(default)]
    #[schema(value_type = Object)]
    pub selected_options: HashMap<CategoryId, OptionId>,
    /// Category -> quantity (default 1, must be positive)
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantities: HashMap<CategoryId, i32>,
    /// Free-form snapshot the embed wants echoed back with the quote
    #[serde(default)]
    #[schema(value_type = Object)]
    pub configuration: serde_json::Value,
    /// Client-computed total; required, non-negative. When a selection is
    /// supplied the server recomputes and stores its own figure.
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QuoteUpdate {
    pub status: Option<QuoteStatus>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListQuotesQuery {
    pub status: Option<QuoteStatus>,

    // Number of items to skip
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    // Maximum number of items to return
    #[param(default = 100, minimum = 1, maximum = 1000)]
    pub limit: Option<i64>,
}
