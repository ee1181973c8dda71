//! API models for client accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::clients::ClientDBResponse;
use crate::types::ClientId;

/// The authenticated caller, as decoded from the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentClient {
    #[schema(value_type = String, format = "uuid")]
    pub id: ClientId,
    pub email: String,
    pub company_name: Option<String>,
}

/// Full account view for the dashboard. Includes the public key (it is not a
/// secret - it is shipped inside the embed snippet) but never the password
/// hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ClientId,
    pub email: String,
    pub company_name: Option<String>,
    pub public_key: String,
    pub allowed_domains: Vec<String>,
    pub subscription_status: String,
    pub charged_blocks: i32,
    pub monthly_requests: i32,
    pub request_limit: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ClientDBResponse> for ClientResponse {
    fn from(db: ClientDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            company_name: db.company_name,
            public_key: db.public_key,
            allowed_domains: db.allowed_domains,
            subscription_status: db.subscription_status,
            charged_blocks: db.charged_blocks,
            monthly_requests: db.monthly_requests,
            request_limit: db.request_limit,
            created_at: db.created_at,
        }
    }
}

impl From<ClientDBResponse> for CurrentClient {
    fn from(db: ClientDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            company_name: db.company_name,
        }
    }
}

/// Account settings a client may change themselves.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClientSettingsUpdate {
    pub company_name: Option<String>,
    /// Replaces the embed domain allow-list. An empty list disables embeds.
    pub allowed_domains: Option<Vec<String>>,
}
