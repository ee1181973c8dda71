//! Database models for client (tenant) accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientDBResponse {
    pub id: ClientId,
    pub email: String,
    pub password_hash: Option<String>,
    pub company_name: Option<String>,
    /// Opaque embed credential, `pk-...`
    pub public_key: String,
    /// Domains allowed to host this client's embeds. Empty means embeds are
    /// disabled until the client opts in.
    pub allowed_domains: Vec<String>,
    pub subscription_status: String,
    /// Purchased capacity blocks for the primary-option limit
    pub charged_blocks: i32,
    pub monthly_requests: i32,
    pub request_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClientCreateDBRequest {
    pub email: String,
    pub password_hash: Option<String>,
    pub company_name: Option<String>,
    pub public_key: String,
    pub request_limit: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ClientUpdateDBRequest {
    pub company_name: Option<String>,
    pub allowed_domains: Option<Vec<String>>,
    pub subscription_status: Option<String>,
}
