//! Database models for capacity-block purchases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::ClientId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlockPurchaseDBResponse {
    pub id: Uuid,
    pub client_id: ClientId,
    /// Payment-session identifier; unique, making fulfillment idempotent
    pub session_id: String,
    pub blocks: i32,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlockPurchaseCreateDBRequest {
    pub client_id: ClientId,
    pub session_id: String,
    pub blocks: i32,
    pub amount: Decimal,
}
