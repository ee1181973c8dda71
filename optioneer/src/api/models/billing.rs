//! API models for billing and capacity blocks.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutResponse {
    /// Hosted checkout URL the dashboard redirects the client to
    pub checkout_url: String,
}

/// Client-side verification of a completed checkout; idempotent with the
/// webhook path.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    /// False when the session was already processed (replay)
    pub fulfilled: bool,
    pub charged_blocks: i32,
}
