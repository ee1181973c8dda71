//! Billing: plan usage, capacity-block checkout, and payment fulfillment.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        billing::{CheckoutResponse, VerifyPaymentRequest, VerifyPaymentResponse},
        clients::CurrentClient,
        envelope::ApiResponse,
    },
    db::handlers::{Clients, Options},
    errors::{Error, Result},
    limits::UsageSummary,
    payment_providers::stripe::{self, StripeEvent},
    AppState,
};

/// Current primary-option usage against the plan limit
#[utoipa::path(
    get,
    path = "/api/v1/billing/usage",
    tag = "billing",
    responses(
        (status = 200, description = "Usage summary", body = UsageSummary),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_usage(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<UsageSummary>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut clients = Clients::new(&mut conn);
    let client = clients.get_by_id(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Client".to_string(),
        id: current.id.to_string(),
    })?;

    let mut options = Options::new(&mut conn);
    let used = options.count_primary_for_client(current.id).await?;

    Ok(Json(ApiResponse::ok(UsageSummary::new(
        &state.config.billing,
        client.charged_blocks,
        used,
    ))))
}

/// Start a checkout for one capacity block
#[utoipa::path(
    post,
    path = "/api/v1/billing/checkout",
    tag = "billing",
    responses(
        (status = 200, description = "Hosted checkout URL", body = CheckoutResponse),
        (status = 400, description = "No payment provider configured"),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_checkout(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<CheckoutResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);
    let client = clients.get_by_id(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Client".to_string(),
        id: current.id.to_string(),
    })?;
    drop(conn);

    let checkout_url = stripe::create_checkout_session(&state, &client).await?;

    Ok(Json(ApiResponse::ok(CheckoutResponse { checkout_url })))
}

/// Verify a completed checkout session and fulfill it.
///
/// Safe to call repeatedly and concurrently with the webhook: fulfillment is
/// keyed by session id and replays report `fulfilled: false`.
#[utoipa::path(
    post,
    path = "/api/v1/billing/verify",
    request_body = VerifyPaymentRequest,
    tag = "billing",
    responses(
        (status = 200, description = "Verification outcome", body = VerifyPaymentResponse),
        (status = 400, description = "Unknown or unpaid session"),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_payment(
    State(state): State<AppState>,
    current: CurrentClient,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerifyPaymentResponse>>> {
    let fulfilled = stripe::process_checkout_session(&state, &request.session_id).await?;
    let charged_blocks = stripe::charged_blocks_for(&state, current.id).await?;

    Ok(Json(ApiResponse::ok(VerifyPaymentResponse {
        fulfilled,
        charged_blocks,
    })))
}

/// Payment provider webhook. Signature is verified by the [`StripeEvent`]
/// extractor; a processing failure answers 500 so the provider retries, and
/// fulfillment idempotency absorbs the replays.
#[tracing::instrument(skip_all)]
pub async fn webhook_handler(State(state): State<AppState>, StripeEvent(event): StripeEvent) -> StatusCode {
    if let Err(e) = stripe::handle_webhook_event(&state, event).await {
        tracing::error!("webhook processing failed: {e:#}");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}
