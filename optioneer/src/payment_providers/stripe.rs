//! Stripe checkout and webhook handling for capacity blocks.

use axum::{
    body::Body,
    extract::FromRequest,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use stripe::{
    CheckoutSession, CheckoutSessionId, CheckoutSessionMode, CheckoutSessionPaymentStatus, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, Event, EventObject, EventType, Webhook,
};

use crate::{
    config::StripeConfig,
    db::handlers::{BlockPurchases, Clients},
    db::models::billing::BlockPurchaseCreateDBRequest,
    db::models::clients::ClientDBResponse,
    errors::{Error, Result},
    types::ClientId,
    AppState,
};

/// Blocks granted per checkout session. The checkout line item carries
/// quantity 1; buying more capacity means more checkouts.
const BLOCKS_PER_PURCHASE: i32 = 1;

fn stripe_config(state: &AppState) -> Result<&StripeConfig> {
    match state.config.payment.as_ref() {
        Some(crate::config::PaymentConfig::Stripe(config)) => Ok(config),
        None => Err(Error::BadRequest {
            message: "No payment provider is configured".to_string(),
        }),
    }
}

/// Create a hosted checkout session for one capacity block and return its
/// URL. The client id rides along as `client_reference_id` so fulfillment
/// can attribute the payment without any session state.
#[tracing::instrument(skip_all, fields(client_id = %client.id))]
pub async fn create_checkout_session(state: &AppState, client: &ClientDBResponse) -> Result<String> {
    let config = stripe_config(state)?;
    let stripe_client = Client::new(config.secret_key.clone());

    let success_url = format!("{}/billing?session_id={{CHECKOUT_SESSION_ID}}", state.config.dashboard_url);
    let cancel_url = format!("{}/billing", state.config.dashboard_url);
    let reference = client.id.to_string();

    let params = CreateCheckoutSession {
        cancel_url: Some(&cancel_url),
        success_url: Some(&success_url),
        client_reference_id: Some(&reference),
        customer_email: Some(&client.email),
        mode: Some(CheckoutSessionMode::Payment),
        line_items: Some(vec![CreateCheckoutSessionLineItems {
            price: Some(config.block_price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let session = CheckoutSession::create(&stripe_client, params).await.map_err(|e| {
        tracing::error!("Failed to create Stripe checkout session: {e:?}");
        Error::Internal {
            operation: "create checkout session".to_string(),
        }
    })?;

    tracing::info!("Created checkout session {} for client {}", session.id, client.id);

    session.url.ok_or_else(|| Error::Internal {
        operation: "checkout session missing URL".to_string(),
    })
}

/// Verify a checkout session with Stripe and fulfill it.
///
/// Idempotent: an already-recorded session id short-circuits before the
/// Stripe roundtrip and returns `fulfilled = false`. An unpaid session is a
/// client error, not a fulfillment.
#[tracing::instrument(skip(state, session_id))]
pub async fn process_checkout_session(state: &AppState, session_id: &str) -> Result<bool> {
    if already_processed(&state.db, session_id).await? {
        tracing::info!("session {} already processed, skipping (idempotent)", session_id);
        return Ok(false);
    }

    let config = stripe_config(state)?;
    let stripe_client = Client::new(config.secret_key.clone());

    let parsed_id: CheckoutSessionId = session_id.parse().map_err(|_| Error::BadRequest {
        message: "Invalid checkout session id".to_string(),
    })?;

    let session = CheckoutSession::retrieve(&stripe_client, &parsed_id, &[]).await.map_err(|e| {
        tracing::error!("Failed to retrieve Stripe checkout session: {e:?}");
        Error::Internal {
            operation: "retrieve checkout session".to_string(),
        }
    })?;

    fulfill_session(&state.db, &session).await
}

/// Fulfill a checkout session already in hand (webhook path).
async fn fulfill_session(db: &PgPool, session: &CheckoutSession) -> Result<bool> {
    if session.payment_status != CheckoutSessionPaymentStatus::Paid {
        tracing::info!(
            "session {} has not been paid (status: {:?}), skipping",
            session.id,
            session.payment_status
        );
        return Err(Error::BadRequest {
            message: "Payment has not completed".to_string(),
        });
    }

    let client_id: ClientId = session
        .client_reference_id
        .as_deref()
        .ok_or_else(|| Error::BadRequest {
            message: "Checkout session missing client reference".to_string(),
        })?
        .parse()
        .map_err(|_| Error::BadRequest {
            message: "Checkout session carries an invalid client reference".to_string(),
        })?;

    // Amounts come back in the smallest currency unit
    let amount = session
        .amount_total
        .map(|cents| Decimal::new(cents, 2))
        .unwrap_or(Decimal::ZERO);

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut purchases = BlockPurchases::new(&mut tx);

    let fulfilled = purchases
        .fulfill(&BlockPurchaseCreateDBRequest {
            client_id,
            session_id: session.id.to_string(),
            blocks: BLOCKS_PER_PURCHASE,
            amount,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    if fulfilled {
        tracing::info!("fulfilled checkout session {} for client {}", session.id, client_id);
    }

    Ok(fulfilled)
}

async fn already_processed(db: &PgPool, session_id: &str) -> Result<bool> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM block_purchases WHERE session_id = $1 LIMIT 1")
        .bind(session_id)
        .fetch_optional(db)
        .await
        .map_err(|e| Error::Database(e.into()))?;

    Ok(existing.is_some())
}

/// Look up the client's post-fulfillment block count for the verify response.
pub async fn charged_blocks_for(state: &AppState, client_id: ClientId) -> Result<i32> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);
    let client = clients.get_by_id(client_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Client".to_string(),
        id: client_id.to_string(),
    })?;
    Ok(client.charged_blocks)
}

/// Extractor that verifies the Stripe webhook signature before the handler
/// runs.
pub struct StripeEvent(pub Event);

impl FromRequest<AppState> for StripeEvent {
    type Rejection = Response;

    async fn from_request(req: Request<Body>, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let signature = match req.headers().get("stripe-signature").and_then(|v| v.to_str().ok()) {
            Some(sig) => sig.to_owned(),
            None => {
                tracing::warn!("Missing stripe-signature header");
                return Err(StatusCode::BAD_REQUEST.into_response());
            }
        };

        let payload = String::from_request(req, state).await.map_err(IntoResponse::into_response)?;

        let webhook_secret = match state.config.payment.as_ref() {
            Some(crate::config::PaymentConfig::Stripe(config)) => config.webhook_secret.clone(),
            None => {
                tracing::error!("Webhook received but no payment provider is configured");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        let event = Webhook::construct_event(&payload, &signature, &webhook_secret).map_err(|e| {
            tracing::warn!("Stripe webhook signature verification failed: {e}");
            StatusCode::BAD_REQUEST.into_response()
        })?;

        Ok(StripeEvent(event))
    }
}

/// Handle a verified webhook event. Only checkout completion events matter;
/// everything else is acknowledged and ignored.
pub async fn handle_webhook_event(state: &AppState, event: Event) -> Result<()> {
    match event.type_ {
        EventType::CheckoutSessionCompleted | EventType::CheckoutSessionAsyncPaymentSucceeded => {
            if let EventObject::CheckoutSession(session) = event.data.object {
                // Async payment events can arrive before payment completes;
                // unpaid sessions are skipped without error here
                if session.payment_status == CheckoutSessionPaymentStatus::Paid {
                    fulfill_session(&state.db, &session).await?;
                } else {
                    tracing::info!("checkout event for unpaid session {}, ignoring", session.id);
                }
            }
        }
        other => {
            tracing::debug!("ignoring webhook event type {other:?}");
        }
    }

    Ok(())
}
