//! Quote lifecycle: dual-mode creation, public read by code, and dashboard
//! management.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;

use crate::{
    api::handlers::embed::{declared_origin, with_embed_cors},
    api::handlers::is_valid_email,
    api::models::{
        clients::CurrentClient,
        envelope::ApiResponse,
        quotes::{ListQuotesQuery, QuoteCreate, QuoteResponse, QuoteUpdate},
    },
    auth::current_client::MaybeClient,
    auth::embed::{resolve_embed_context, AuthContext},
    crypto, pricing,
    db::handlers::{quotes::QuoteFilter, Configurators, Quotes, Repository},
    db::models::configurators::ConfiguratorDBResponse,
    db::models::quotes::{QuoteCreateDBRequest, QuoteDBResponse, QuoteUpdateDBRequest},
    errors::{Error, Result},
    selection::{validate_selection, Selection},
    types::QuoteId,
    AppState,
};

async fn get_owned(repo: &mut Quotes<'_>, id: QuoteId, current: &CurrentClient) -> Result<QuoteDBResponse> {
    let quote = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Quote".to_string(),
        id: id.to_string(),
    })?;

    if quote.client_id != current.id {
        return Err(Error::NotFound {
            resource: "Quote".to_string(),
            id: id.to_string(),
        });
    }

    Ok(quote)
}

/// Resolve the configurator a quote submission refers to, scoped to the
/// authenticated context. Embed callers address it by public id and only see
/// published configurators; session callers use the private id.
async fn resolve_configurator(
    conn: &mut sqlx::PgConnection,
    auth: &AuthContext,
    request: &QuoteCreate,
) -> Result<Option<ConfiguratorDBResponse>> {
    let mut repo = Configurators::new(conn);

    match auth {
        AuthContext::Embed(context) => {
            let public_id = request
                .configurator_public_id
                .as_deref()
                .ok_or_else(|| Error::BadRequest {
                    message: "configurator_public_id is required for embed quote submission".to_string(),
                })?;

            let configurator = repo
                .get_published_for_embed(public_id, context.client.id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    resource: "Configurator".to_string(),
                    id: public_id.to_string(),
                })?;
            Ok(Some(configurator))
        }
        AuthContext::Session(client) => match request.configurator_id {
            Some(id) => {
                let configurator = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
                    resource: "Configurator".to_string(),
                    id: id.to_string(),
                })?;
                if configurator.client_id != client.id {
                    return Err(Error::NotFound {
                        resource: "Configurator".to_string(),
                        id: id.to_string(),
                    });
                }
                Ok(Some(configurator))
            }
            None => Ok(None),
        },
    }
}

/// Submit a quote (dashboard session or embed public key).
///
/// The selection, when present, is validated against the configurator's
/// compatibility graph before anything is persisted, and the total is
/// recomputed server-side from stored prices. Confirmation and team emails
/// are dispatched after commit, fire-and-forget.
#[utoipa::path(
    post,
    path = "/quote",
    request_body = QuoteCreate,
    tag = "quotes",
    responses(
        (status = 201, description = "Quote created", body = QuoteResponse),
        (status = 400, description = "Validation failure, including INCOMPATIBLE_SELECTION / MISSING_DEPENDENCY"),
        (status = 401, description = "No session and no public key"),
        (status = 404, description = "Configurator not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_quote(
    State(state): State<AppState>,
    MaybeClient(session): MaybeClient,
    headers: HeaderMap,
    Json(request): Json<QuoteCreate>,
) -> Result<Response> {
    // Resolve the auth context once at the boundary: session wins, otherwise
    // the full embed trust-boundary checks run against the supplied key
    let auth = match session {
        Some(client) => AuthContext::Session(client),
        None => {
            let origin = declared_origin(&headers);
            let context = resolve_embed_context(&state, request.public_key.as_deref(), origin.as_deref()).await?;
            AuthContext::Embed(context)
        }
    };

    if !is_valid_email(&request.customer_email) {
        return Err(Error::BadRequest {
            message: "A valid customer email is required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let configurator = resolve_configurator(&mut conn, &auth, &request).await?;

    // Quantities must be positive whether or not they apply to a selection
    if let Some((category, quantity)) = request.quantities.iter().find(|(_, q)| **q < 1) {
        return Err(Error::Selection(crate::selection::SelectionError::InvalidQuantity {
            category: *category,
            quantity: *quantity,
        }));
    }

    // With a configurator and a selection, the catalog is the source of
    // truth: validate the selection and recompute the total from stored
    // prices rather than trusting the embed's figure
    let (total_price, currency_code) = if let Some(ref configurator) = configurator {
        let mut configurators = Configurators::new(&mut conn);
        let catalog = configurators.load_catalog(configurator.id).await?;
        let selection = Selection::new(request.selected_options.clone(), request.quantities.clone());

        validate_selection(&catalog, &selection)?;
        let computed = pricing::evaluate_total(&catalog, &selection);

        if let Some(submitted) = request.total_price {
            if submitted != computed {
                tracing::warn!(%submitted, %computed, "submitted quote total differs from computed total; storing computed");
            }
        }

        (computed, configurator.currency_code.clone())
    } else {
        // Free-form quote with no catalog context: the submitted total is
        // required and must be non-negative
        let total = request.total_price.ok_or_else(|| Error::BadRequest {
            message: "total_price is required".to_string(),
        })?;
        if total < Decimal::ZERO {
            return Err(Error::BadRequest {
                message: "total_price cannot be negative".to_string(),
            });
        }
        (total, "USD".to_string())
    };

    let db_request = QuoteCreateDBRequest {
        client_id: auth.client_id(),
        configurator_id: configurator.as_ref().map(|c| c.id),
        quote_code: crypto::generate_quote_code(),
        customer_name: request.customer_name,
        customer_email: request.customer_email,
        customer_phone: request.customer_phone,
        customer_company: request.customer_company,
        customer_message: request.customer_message,
        selected_options: serde_json::to_value(&request.selected_options).unwrap_or_else(|_| serde_json::json!({})),
        // Absent configuration deserializes to null; the column is non-null
        configuration: if request.configuration.is_null() {
            serde_json::json!({})
        } else {
            request.configuration
        },
        total_price,
        currency_code,
    };

    let mut quotes = Quotes::new(&mut conn);
    let quote = quotes.create(&db_request).await?;

    // Best-effort notifications: the quote is the durable fact, a failed
    // email never fails this request
    if let Some(email) = state.email.clone() {
        let symbol = configurator.map(|c| c.currency_symbol).unwrap_or_else(|| "$".to_string());
        let total_display = pricing::format_price(quote.total_price, &symbol);
        let quote_code = quote.quote_code.clone();
        let customer_email = quote.customer_email.clone();
        let customer_name = quote.customer_name.clone();

        tokio::spawn(async move {
            if let Err(e) = email
                .send_quote_confirmation(&customer_email, customer_name.as_deref(), &quote_code, &total_display)
                .await
            {
                tracing::warn!("failed to send quote confirmation email: {e}");
            }
            if let Err(e) = email.send_team_notification(&quote_code, &customer_email, &total_display).await {
                tracing::warn!("failed to send team notification email: {e}");
            }
        });
    }

    let body = (StatusCode::CREATED, Json(ApiResponse::ok(QuoteResponse::from(quote))));
    Ok(match auth {
        AuthContext::Embed(context) => with_embed_cors(&context.origin, body),
        AuthContext::Session(_) => body.into_response(),
    })
}

/// Public quote read by code. The code is the capability; each read bumps the
/// open counter.
#[utoipa::path(
    get,
    path = "/quote/{quote_code}",
    tag = "quotes",
    params(("quote_code" = String, Path, description = "Shareable quote code")),
    responses(
        (status = 200, description = "Quote", body = QuoteResponse),
        (status = 404, description = "Unknown code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_quote_by_code(State(state): State<AppState>, Path(quote_code): Path<String>) -> Result<Json<ApiResponse<QuoteResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quotes::new(&mut conn);

    let quote = repo.get_by_code_and_touch(&quote_code).await?.ok_or_else(|| Error::NotFound {
        resource: "Quote".to_string(),
        id: quote_code.clone(),
    })?;

    Ok(Json(ApiResponse::ok(QuoteResponse::from(quote))))
}

/// List the caller's quotes
#[utoipa::path(
    get,
    path = "/api/v1/quotes",
    tag = "quotes",
    params(ListQuotesQuery),
    responses(
        (status = 200, description = "Quotes, newest first", body = [QuoteResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_quotes(
    State(state): State<AppState>,
    current: CurrentClient,
    Query(query): Query<ListQuotesQuery>,
) -> Result<Json<ApiResponse<Vec<QuoteResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quotes::new(&mut conn);

    let filter = QuoteFilter {
        client_id: current.id,
        status: query.status,
        skip: query.skip.unwrap_or(0),
        limit: query.limit.unwrap_or(100).min(1000),
    };

    let quotes = repo.list(&filter).await?;
    Ok(Json(ApiResponse::ok(quotes.into_iter().map(QuoteResponse::from).collect())))
}

/// Get one quote
#[utoipa::path(
    get,
    path = "/api/v1/quotes/{id}",
    tag = "quotes",
    params(("id" = uuid::Uuid, Path, description = "Quote ID")),
    responses(
        (status = 200, description = "Quote", body = QuoteResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_quote(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<QuoteId>,
) -> Result<Json<ApiResponse<QuoteResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quotes::new(&mut conn);

    let quote = get_owned(&mut repo, id, &current).await?;
    Ok(Json(ApiResponse::ok(QuoteResponse::from(quote))))
}

/// Update a quote, typically its status.
///
/// Transition legality is enforced only when `quotes.enforce_transitions` is
/// configured; the default matches the permissive any-to-any behavior.
#[utoipa::path(
    patch,
    path = "/api/v1/quotes/{id}",
    request_body = QuoteUpdate,
    tag = "quotes",
    params(("id" = uuid::Uuid, Path, description = "Quote ID")),
    responses(
        (status = 200, description = "Updated quote", body = QuoteResponse),
        (status = 400, description = "Illegal status transition"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_quote(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<QuoteId>,
    Json(request): Json<QuoteUpdate>,
) -> Result<Json<ApiResponse<QuoteResponse>>> {
    if let Some(total) = request.total_price {
        if total < Decimal::ZERO {
            return Err(Error::BadRequest {
                message: "total_price cannot be negative".to_string(),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quotes::new(&mut conn);

    let existing = get_owned(&mut repo, id, &current).await?;

    if state.config.quotes.enforce_transitions {
        if let Some(next) = request.status {
            if !existing.status.can_transition_to(next) {
                return Err(Error::BadRequest {
                    message: format!("Quote cannot move from {:?} to {:?}", existing.status, next),
                });
            }
        }
    }

    let quote = repo
        .update(
            id,
            &QuoteUpdateDBRequest {
                status: request.status,
                customer_name: request.customer_name,
                customer_phone: request.customer_phone,
                customer_company: request.customer_company,
                customer_message: request.customer_message,
                total_price: request.total_price,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(QuoteResponse::from(quote))))
}

/// Delete a quote
#[utoipa::path(
    delete,
    path = "/api/v1/quotes/{id}",
    tag = "quotes",
    params(("id" = uuid::Uuid, Path, description = "Quote ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_quote(
    State(state): State<AppState>,
    current: CurrentClient,
    Path(id): Path<QuoteId>,
) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Quotes::new(&mut conn);

    get_owned(&mut repo, id, &current).await?;
    repo.delete(id).await?;

    Ok(Json(ApiResponse::message("Quote deleted")))
}

#[cfg(test)]
mod tests {
    use crate::db::handlers::Options;
    use crate::test_utils::*;
    use sqlx::PgPool;

    /// Two incompatible options, one per category, plus setup for an embed
    /// quote submission.
    async fn incompatible_catalog(pool: &PgPool) -> (crate::db::models::clients::ClientDBResponse, String, uuid::Uuid, uuid::Uuid, uuid::Uuid, uuid::Uuid) {
        let client = create_test_client(pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(pool, client.id, true).await;
        let cat_a = create_test_category(pool, configurator.id, false, false).await;
        let cat_b = create_test_category(pool, configurator.id, false, false).await;
        let opt_a = create_test_option(pool, cat_a.id, "Steel frame", "100.00").await;
        let opt_b = create_test_option(pool, cat_b.id, "Carbon fork", "250.00").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut options = Options::new(&mut conn);
        assert!(options.add_incompatibility(opt_a.id, opt_b.id).await.unwrap());

        (client, configurator.public_id, cat_a.id, cat_b.id, opt_a.id, opt_b.id)
    }

    #[sqlx::test]
    async fn test_incompatible_selection_is_rejected_at_quote_time(pool: PgPool) {
        let (client, public_id, cat_a, cat_b, opt_a, opt_b) = incompatible_catalog(&pool).await;

        let server = test_server(test_state(pool));
        let response = server
            .post("/quote")
            .add_header("x-embed-origin", "https://shop.example.com")
            .json(&serde_json::json!({
                "public_key": client.public_key,
                "configurator_public_id": public_id,
                "customer_email": "buyer@customer.example",
                "selected_options": { cat_a.to_string(): opt_a, cat_b.to_string(): opt_b },
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["code"], "INCOMPATIBLE_SELECTION");
    }

    #[sqlx::test]
    async fn test_embed_quote_recomputes_the_total(pool: PgPool) {
        let (client, public_id, cat_a, _cat_b, opt_a, _opt_b) = incompatible_catalog(&pool).await;

        let server = test_server(test_state(pool.clone()));
        let response = server
            .post("/quote")
            .add_header("x-embed-origin", "https://shop.example.com")
            .json(&serde_json::json!({
                "public_key": client.public_key,
                "configurator_public_id": public_id,
                "customer_email": "buyer@customer.example",
                "selected_options": { cat_a.to_string(): opt_a },
                "quantities": { cat_a.to_string(): 3 },
                // Embeds are untrusted; a lowballed figure is overwritten
                "total_price": "1.00",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["total_price"], "300.00");
        assert_eq!(body["data"]["status"], "pending");

        let code = body["data"]["quote_code"].as_str().unwrap().to_string();
        assert!(code.starts_with("Q-"));

        // Public read by code bumps the open counter
        let read = server.get(&format!("/quote/{code}")).await;
        read.assert_status_ok();
        assert_eq!(read.json::<serde_json::Value>()["data"]["open_count"], 1);
    }

    #[sqlx::test]
    async fn test_missing_dependency_is_rejected_at_quote_time(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;
        let cat_a = create_test_category(&pool, configurator.id, false, false).await;
        let cat_b = create_test_category(&pool, configurator.id, false, false).await;
        let rack = create_test_option(&pool, cat_a.id, "Roof rack", "50.00").await;
        let rails = create_test_option(&pool, cat_b.id, "Rail kit", "30.00").await;

        {
            let mut conn = pool.acquire().await.unwrap();
            let mut options = Options::new(&mut conn);
            assert!(options.add_dependency(rack.id, rails.id).await.unwrap());
        }

        let server = test_server(test_state(pool));
        let submit = |selected: serde_json::Value| {
            server
                .post("/quote")
                .add_header("x-embed-origin", "https://shop.example.com")
                .json(&serde_json::json!({
                    "public_key": client.public_key,
                    "configurator_public_id": configurator.public_id,
                    "customer_email": "buyer@customer.example",
                    "selected_options": selected,
                }))
        };

        let response = submit(serde_json::json!({ cat_a.id.to_string(): rack.id })).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["code"], "MISSING_DEPENDENCY");

        // Selecting the required option as well satisfies the edge
        let response = submit(serde_json::json!({
            cat_a.id.to_string(): rack.id,
            cat_b.id.to_string(): rails.id,
        }))
        .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        assert_eq!(response.json::<serde_json::Value>()["data"]["total_price"], "80.00");
    }

    #[sqlx::test]
    async fn test_invalid_email_and_quantity_are_rejected(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;
        let category = create_test_category(&pool, configurator.id, false, false).await;
        let option = create_test_option(&pool, category.id, "Oak", "25.00").await;

        let server = test_server(test_state(pool));

        let response = server
            .post("/quote")
            .add_header("x-embed-origin", "https://shop.example.com")
            .json(&serde_json::json!({
                "public_key": client.public_key,
                "configurator_public_id": configurator.public_id,
                "customer_email": "not-an-email",
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["code"], "VALIDATION_ERROR");

        // Quantity zero is rejected, never clamped
        let response = server
            .post("/quote")
            .add_header("x-embed-origin", "https://shop.example.com")
            .json(&serde_json::json!({
                "public_key": client.public_key,
                "configurator_public_id": configurator.public_id,
                "customer_email": "buyer@customer.example",
                "selected_options": { category.id.to_string(): option.id },
                "quantities": { category.id.to_string(): 0 },
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["code"], "INVALID_QUANTITY");
    }

    #[sqlx::test]
    async fn test_session_quote_and_status_update(pool: PgPool) {
        let config = test_config();
        let client = create_test_client(&pool, &[]).await;
        let cookie = session_cookie_for(&client, &config);

        let server = test_server(test_state_with_config(pool, config));

        // Dashboard-side quote with no catalog context: total is required
        let response = server
            .post("/quote")
            .add_header("cookie", &cookie)
            .json(&serde_json::json!({
                "customer_email": "walkin@customer.example",
                "total_price": "420.00",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let quote_id = response.json::<serde_json::Value>()["data"]["id"].as_str().unwrap().to_string();

        // Status moves by explicit admin action
        let response = server
            .patch(&format!("/api/v1/quotes/{quote_id}"))
            .add_header("cookie", &cookie)
            .json(&serde_json::json!({ "status": "accepted" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["data"]["status"], "accepted");
    }

    #[sqlx::test]
    async fn test_transition_enforcement_when_configured(pool: PgPool) {
        let mut config = test_config();
        config.quotes.enforce_transitions = true;
        let client = create_test_client(&pool, &[]).await;
        let cookie = session_cookie_for(&client, &config);

        let server = test_server(test_state_with_config(pool, config));

        let response = server
            .post("/quote")
            .add_header("cookie", &cookie)
            .json(&serde_json::json!({
                "customer_email": "walkin@customer.example",
                "total_price": "10.00",
            }))
            .await;
        let quote_id = response.json::<serde_json::Value>()["data"]["id"].as_str().unwrap().to_string();

        let patch_status = |status: &'static str| {
            server
                .patch(&format!("/api/v1/quotes/{quote_id}"))
                .add_header("cookie", &cookie)
                .json(&serde_json::json!({ "status": status }))
        };

        patch_status("rejected").await.assert_status_ok();
        // Rejected is terminal under enforcement
        patch_status("pending").await.assert_status_bad_request();
    }
}
