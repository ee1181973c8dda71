//! The public embed surface: configurator reads from third-party sites.
//!
//! Authentication and origin validation happen in the
//! [`EmbedContext`](crate::auth::embed::EmbedContext) extractor; handlers
//! here only do the scoped lookup and response assembly. Successful responses
//! carry CORS headers scoped to the validated origin; extractor rejections
//! carry a wildcard (no client context exists yet).

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    api::models::{embed::EmbedConfiguratorResponse, envelope::ApiResponse},
    auth::embed::{EmbedContext, EMBED_ORIGIN_HEADER},
    db::handlers::{categories::CategoryFilter, options::OptionFilter, Categories, Configurators, Options, Repository, Themes},
    db::models::themes::resolve_theme,
    errors::{Error, Result},
    AppState,
};

/// Attach CORS headers scoped to a validated embed origin.
pub fn with_embed_cors(origin: &str, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, X-Embed-Origin"),
    );

    response
}

/// CORS preflight for the embed routes. No client context is established at
/// preflight time, so the wildcard applies.
#[tracing::instrument(skip_all)]
pub async fn embed_preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, X-Embed-Origin"),
            (header::ACCESS_CONTROL_MAX_AGE, "600"),
        ],
    )
        .into_response()
}

/// Embed read: the full configurator graph for a published configurator.
///
/// The lookup is scoped by `(public_id, client_id)`; a valid key for one
/// client can never fetch another client's configurator, however plausible
/// the public id.
#[utoipa::path(
    get,
    path = "/configurator/{public_id}",
    tag = "embed",
    params(
        ("public_id" = String, Path, description = "Configurator public ID"),
        ("publicKey" = String, Query, description = "Client embed public key"),
        ("X-Embed-Origin" = String, Header, description = "Origin hosting the embed"),
    ),
    responses(
        (status = 200, description = "Configurator graph", body = EmbedConfiguratorResponse),
        (status = 400, description = "MISSING_CLIENT_KEY / MISSING_EMBED_ORIGIN / INVALID_ORIGIN"),
        (status = 403, description = "NO_ALLOWED_ORIGINS / ORIGIN_MISMATCH / REQUEST_LIMIT_EXCEEDED"),
        (status = 404, description = "CLIENT_NOT_FOUND / NOT_FOUND"),
    )
)]
#[tracing::instrument(skip_all, fields(public_id = %public_id))]
pub async fn get_embed_configurator(State(state): State<AppState>, context: EmbedContext, Path(public_id): Path<String>) -> Result<Response> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut configurators = Configurators::new(&mut conn);
    let configurator = configurators
        .get_published_for_embed(&public_id, context.client.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Configurator".to_string(),
            id: public_id.clone(),
        })?;

    let mut categories_repo = Categories::new(&mut conn);
    let categories = categories_repo
        .list(&CategoryFilter {
            configurator_id: configurator.id,
        })
        .await?;

    let mut options_repo = Options::new(&mut conn);
    let mut options = Vec::new();
    for category in &categories {
        for option in options_repo.list(&OptionFilter { category_id: category.id }).await? {
            let id = option.id;
            if let Some(with_edges) = options_repo.get_with_edges(id).await? {
                options.push(with_edges);
            }
        }
    }

    // Theme priority: configurator-bound theme, else the client's active
    // theme, else the platform default. resolve_theme is total.
    let mut themes = Themes::new(&mut conn);
    let stored_theme = match configurator.theme_id {
        Some(theme_id) => themes.get_by_id(theme_id).await?.filter(|t| t.client_id == context.client.id),
        None => None,
    };
    let stored_theme = match stored_theme {
        Some(theme) => Some(theme),
        None => themes.get_active_for_client(context.client.id).await?,
    };
    let theme = resolve_theme(stored_theme);

    let body = EmbedConfiguratorResponse::assemble(configurator, categories, options, theme);

    Ok(with_embed_cors(
        &context.origin,
        Json(ApiResponse::ok(body)),
    ))
}

/// Read the declared embed origin header from a request's headers.
pub fn declared_origin(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(EMBED_ORIGIN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_embed_read_happy_path(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;
        let category = create_test_category(&pool, configurator.id, true, true).await;
        create_test_option(&pool, category.id, "Oak", "25.00").await;

        let server = test_server(test_state(pool));
        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "https://shop.example.com")
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["public_id"], configurator.public_id);
        assert_eq!(body["data"]["categories"][0]["options"][0]["display_price"], "$25.00");
        // Theme always resolves, even without a stored one
        assert!(body["data"]["theme"]["variables"]["--primary"].is_string());

        // CORS scoped to the validated origin, not a wildcard
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://shop.example.com"
        );
    }

    #[sqlx::test]
    async fn test_missing_key_and_unknown_key(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;

        let server = test_server(test_state(pool));

        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_header("x-embed-origin", "https://shop.example.com")
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<serde_json::Value>()["code"], "MISSING_CLIENT_KEY");

        // Malformed and absent keys answer with the same generic shape
        for key in ["pk-does-not-exist", "garbage"] {
            let response = server
                .get(&format!("/configurator/{}", configurator.public_id))
                .add_query_param("publicKey", key)
                .add_header("x-embed-origin", "https://shop.example.com")
                .await;
            response.assert_status_not_found();
            assert_eq!(response.json::<serde_json::Value>()["code"], "CLIENT_NOT_FOUND");
        }
    }

    #[sqlx::test]
    async fn test_empty_allow_list_is_a_hard_failure(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;

        let server = test_server(test_state(pool));
        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "https://plausible-looking.example.com")
            .await;

        response.assert_status_forbidden();
        assert_eq!(response.json::<serde_json::Value>()["code"], "NO_ALLOWED_ORIGINS");
    }

    #[sqlx::test]
    async fn test_origin_mismatch_names_the_origin(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;

        let server = test_server(test_state(pool));
        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "https://evil.example.net")
            .await;

        response.assert_status_forbidden();
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "ORIGIN_MISMATCH");
        assert!(body["error"].as_str().unwrap().contains("evil.example.net"));
    }

    #[sqlx::test]
    async fn test_valid_key_cannot_reach_another_clients_configurator(pool: PgPool) {
        let client_a = create_test_client(&pool, &["a.example.com"]).await;
        let client_b = create_test_client(&pool, &["b.example.com"]).await;
        let configurator_b = create_test_configurator(&pool, client_b.id, true).await;

        let server = test_server(test_state(pool));
        // Client A's key with Client B's public id: scoped lookup must miss
        let response = server
            .get(&format!("/configurator/{}", configurator_b.public_id))
            .add_query_param("publicKey", &client_a.public_key)
            .add_header("x-embed-origin", "https://a.example.com")
            .await;

        response.assert_status_not_found();
        assert_eq!(response.json::<serde_json::Value>()["code"], "NOT_FOUND");
    }

    #[sqlx::test]
    async fn test_unpublished_configurator_is_invisible(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, false).await;

        let server = test_server(test_state(pool));
        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "https://shop.example.com")
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_monthly_quota_rejects_beyond_limit(pool: PgPool) {
        let client = create_test_client(&pool, &["shop.example.com"]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;

        // Burn the quota down to one remaining request
        sqlx::query("UPDATE clients SET request_limit = 2, monthly_requests = 1 WHERE id = $1")
            .bind(client.id)
            .execute(&pool)
            .await
            .unwrap();

        let server = test_server(test_state(pool));
        let request = || {
            server
                .get(&format!("/configurator/{}", configurator.public_id))
                .add_query_param("publicKey", &client.public_key)
                .add_header("x-embed-origin", "https://shop.example.com")
        };

        // Request 2 of 2 passes; request 3 is over the limit
        request().await.assert_status_ok();

        let response = request().await;
        response.assert_status_forbidden();
        assert_eq!(response.json::<serde_json::Value>()["code"], "REQUEST_LIMIT_EXCEEDED");
    }

    #[sqlx::test]
    async fn test_localhost_bypass_is_config_gated(pool: PgPool) {
        let client = create_test_client(&pool, &[]).await;
        let configurator = create_test_configurator(&pool, client.id, true).await;

        // Default test config allows localhost even with an empty allow-list
        let server = test_server(test_state(pool.clone()));
        server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "http://localhost:3000")
            .await
            .assert_status_ok();

        // Production-style config turns the bypass off
        let mut config = test_config();
        config.embed.allow_localhost = false;
        let server = test_server(test_state_with_config(pool, config));
        let response = server
            .get(&format!("/configurator/{}", configurator.public_id))
            .add_query_param("publicKey", &client.public_key)
            .add_header("x-embed-origin", "http://localhost:3000")
            .await;
        response.assert_status_forbidden();
        assert_eq!(response.json::<serde_json::Value>()["code"], "NO_ALLOWED_ORIGINS");
    }
}
