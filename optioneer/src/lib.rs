//! # Optioneer: a multi-tenant product-configurator platform
//!
//! Optioneer lets clients (the tenants) build embeddable product
//! configurators - categories of options with prices, compatibility rules,
//! and themes. End customers interact with the embed on the client's own
//! website and submit quotes; clients manage their catalog, themes, quotes,
//! and billing through a session-authenticated dashboard API.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via sqlx) for all persistence.
//!
//! ### Request flows
//!
//! **Dashboard requests** (`/api/v1/*`, `/authentication/*`) follow a
//! traditional web-application flow: a JWT session cookie is resolved to a
//! `CurrentClient` by an extractor, handlers perform ownership checks, and
//! repositories in [`db`] run the queries.
//!
//! **Embed requests** (`/configurator/{public_id}`, `/quote`) come from
//! untrusted browser contexts on third-party sites. They authenticate with a
//! per-client public key plus a declared origin, validated against the
//! client's domain allow-list by the [`auth::embed`] extractor before any
//! handler runs. Responses carry CORS headers scoped to the validated
//! origin.
//!
//! **Public quote reads** (`/quote/{quote_code}`) need no authentication at
//! all: the unguessable quote code is the capability.
//!
//! ### Core domain logic
//!
//! The pure modules [`selection`] (compatibility validation), [`pricing`]
//! (decimal-safe totals), and [`theming`] (HSL color math and CSS variable
//! derivation) contain the correctness-critical rules and have no I/O; the
//! quote-creation path calls them synchronously before persisting anything.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use optioneer::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = optioneer::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     optioneer::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
pub mod email;
pub mod errors;
pub mod limits;
mod openapi;
mod payment_providers;
pub mod pricing;
pub mod rate_limit;
pub mod selection;
pub mod telemetry;
pub mod theming;
mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{
    http,
    routing::{delete, get, patch, post},
    Router,
};
use bon::Builder;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
use email::EmailService;
use openapi::ApiDoc;
use rate_limit::{InProcessThrottle, RequestThrottle};

pub use types::{CategoryId, ClientId, ConfiguratorId, OptionId, QuoteId, ThemeId};

use crate::config::CorsOrigin;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Quote notification delivery; None when email is disabled
    pub email: Option<Arc<EmailService>>,
    /// Coarse per-public-key embed throttle (in-process, best-effort)
    pub throttle: Arc<dyn RequestThrottle>,
}

/// Get the optioneer database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to the database and run migrations.
#[instrument(skip_all)]
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create the dashboard CORS layer from configuration. Embed endpoints emit
/// their own per-client CORS headers and are unaffected by this layer's
/// origin list.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Authentication routes (at root level)
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .with_state(state.clone());

    // Dashboard API routes (session-authenticated)
    let api_routes = Router::new()
        .route(
            "/account",
            get(api::handlers::auth::get_account).patch(api::handlers::auth::update_account),
        )
        // Configurators
        .route("/configurators", get(api::handlers::configurators::list_configurators))
        .route("/configurators", post(api::handlers::configurators::create_configurator))
        .route("/configurators/{id}", get(api::handlers::configurators::get_configurator))
        .route("/configurators/{id}", patch(api::handlers::configurators::update_configurator))
        .route("/configurators/{id}", delete(api::handlers::configurators::delete_configurator))
        // Categories as configurator sub-resources
        .route(
            "/configurators/{configurator_id}/categories",
            get(api::handlers::categories::list_categories).post(api::handlers::categories::create_category),
        )
        .route("/categories/{id}", get(api::handlers::categories::get_category))
        .route("/categories/{id}", patch(api::handlers::categories::update_category))
        .route("/categories/{id}", delete(api::handlers::categories::delete_category))
        // Options as category sub-resources
        .route(
            "/categories/{category_id}/options",
            get(api::handlers::options::list_options).post(api::handlers::options::create_option),
        )
        .route("/options/{id}", get(api::handlers::options::get_option))
        .route("/options/{id}", patch(api::handlers::options::update_option))
        .route("/options/{id}", delete(api::handlers::options::delete_option))
        // Relation edges
        .route("/options/{id}/incompatibilities", post(api::handlers::options::add_incompatibility))
        .route(
            "/options/{id}/incompatibilities/{other_id}",
            delete(api::handlers::options::remove_incompatibility),
        )
        .route("/options/{id}/dependencies", post(api::handlers::options::add_dependency))
        .route(
            "/options/{id}/dependencies/{dep_id}",
            delete(api::handlers::options::remove_dependency),
        )
        // Quotes
        .route("/quotes", get(api::handlers::quotes::list_quotes))
        .route("/quotes/{id}", get(api::handlers::quotes::get_quote))
        .route("/quotes/{id}", patch(api::handlers::quotes::update_quote))
        .route("/quotes/{id}", delete(api::handlers::quotes::delete_quote))
        // Themes
        .route("/themes", get(api::handlers::themes::list_themes).put(api::handlers::themes::upsert_theme))
        .route("/themes/active", get(api::handlers::themes::get_active_theme))
        .route("/themes/reset", post(api::handlers::themes::reset_theme))
        .route("/themes/{id}", delete(api::handlers::themes::delete_theme))
        // Billing
        .route("/billing/usage", get(api::handlers::billing::get_usage))
        .route("/billing/checkout", post(api::handlers::billing::create_checkout))
        .route("/billing/verify", post(api::handlers::billing::verify_payment))
        .with_state(state.clone());

    // Public embed and customer routes
    let embed_routes = Router::new()
        .route(
            "/configurator/{public_id}",
            get(api::handlers::embed::get_embed_configurator).options(api::handlers::embed::embed_preflight),
        )
        .route(
            "/quote",
            post(api::handlers::quotes::create_quote).options(api::handlers::embed::embed_preflight),
        )
        .route("/quote/{quote_code}", get(api::handlers::quotes::get_quote_by_code))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (external services, not part of the client API docs)
        .route("/webhooks/payments", post(api::handlers::billing::webhook_handler))
        .with_state(state.clone())
        .merge(auth_routes)
        .merge(embed_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Dashboard CORS, then tracing outermost
    let router = router.layer(create_cors_layer(&state.config)?).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and builds the router
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::debug!("Starting Optioneer with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let email = if config.email.enabled {
            Some(Arc::new(EmailService::new(&config).map_err(|e| anyhow::anyhow!("email setup: {e}"))?))
        } else {
            None
        };

        let throttle: Arc<dyn RequestThrottle> =
            Arc::new(InProcessThrottle::new(config.embed.requests_per_minute, Duration::from_secs(60)));

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_email(email)
            .throttle(throttle)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Optioneer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
