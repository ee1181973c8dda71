//! Shared helpers for database-backed tests.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    api::models::clients::CurrentClient,
    auth::session,
    crypto,
    db::handlers::{Categories, Clients, Configurators, Options, Repository},
    db::models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryType},
    db::models::clients::{ClientCreateDBRequest, ClientDBResponse, ClientUpdateDBRequest},
    db::models::configurators::{ConfiguratorCreateDBRequest, ConfiguratorDBResponse, ConfiguratorUpdateDBRequest},
    db::models::options::{OptionCreateDBRequest, OptionDBResponse},
    rate_limit::InProcessThrottle,
    types::{CategoryId, ClientId, ConfiguratorId},
    AppState, Config,
};

/// Config suitable for tests: sessions enabled, throttle off, email off.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key".to_string());
    config.embed.requests_per_minute = 0;
    config.email.enabled = false;
    config
}

pub fn test_state(pool: PgPool) -> AppState {
    test_state_with_config(pool, test_config())
}

pub fn test_state_with_config(pool: PgPool, config: Config) -> AppState {
    let throttle = Arc::new(InProcessThrottle::new(config.embed.requests_per_minute, Duration::from_secs(60)));
    AppState::builder().db(pool).config(config).throttle(throttle).build()
}

pub fn test_server(state: AppState) -> axum_test::TestServer {
    let router = crate::build_router(&state).expect("failed to build test router");
    axum_test::TestServer::new(router).expect("Failed to create test server")
}

/// Session cookie header value for a client, as the dashboard would send it.
pub fn session_cookie_for(client: &ClientDBResponse, config: &Config) -> String {
    let current = CurrentClient {
        id: client.id,
        email: client.email.clone(),
        company_name: client.company_name.clone(),
    };
    let token = session::create_session_token(&current, config).expect("failed to create session token");
    format!("{}={}", config.auth.native.session.cookie_name, token)
}

pub async fn create_test_client(pool: &PgPool, allowed_domains: &[&str]) -> ClientDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut clients = Clients::new(&mut conn);

    let created = clients
        .create(&ClientCreateDBRequest {
            email: format!("{}@test.example", uuid::Uuid::new_v4()),
            password_hash: None,
            company_name: Some("Test Co".to_string()),
            public_key: crypto::generate_public_key(),
            request_limit: 10_000,
        })
        .await
        .expect("failed to create test client");

    if allowed_domains.is_empty() {
        return created;
    }

    clients
        .update(
            created.id,
            &ClientUpdateDBRequest {
                company_name: None,
                allowed_domains: Some(allowed_domains.iter().map(|d| d.to_string()).collect()),
                subscription_status: None,
            },
        )
        .await
        .expect("failed to set allowed domains")
}

pub async fn create_test_configurator(pool: &PgPool, client_id: ClientId, published: bool) -> ConfiguratorDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Configurators::new(&mut conn);

    let created = repo
        .create(&ConfiguratorCreateDBRequest {
            client_id,
            public_id: crypto::generate_public_id(),
            name: "Test configurator".to_string(),
            description: None,
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
        })
        .await
        .expect("failed to create test configurator");

    if !published {
        return created;
    }

    repo.update(
        created.id,
        &ConfiguratorUpdateDBRequest {
            published: Some(true),
            ..Default::default()
        },
    )
    .await
    .expect("failed to publish test configurator")
}

pub async fn create_test_category(pool: &PgPool, configurator_id: ConfiguratorId, is_primary: bool, is_required: bool) -> CategoryDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Categories::new(&mut conn);

    repo.create(&CategoryCreateDBRequest {
        configurator_id,
        name: "Test category".to_string(),
        category_type: CategoryType::Generic,
        position: 0,
        is_primary: Some(is_primary),
        is_required,
    })
    .await
    .expect("failed to create test category")
}

pub async fn create_test_option(pool: &PgPool, category_id: CategoryId, label: &str, price: &str) -> OptionDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut repo = Options::new(&mut conn);

    repo.create(&OptionCreateDBRequest {
        category_id,
        label: label.to_string(),
        description: None,
        price: Decimal::from_str_exact(price).unwrap(),
        sku: None,
        image_url: None,
        is_default: false,
    })
    .await
    .expect("failed to create test option")
}
