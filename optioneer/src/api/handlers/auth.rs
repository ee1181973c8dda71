//! Registration, login, logout, and account settings.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::handlers::is_valid_email,
    api::models::{
        auth::{AuthResponse, AuthSuccess, LoginRequest, LogoutResponse, RegisterRequest},
        clients::{ClientResponse, ClientSettingsUpdate, CurrentClient},
        envelope::ApiResponse,
    },
    auth::{password, session},
    crypto,
    db::handlers::{Clients, Repository, Themes},
    db::models::clients::{ClientCreateDBRequest, ClientUpdateDBRequest},
    db::models::themes::ThemeCreateDBRequest,
    errors::{Error, Result},
    AppState,
};

/// Register a new client account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Client registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<AuthSuccess> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }

    if !is_valid_email(&request.email) {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }

    let password_config = &state.config.auth.native.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut clients = Clients::new(&mut tx);
    if clients.get_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking the runtime
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = ClientCreateDBRequest {
        email: request.email,
        password_hash: Some(password_hash),
        company_name: request.company_name,
        public_key: crypto::generate_public_key(),
        request_limit: state.config.embed.default_request_limit,
    };
    let created = clients.create(&create_request).await?;

    // Every account starts with the platform default theme
    let mut themes = Themes::new(&mut tx);
    themes.create(&ThemeCreateDBRequest::default_for(created.id)).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let current = CurrentClient::from(created.clone());
    let token = session::create_session_token(&current, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(AuthSuccess {
        status: StatusCode::CREATED,
        response: AuthResponse {
            client: ClientResponse::from(created),
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<AuthSuccess> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);

    // A missing account and a wrong password answer identically
    let client = clients.get_by_email(&request.email).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    let password_hash = client.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    let password = request.password.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    let current = CurrentClient::from(client.clone());
    let token = session::create_session_token(&current, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(AuthSuccess {
        status: StatusCode::OK,
        response: AuthResponse {
            client: ClientResponse::from(client),
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout by expiring the session cookie
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logged out"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        cookie: create_expired_cookie(&state.config),
    }
}

/// Get the current account, including the embed public key and allow-list
#[utoipa::path(
    get,
    path = "/api/v1/account",
    tag = "account",
    responses(
        (status = 200, description = "Current account", body = ClientResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_account(State(state): State<AppState>, current: CurrentClient) -> Result<Json<ApiResponse<ClientResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);

    let client = clients.get_by_id(current.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Client".to_string(),
        id: current.id.to_string(),
    })?;

    Ok(Json(ApiResponse::ok(ClientResponse::from(client))))
}

/// Update account settings (company name, embed domain allow-list)
#[utoipa::path(
    patch,
    path = "/api/v1/account",
    request_body = ClientSettingsUpdate,
    tag = "account",
    responses(
        (status = 200, description = "Updated account", body = ClientResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_account(
    State(state): State<AppState>,
    current: CurrentClient,
    Json(request): Json<ClientSettingsUpdate>,
) -> Result<Json<ApiResponse<ClientResponse>>> {
    // Normalize domains: lowercase hostnames, no schemes, no empties
    let allowed_domains = request.allowed_domains.map(|domains| {
        domains
            .into_iter()
            .map(|d| {
                d.trim()
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_ascii_lowercase()
            })
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
    });

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);

    let updated = clients
        .update(
            current.id,
            &ClientUpdateDBRequest {
                company_name: request.company_name,
                allowed_domains,
                subscription_status: None,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(ClientResponse::from(updated))))
}

fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}

fn create_expired_cookie(config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    format!(
        "{}=; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age=0",
        session_config.cookie_name, session_config.cookie_secure, session_config.cookie_same_site
    )
}
