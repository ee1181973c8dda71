//! API models for registration, login, and logout.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::{clients::ClientResponse, envelope::ApiResponse};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub client: ClientResponse,
    pub message: String,
}

/// A successful register/login: the envelope body plus the session cookie.
pub struct AuthSuccess {
    pub status: StatusCode,
    pub response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for AuthSuccess {
    fn into_response(self) -> Response {
        let message = self.response.message.clone();
        (
            self.status,
            [(header::SET_COOKIE, self.cookie)],
            Json(ApiResponse::ok_with_message(self.response, message)),
        )
            .into_response()
    }
}

/// Logout clears the cookie and carries no data.
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, self.cookie)],
            Json(ApiResponse::message("Logged out")),
        )
            .into_response()
    }
}
