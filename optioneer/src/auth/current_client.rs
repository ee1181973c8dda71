//! Session-cookie extractor for dashboard requests.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    api::models::clients::CurrentClient,
    auth::session,
    errors::{Error, Result},
    AppState,
};

/// Extract a client from the JWT session cookie if present and valid.
/// Returns:
/// - None: no session cookie present
/// - Some(Ok(client)): valid JWT found and verified
/// - Some(Err(error)): cookie header present but unreadable
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentClient>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(client) => return Some(Ok(client)),
                    Err(_) => {
                        // Expired or invalid token; treat like no session so
                        // the caller gets a clean 401
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentClient {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(client)) => Ok(client),
            Some(Err(error)) => Err(error),
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}

/// Optional variant used by the dual-mode quote endpoint: a missing or
/// invalid session is not an error there, it just means the caller must
/// present an embed public key instead.
pub struct MaybeClient(pub Option<CurrentClient>);

impl FromRequestParts<AppState> for MaybeClient {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(client)) => Ok(MaybeClient(Some(client))),
            _ => Ok(MaybeClient(None)),
        }
    }
}
