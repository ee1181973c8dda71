//! The embed trust boundary.
//!
//! An embedded configurator runs in an untrusted browser context on a
//! third-party site. It authenticates with the client's opaque public key and
//! must declare its origin via the `X-Embed-Origin` header. Resolution runs
//! once at the boundary and produces an [`EmbedContext`] that handlers
//! consume; no handler re-derives auth state.
//!
//! Checks, in order:
//!
//! 1. public key present (`MISSING_CLIENT_KEY`) and within the in-process
//!    throttle budget (`RATE_LIMIT`);
//! 2. key resolves to a client - malformed and unknown keys both return the
//!    same `CLIENT_NOT_FOUND` shape so responses carry no enumeration signal;
//! 3. origin declared (`MISSING_EMBED_ORIGIN`) and parsable
//!    (`INVALID_ORIGIN`);
//! 4. the client's allow-list is non-empty (`NO_ALLOWED_ORIGINS`) and matches
//!    the origin host exactly or as a dot-suffix subdomain
//!    (`ORIGIN_MISMATCH`); localhost bypasses only when
//!    `embed.allow_localhost` is set;
//! 5. the monthly quota has room (`REQUEST_LIMIT_EXCEEDED`) - the increment
//!    and the comparison are one statement.

use axum::{extract::FromRequestParts, http::request::Parts};
use url::Url;

use crate::{
    db::handlers::Clients,
    db::models::clients::ClientDBResponse,
    errors::{Error, Result},
    rate_limit::RequestThrottle,
    AppState,
};

/// Header the embed uses to declare where it is hosted.
pub const EMBED_ORIGIN_HEADER: &str = "x-embed-origin";

/// A fully validated embed caller: the key-resolved client and the origin the
/// response's CORS headers must be scoped to.
#[derive(Debug, Clone)]
pub struct EmbedContext {
    pub client: ClientDBResponse,
    pub origin: String,
}

/// The §4.5-style tagged auth context for dual-mode endpoints: a dashboard
/// session or a validated embed key, resolved once and passed explicitly.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Session(crate::api::models::clients::CurrentClient),
    Embed(EmbedContext),
}

impl AuthContext {
    pub fn client_id(&self) -> crate::types::ClientId {
        match self {
            AuthContext::Session(client) => client.id,
            AuthContext::Embed(context) => context.client.id,
        }
    }
}

/// Exact host match or dot-suffix subdomain match.
///
/// `shop.example.com` matches the allowed domain `example.com`;
/// `badexample.com` does not.
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn is_localhost(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1"
}

/// Extract the hostname from a declared origin value.
fn origin_host(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// Resolve an embed caller. `public_key` comes from the query string (reads)
/// or the request body (quote submission); `origin` is the declared
/// `X-Embed-Origin` header value.
pub async fn resolve_embed_context(state: &AppState, public_key: Option<&str>, origin: Option<&str>) -> Result<EmbedContext> {
    let public_key = public_key.filter(|k| !k.is_empty()).ok_or(Error::MissingClientKey)?;

    // Coarse per-key throttle before any database work
    if !state.throttle.allow(public_key) {
        return Err(Error::TooManyRequests {
            message: "Too many embed requests. Please retry later.".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut clients = Clients::new(&mut conn);

    let client = clients.get_by_public_key(public_key).await?.ok_or(Error::ClientNotFound)?;

    let origin = origin.filter(|o| !o.is_empty()).ok_or(Error::MissingEmbedOrigin)?;
    let host = origin_host(origin).ok_or_else(|| Error::InvalidOrigin {
        origin: origin.to_string(),
    })?;

    let localhost_bypass = state.config.embed.allow_localhost && is_localhost(&host);
    if !localhost_bypass {
        if client.allowed_domains.is_empty() {
            return Err(Error::NoAllowedOrigins);
        }
        let allowed = client
            .allowed_domains
            .iter()
            .any(|domain| host_matches_domain(&host, &domain.to_ascii_lowercase()));
        if !allowed {
            return Err(Error::OriginMismatch {
                origin: origin.to_string(),
            });
        }
    }

    // Count the request and enforce the monthly quota in one statement
    let (monthly_requests, request_limit) = clients.record_embed_request(client.id).await?;
    if monthly_requests > request_limit {
        return Err(Error::RequestLimitExceeded);
    }

    Ok(EmbedContext {
        client,
        origin: origin.to_string(),
    })
}

/// Query-string form used by embed reads: `?publicKey=pk-...`.
fn public_key_from_query(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    for pair in query.split('&') {
        if let Some((name, value)) = pair.split_once('=') {
            if name == "publicKey" {
                return Some(value.to_string());
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for EmbedContext {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let public_key = public_key_from_query(parts);
        let origin = parts
            .headers
            .get(EMBED_ORIGIN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        resolve_embed_context(state, public_key.as_deref(), origin.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_subdomain_matches() {
        assert!(host_matches_domain("example.com", "example.com"));
        assert!(host_matches_domain("shop.example.com", "example.com"));
        assert!(host_matches_domain("a.b.example.com", "example.com"));
    }

    #[test]
    fn test_suffix_collisions_do_not_match() {
        // A dot boundary is required: "badexample.com" must not satisfy
        // "example.com"
        assert!(!host_matches_domain("badexample.com", "example.com"));
        assert!(!host_matches_domain("example.com.evil.net", "example.com"));
        assert!(!host_matches_domain("example.org", "example.com"));
    }

    #[test]
    fn test_origin_host_extraction() {
        assert_eq!(origin_host("https://Shop.Example.COM"), Some("shop.example.com".to_string()));
        assert_eq!(origin_host("http://localhost:3000"), Some("localhost".to_string()));
        assert_eq!(origin_host("not an origin"), None);
        assert_eq!(origin_host(""), None);
    }

    #[test]
    fn test_localhost_detection() {
        assert!(is_localhost("localhost"));
        assert!(is_localhost("127.0.0.1"));
        assert!(!is_localhost("localhost.evil.com"));
        assert!(!is_localhost("192.168.1.10"));
    }
}
