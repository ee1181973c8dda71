//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can
//! be specified via `-f` flag or `OPTIONEER_CONFIG` environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `OPTIONEER_`
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables.
//! For example, `OPTIONEER_EMBED__ALLOW_LOCALHOST=false` sets
//! `embed.allow_localhost`.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "OPTIONEER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Base URL where the client dashboard is accessible. Used for payment
    /// redirect URLs and quote links in notification emails.
    pub dashboard_url: String,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Secret key for JWT signing (required for sessions)
    pub secret_key: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Email configuration for quote notifications
    pub email: EmailConfig,
    /// Payment provider configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentConfig>,
    /// Primary-option plan capacity settings
    pub billing: BillingConfig,
    /// Embed trust-boundary settings
    pub embed: EmbedConfig,
    /// Quote lifecycle settings
    pub quotes: QuotesConfig,
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("OPTIONEER_").split("__"))
            .extract()?;

        // DATABASE_URL is the conventional override used by most deploy targets
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3400,
            dashboard_url: "http://localhost:3400".to_string(),
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            payment: None,
            billing: BillingConfig::default(),
            embed: EmbedConfig::default(),
            quotes: QuotesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/optioneer".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub native: NativeAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeAuthConfig {
    /// Whether email/password authentication is enabled
    pub enabled: bool,
    /// Whether new clients may self-register
    pub allow_registration: bool,
    pub password: PasswordConfig,
    pub session: SessionConfig,
}

impl Default for NativeAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: String,
    /// Session cookie lifetime
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "optioneer_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "Lax".to_string(),
            timeout: Duration::from_secs(60 * 60 * 24 * 7),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT session token lifetime
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    pub cors: CorsConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(60 * 60 * 24),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS settings for the dashboard API. Embed endpoints emit their own
/// per-client CORS headers and are not governed by this layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds
    pub max_age: Option<u64>,
}

/// A dashboard CORS origin: either the wildcard `"*"` or a concrete URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsOrigin {
    Wildcard,
    Url(Url),
}

impl Serialize for CorsOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(&value)
                .map(CorsOrigin::Url)
                .map_err(|e| serde::de::Error::custom(format!("invalid CORS origin '{value}': {e}")))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmailConfig {
    /// Whether quote notification emails are sent at all
    pub enabled: bool,
    pub transport: EmailTransportConfig,
    pub from_email: String,
    pub from_name: String,
    /// Internal address for new-quote team notifications (None disables them)
    pub team_notifications_to: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            transport: EmailTransportConfig::default(),
            from_email: "quotes@optioneer.local".to_string(),
            from_name: "Optioneer".to_string(),
            team_notifications_to: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum EmailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        use_tls: bool,
    },
    /// Writes emails to files; for development and testing
    File { path: String },
}

impl Default for EmailTransportConfig {
    fn default() -> Self {
        EmailTransportConfig::File {
            path: "./emails".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase", deny_unknown_fields)]
pub enum PaymentConfig {
    Stripe(StripeConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Stripe price id for one capacity block
    pub block_price_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Primary options included before any purchased blocks
    pub included_primary_options: i64,
    /// Primary options added per purchased capacity block
    pub block_size: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            included_primary_options: 10,
            block_size: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedConfig {
    /// Let localhost/127.0.0.1 origins bypass the domain allow-list.
    /// Development convenience; production deployments set this to false.
    pub allow_localhost: bool,
    /// Monthly embed request allowance assigned to new clients
    pub default_request_limit: i32,
    /// Per-public-key in-process throttle (requests per minute, 0 = off)
    pub requests_per_minute: u32,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            allow_localhost: true,
            default_request_limit: 10_000,
            requests_per_minute: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotesConfig {
    /// When true, decided quotes only move `accepted -> converted`, and
    /// rejected/expired/converted are terminal. Off by default: any status
    /// may move to any status.
    pub enforce_transitions: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.port, 3400);
        assert!(config.auth.native.enabled);
        assert_eq!(config.billing.included_primary_options, 10);
        assert_eq!(config.billing.block_size, 10);
        assert!(config.embed.allow_localhost);
        assert!(!config.quotes.enforce_transitions);
    }

    #[test]
    fn test_env_overrides_nested_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                port: 9000
                embed:
                  allow_localhost: true
                "#,
            )?;
            jail.set_env("OPTIONEER_EMBED__ALLOW_LOCALHOST", "false");
            jail.set_env("OPTIONEER_SECRET_KEY", "env-secret");

            let args = Args {
                config: "config.yaml".to_string(),
                validate: false,
            };
            let config = Config::load(&args).expect("config should load");

            assert_eq!(config.port, 9000);
            assert!(!config.embed.allow_localhost);
            assert_eq!(config.secret_key.as_deref(), Some("env-secret"));
            Ok(())
        });
    }

    #[test]
    fn test_cors_origin_parsing() {
        let wildcard: CorsOrigin = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(wildcard, CorsOrigin::Wildcard);

        let url: CorsOrigin = serde_json::from_str("\"https://app.example.com\"").unwrap();
        assert!(matches!(url, CorsOrigin::Url(_)));

        assert!(serde_json::from_str::<CorsOrigin>("\"not a url\"").is_err());
    }
}
