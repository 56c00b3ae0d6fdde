//! Web server configuration
//!
//! Loaded from the environment (after `dotenvy` has populated it), with
//! CLI overrides applied by the binary. Secrets live here once and are
//! injected into the services that need them at startup.

use serde::{Deserialize, Serialize};

const DEFAULT_SIGNING_SECRET: &str = "carelink-default-secret-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// SQLite database URL; `None` runs on the in-memory store.
    pub database_url: Option<String>,
    /// Secret for signed pre-auth tokens.
    pub signing_secret: String,
    /// Shared secret for the internal service backend.
    pub internal_secret: String,
    /// Lifetime of signed pre-auth tokens, in seconds.
    pub signed_token_ttl_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            signing_secret: DEFAULT_SIGNING_SECRET.to_string(),
            internal_secret: String::new(),
            signed_token_ttl_secs: 2 * 3600,
        }
    }
}

impl WebConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("CARELINK_HOST").unwrap_or(defaults.host),
            port: std::env::var("CARELINK_PORT")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").ok(),
            signing_secret: std::env::var("CARELINK_SIGNING_SECRET")
                .unwrap_or(defaults.signing_secret),
            internal_secret: std::env::var("CARELINK_INTERNAL_SECRET")
                .unwrap_or(defaults.internal_secret),
            signed_token_ttl_secs: std::env::var("CARELINK_SIGNED_TOKEN_TTL")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.signed_token_ttl_secs),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
