use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Default redirect target registered with the provider.
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
/// Provider authorization endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
/// Provider token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Provider REST API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1/";
/// Upper bound for `SESSION_DURATION_DAYS`.
pub const MAX_SESSION_DURATION_DAYS: i64 = 3650;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The OAuth client id issued by the provider.
    pub client_id: String,
    /// The OAuth client secret issued by the provider.
    pub client_secret: Zeroizing<String>,
    /// Space-delimited list of requested scopes.
    pub scope: String,
    /// Where the provider sends the browser back after consent.
    pub redirect_uri: String,
    /// The provider authorization endpoint.
    pub auth_url: String,
    /// The provider token endpoint.
    pub token_url: String,
    /// The provider REST API root.
    pub api_base_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Timeout applied to every outbound provider call.
    pub http_timeout: Duration,
    /// Optional Redis URL; sessions stay in memory when unset.
    pub redis_url: Option<String>,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// Directory served for `/` and unmatched paths.
    pub static_dir: String,
    /// Whether cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let client_secret = Zeroizing::new(
            env::var("CLIENT_SECRET").context("CLIENT_SECRET must be set")?,
        );

        let scope = env::var("SCOPE").context("SCOPE must be set (space-delimited scope list)")?;
        if scope.trim().is_empty() {
            anyhow::bail!("SCOPE must list at least one scope");
        }

        let timeout_secs: u64 = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("Invalid HTTP_TIMEOUT_SECS")?;

        Ok(Self {
            client_id: env::var("CLIENT_ID").context("CLIENT_ID must be set")?,
            client_secret,
            scope,
            redirect_uri: env::var("REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string()),
            auth_url: env::var("AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            token_url: env::var("TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            http_timeout: Duration::from_secs(timeout_secs),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            session_duration_days: parse_session_duration_days(
                &env::var("SESSION_DURATION_DAYS").unwrap_or_else(|_| "7".to_string()),
            )?,
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
        })
    }
}

/// Parses the session lifetime, which must be between 1 and
/// [`MAX_SESSION_DURATION_DAYS`] days.
fn parse_session_duration_days(raw: &str) -> Result<i64> {
    let days: i64 = raw.trim().parse().context("Invalid SESSION_DURATION_DAYS")?;
    if !(1..=MAX_SESSION_DURATION_DAYS).contains(&days) {
        anyhow::bail!(
            "SESSION_DURATION_DAYS must be between 1 and {}, got {}",
            MAX_SESSION_DURATION_DAYS,
            days
        );
    }
    Ok(days)
}
