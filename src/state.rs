use tower_cookies::Key;

use crate::config::Config;
use crate::crypto::cookie_key::generate_cookie_key;
use crate::error::{AppError, Result};
use crate::services::auth::OAuthClient;
use crate::services::player::SpotifyApi;
use crate::session_store::SessionStore;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Token endpoint client.
    pub oauth: OAuthClient,
    /// Provider REST API client.
    pub api: SpotifyApi,
    /// Server-side session storage.
    pub sessions: SessionStore,
    /// Key signing the `session_id` cookie.
    pub cookie_key: Key,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let sessions = match &config.redis_url {
            Some(url) => {
                let store = SessionStore::redis(url, config.session_duration_days).await?;
                tracing::info!("✅ Redis session store initialized (pooled)");
                store
            }
            None => {
                tracing::info!("✅ In-memory session store initialized");
                SessionStore::memory()
            }
        };

        Self::with_store(config, sessions)
    }

    /// Creates an `AppState` around an existing session store.
    pub fn with_store(config: &Config, sessions: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client init failed: {}", e)))?;
        tracing::info!("✅ HTTP client initialized (timeout {:?})", config.http_timeout);

        let oauth = OAuthClient::new(config, http.clone())
            .map_err(|e| AppError::Internal(format!("{:#}", e)))?;
        let api = SpotifyApi::new(http, config.api_base_url.clone());

        let cookie_key = generate_cookie_key();
        tracing::info!("✅ Cookie signing key generated");

        Ok(AppState {
            config: config.clone(),
            oauth,
            api,
            sessions,
            cookie_key,
        })
    }
}
