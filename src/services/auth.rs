//! OAuth2 Authorization Code flow against the provider and the token
//! lifecycle built on top of it.
//!
//! Nothing in here knows about HTTP responses: callers get a [`TokenStatus`]
//! or an [`AuthError`] and decide how to answer the browser.

use anyhow::Context;
use chrono::Utc;
use zeroize::Zeroizing;

use crate::config::Config;
use crate::error::AuthError;
use crate::models::session::Session;
use crate::models::token::TokenInfo;

/// Grant type for the authorization-code exchange.
const AUTHORIZATION_CODE_GRANT_TYPE: &str = "authorization_code";
/// Grant type for refresh requests.
const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";

/// Client for the provider's authorization and token endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: Zeroizing<String>,
    scope: String,
    redirect_uri: String,
    auth_url: reqwest::Url,
    token_url: reqwest::Url,
    http: reqwest::Client,
}

/// Outcome of [`ensure_valid_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// A bearer token that is not past its expiry.
    Valid(String),
    /// No token, or the refresh failed. The user has to log in again.
    Unauthenticated,
}

impl OAuthClient {
    /// Creates a new `OAuthClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    /// * `http` - The shared outbound HTTP client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the client, or an error if an endpoint URL is invalid.
    pub fn new(config: &Config, http: reqwest::Client) -> anyhow::Result<Self> {
        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_url: config.auth_url.parse().context("AUTH_URL must be a valid URL")?,
            token_url: config.token_url.parse().context("TOKEN_URL must be a valid URL")?,
            http,
        })
    }

    /// Exchanges a one-time authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, AuthError> {
        let params = [
            ("grant_type", AUTHORIZATION_CODE_GRANT_TYPE),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request_token(&params).await
    }

    /// Trades a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenInfo, AuthError> {
        let params = [
            ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request_token(&params).await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenInfo, AuthError> {
        let response = self
            .http
            .post(self.token_url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        sonic_rs::from_slice::<TokenInfo>(&bytes).map_err(|e| AuthError::Malformed(e.to_string()))
    }
}

/// Builds the provider authorization URL the browser is sent to.
pub fn begin_login(client: &OAuthClient) -> String {
    let mut url = client.auth_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &client.client_id)
        .append_pair("response_type", "code")
        .append_pair("scope", &client.scope)
        .append_pair("redirect_uri", &client.redirect_uri);
    url.into()
}

/// Exchanges `code` and stores the resulting credentials in `session`.
///
/// `expires_at` is computed from the instant the response was received.
///
/// # Errors
///
/// [`AuthError::Transport`] if the token endpoint is unreachable,
/// [`AuthError::Rejected`] on a non-2xx status, [`AuthError::Malformed`] if
/// the body does not decode or lacks a refresh token.
pub async fn complete_login(
    client: &OAuthClient,
    session: &mut Session,
    code: &str,
) -> Result<TokenInfo, AuthError> {
    let info = client.exchange_code(code).await?;
    let received_at = Utc::now();

    if info.refresh_token.is_none() {
        return Err(AuthError::Malformed("missing field `refresh_token`".to_string()));
    }

    session.apply_token(info.clone(), received_at)?;
    tracing::info!("✅ Token exchange completed, expires in {}s", info.expires_in);

    Ok(info)
}

/// Returns a bearer token that is not past its expiry, refreshing inline if needed.
///
/// A failed refresh resets the whole session, so the next commit deletes it
/// and the dead refresh token is never retried.
pub async fn ensure_valid_token(client: &OAuthClient, session: &mut Session) -> TokenStatus {
    let Some(credentials) = session.credentials.as_ref() else {
        tracing::debug!("🔒 Session has no token");
        return TokenStatus::Unauthenticated;
    };

    if !credentials.is_stale(Utc::now()) {
        return TokenStatus::Valid(credentials.access_token.clone());
    }

    tracing::info!("🔄 Access token expired at {}, refreshing", credentials.expires_at);
    let refresh_token = credentials.refresh_token.clone();

    let refreshed = match client.refresh(&refresh_token).await {
        Ok(info) => {
            let access_token = info.access_token.clone();
            session.apply_token(info, Utc::now()).map(|()| access_token)
        }
        Err(e) => Err(e),
    };

    match refreshed {
        Ok(access_token) => {
            tracing::info!("✅ Access token refreshed");
            TokenStatus::Valid(access_token)
        }
        Err(e) => {
            tracing::warn!("❌ Token refresh failed: {}", e);
            *session = Session::default();
            TokenStatus::Unauthenticated
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::session::Credentials;
    use chrono::Duration;
    use std::net::SocketAddr;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_config(server_uri: &str) -> Config {
        Config {
            client_id: "test-client".to_string(),
            client_secret: Zeroizing::new("test-secret".to_string()),
            scope: "user-read-playback-state user-read-currently-playing".to_string(),
            redirect_uri: "http://127.0.0.1:5000/callback".to_string(),
            auth_url: format!("{}/authorize", server_uri),
            token_url: format!("{}/api/token", server_uri),
            api_base_url: format!("{}/v1/", server_uri),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            http_timeout: std::time::Duration::from_secs(5),
            redis_url: None,
            session_duration_days: 7,
            static_dir: "static".to_string(),
            secure_cookies: false,
        }
    }

    fn client_for(server: &MockServer) -> OAuthClient {
        OAuthClient::new(&test_config(&server.uri()), reqwest::Client::new()).unwrap()
    }

    fn session_with(access: &str, refresh: &str, expires_in_secs: i64) -> Session {
        Session {
            credentials: Some(Credentials {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
                expires_at: Utc::now() + Duration::seconds(expires_in_secs),
            }),
            ..Session::default()
        }
    }

    #[test]
    fn begin_login_carries_fixed_parameters() {
        let client =
            OAuthClient::new(&test_config("https://accounts.example.com"), reqwest::Client::new())
                .unwrap();

        let url: reqwest::Url = begin_login(&client).parse().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/authorize");
        assert!(pairs.contains(&("client_id".into(), "test-client".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "user-read-playback-state user-read-currently-playing".into()
        )));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://127.0.0.1:5000/callback".into()
        )));
    }

    #[tokio::test]
    async fn complete_login_stores_absolute_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("client_secret=test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A",
                "token_type": "Bearer",
                "refresh_token": "R",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = Session::default();

        let before = Utc::now();
        complete_login(&client, &mut session, "abc").await.unwrap();
        let after = Utc::now();

        let creds = session.credentials.unwrap();
        assert_eq!(creds.access_token, "A");
        assert_eq!(creds.refresh_token, "R");
        assert!(creds.expires_at >= before + Duration::seconds(3600));
        assert!(creds.expires_at <= after + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn complete_login_rejects_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = Session::default();

        match complete_login(&client, &mut session, "used-code").await {
            Err(AuthError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_grant");
            }
            other => panic!("Expected Rejected, got: {other:?}"),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn complete_login_requires_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "A", "expires_in": 3600})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = Session::default();

        let result = complete_login(&client, &mut session, "abc").await;
        assert!(matches!(result, Err(AuthError::Malformed(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn complete_login_rejects_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = complete_login(&client, &mut Session::default(), "abc").await;
        assert!(matches!(result, Err(AuthError::Malformed(_))));
    }

    #[tokio::test]
    async fn complete_login_rejects_out_of_range_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A",
                "refresh_token": "R",
                "expires_in": 1_000_000_000_000_000_i64
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = Session::default();

        let result = complete_login(&client, &mut session, "abc").await;
        assert!(matches!(result, Err(AuthError::Malformed(_))));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn ensure_valid_token_without_session_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = Session::default();

        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Unauthenticated
        );
    }

    #[tokio::test]
    async fn ensure_valid_token_returns_fresh_token_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = session_with("A", "R", 600);
        let before = session.clone();

        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Valid("A".to_string())
        );
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn stale_token_is_refreshed_once_and_keeps_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=R"))
            .and(body_string_contains("client_id=test-client"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "B", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = session_with("A", "R", -10);

        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Valid("B".to_string())
        );

        let creds = session.credentials.as_ref().unwrap();
        assert_eq!(creds.access_token, "B");
        assert_eq!(creds.refresh_token, "R");
        assert!(!creds.is_stale(Utc::now()));
    }

    #[tokio::test]
    async fn rotated_refresh_token_replaces_the_old_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "B",
                "refresh_token": "R2",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = session_with("A", "R", -10);
        ensure_valid_token(&client, &mut session).await;

        assert_eq!(session.credentials.unwrap().refresh_token, "R2");
    }

    #[tokio::test]
    async fn refresh_with_out_of_range_expiry_resets_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "B", "expires_in": -5})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = session_with("A", "R", -10);

        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Unauthenticated
        );
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn failed_refresh_resets_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut session = session_with("A", "R", -10);
        session.track_name = Some("Nights".to_string());
        session.device_id = Some("dev-1".to_string());

        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Unauthenticated
        );
        assert_eq!(session, Session::default());

        // Second call must not retry the dead refresh token.
        assert_eq!(
            ensure_valid_token(&client, &mut session).await,
            TokenStatus::Unauthenticated
        );
    }
}
