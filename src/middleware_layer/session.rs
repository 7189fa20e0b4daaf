use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    config::MAX_SESSION_DURATION_DAYS,
    error::{AppError, Result},
    models::session::Session,
    services::auth::{self as auth_service, TokenStatus},
    state::AppState,
};

/// Name of the signed cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Request-scoped view of the browser session.
///
/// Handlers mutate `session` freely and call [`SessionContext::commit`] to
/// persist. Nothing is written (and no cookie is issued) while the session
/// stays empty.
pub struct SessionContext {
    /// The session as the current request sees it.
    pub session: Session,
    id: Option<Uuid>,
    persisted: Session,
    cookies: Cookies,
}

/// Creates the session cookie, mirroring the attributes the rest of the app expects.
fn create_session_cookie(value: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    let max_age_days = max_age_days.clamp(1, MAX_SESSION_DURATION_DAYS);
    cookie.set_max_age(Duration::days(max_age_days));
    cookie.set_path("/");
    cookie
}

/// Reads the session id from the signed cookie, ignoring tampered or garbled values.
fn extract_session_id(cookies: &Cookies, state: &AppState) -> Option<Uuid> {
    cookies
        .signed(&state.cookie_key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let stored = match extract_session_id(&cookies, state) {
            Some(id) => state.sessions.load(id).await?.map(|session| (id, session)),
            None => None,
        };

        let (id, session) = match stored {
            Some((id, session)) => {
                tracing::debug!("🔑 Found session: {}", id);
                (Some(id), session)
            }
            None => (None, Session::default()),
        };

        Ok(SessionContext {
            persisted: session.clone(),
            session,
            id,
            cookies,
        })
    }
}

impl SessionContext {
    /// Resolves a usable bearer token for this session, refreshing inline.
    ///
    /// Any change the refresh made (new token, or credentials dropped after a
    /// failed refresh) is committed before returning. `AppError::Unauthenticated`
    /// turns into the redirect to `/login`.
    pub async fn bearer_token(&mut self, state: &AppState) -> Result<String> {
        let status = auth_service::ensure_valid_token(&state.oauth, &mut self.session).await;
        self.commit(state).await?;

        match status {
            TokenStatus::Valid(token) => Ok(token),
            TokenStatus::Unauthenticated => Err(AppError::Unauthenticated),
        }
    }

    /// Persists `session` if the request changed it.
    ///
    /// A first non-empty write allocates an id and issues the signed cookie;
    /// emptying a stored session deletes it and clears the cookie.
    pub async fn commit(&mut self, state: &AppState) -> Result<()> {
        if self.session == self.persisted {
            return Ok(());
        }

        let empty = self.session == Session::default();
        match (self.id, empty) {
            (Some(id), true) => {
                state.sessions.delete(id).await?;
                let mut cookie = Cookie::new(SESSION_COOKIE, "");
                cookie.set_max_age(Duration::seconds(0));
                cookie.set_path("/");
                self.cookies.remove(cookie);
                self.id = None;
                tracing::info!("👋 Session cleared: {}", id);
            }
            (None, true) => {}
            (Some(id), false) => {
                state.sessions.save(id, &self.session).await?;
            }
            (None, false) => {
                let id = Uuid::new_v4();
                state.sessions.save(id, &self.session).await?;
                self.cookies.signed(&state.cookie_key).add(create_session_cookie(
                    id.to_string(),
                    state.config.session_duration_days,
                    state.config.secure_cookies,
                ));
                self.id = Some(id);
                tracing::info!("✅ Session created: {}", id);
            }
        }

        self.persisted = self.session.clone();
        Ok(())
    }
}
