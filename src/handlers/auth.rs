use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::{
    error::{found, AppError, Result},
    middleware_layer::session::SessionContext,
    models::session::Session,
    services::auth as auth_service,
    state::AppState,
    validation::oauth::validate_authorization_code,
};

/// Where the browser lands after a successful login.
pub const DASHBOARD_PATH: &str = "/sdk";

/// Query parameters the provider appends to the redirect URI.
#[derive(Deserialize, Debug)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Sends the browser to the provider's consent page.
#[axum::debug_handler]
pub async fn login(State(state): State<AppState>) -> Response {
    let url = auth_service::begin_login(&state.oauth);
    tracing::info!("🔐 Redirecting to provider authorization");
    found(&url)
}

/// Handles the provider redirect: exchanges the code and starts the session.
#[axum::debug_handler]
pub async fn callback(
    State(state): State<AppState>,
    mut ctx: SessionContext,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if let Some(error) = params.error {
        tracing::warn!("❌ Provider denied authorization: {}", error);
        return Err(AppError::BadRequest(error));
    }

    let code = params.code.unwrap_or_default();
    validate_authorization_code(&code)?;

    auth_service::complete_login(&state.oauth, &mut ctx.session, &code).await?;
    ctx.commit(&state).await?;

    tracing::info!("✅ User logged in");
    Ok(found(DASHBOARD_PATH))
}

/// Refreshes a stale token, then returns to the dashboard (or to login).
#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    ctx.bearer_token(&state).await?;
    Ok(found(DASHBOARD_PATH))
}

/// Forgets the session and returns to the landing page.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, mut ctx: SessionContext) -> Result<Response> {
    ctx.session = Session::default();
    ctx.commit(&state).await?;
    Ok(found("/"))
}
