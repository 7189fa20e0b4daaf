use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use http::{header, HeaderValue, Method};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, state::AppState};

/// Builds the full HTTP router.
///
/// CORS admits only the origin of the configured redirect URI, which is
/// where the dashboard page is served from.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let redirect: reqwest::Url = state
        .config
        .redirect_uri
        .parse()
        .context("REDIRECT_URI must be a valid URL")?;
    let origin = HeaderValue::from_str(&redirect.origin().ascii_serialization())
        .context("REDIRECT_URI origin is not a valid header value")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let static_dir = state.config.static_dir.clone();

    let auth_routes = Router::new()
        .route("/login", get(handlers::auth::login))
        .route("/callback", get(handlers::auth::callback))
        .route("/refresh_token", get(handlers::auth::refresh_token))
        .route("/logout", get(handlers::auth::logout))
        .with_state(state.clone());

    let player_routes = Router::new()
        .route("/currentlyPlaying", get(handlers::player::currently_playing))
        .route("/playlists", get(handlers::player::playlists))
        .route("/get_devices", get(handlers::player::get_devices))
        .route(
            "/get_current_playing_device",
            get(handlers::player::get_current_playing_device),
        )
        .route("/user_profile", get(handlers::player::user_profile))
        .route("/sdk", get(handlers::dashboard::sdk))
        .with_state(state);

    let app = Router::new()
        .merge(auth_routes)
        .merge(player_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .fallback_service(ServeDir::new(static_dir));

    Ok(app)
}
