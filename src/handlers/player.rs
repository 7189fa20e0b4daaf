use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::Result,
    middleware_layer::session::SessionContext,
    services::player as player_service,
    state::AppState,
};

/// Current track, or a message when nothing is playing.
#[axum::debug_handler]
pub async fn currently_playing(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;

    let response = match player_service::currently_playing(&state.api, &token).await? {
        Some(now) => Json(now).into_response(),
        None => Json(sonic_rs::json!({ "message": "No track is currently playing." }))
            .into_response(),
    };

    Ok(response)
}

/// Names of the user's playlists.
#[axum::debug_handler]
pub async fn playlists(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;
    let names = player_service::playlists(&state.api, &token).await?;
    Ok(Json(names).into_response())
}

/// The user's available devices, 404 when there are none.
#[axum::debug_handler]
pub async fn get_devices(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;
    let devices = player_service::devices(&state.api, &token).await?;
    Ok(Json(devices).into_response())
}

/// The device playback is routed to, or a message when there is none.
#[axum::debug_handler]
pub async fn get_current_playing_device(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;

    let response = match player_service::active_device(&state.api, &token).await? {
        Some(device) => Json(device).into_response(),
        None => Json(sonic_rs::json!({ "message": "No active device found." })).into_response(),
    };

    Ok(response)
}

/// The user's subscription product.
#[axum::debug_handler]
pub async fn user_profile(
    State(state): State<AppState>,
    mut ctx: SessionContext,
) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;
    let subscription = player_service::user_profile(&state.api, &token).await?;
    Ok(Json(subscription).into_response())
}
