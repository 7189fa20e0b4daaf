use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::{
    error::Result,
    middleware_layer::session::SessionContext,
    services::player as player_service,
    state::AppState,
};

/// Escapes text for inclusion in HTML element content or a quoted attribute.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn field(value: Option<&str>) -> String {
    escape_html(value.unwrap_or("-"))
}

/// Renders the dashboard: access token plus the current track and device.
///
/// Both lookups are best effort. A failed lookup is logged and clears the
/// matching fields instead of failing the page.
#[axum::debug_handler]
pub async fn sdk(State(state): State<AppState>, mut ctx: SessionContext) -> Result<Response> {
    let token = ctx.bearer_token(&state).await?;

    match player_service::currently_playing(&state.api, &token).await {
        Ok(now) => {
            ctx.session.track_name = now.as_ref().map(|n| n.track_name.clone());
            ctx.session.artist_name = now.and_then(|n| n.artist_name);
        }
        Err(e) => {
            tracing::warn!("⚠️ Dashboard: currently-playing lookup failed: {}", e);
            ctx.session.track_name = None;
            ctx.session.artist_name = None;
        }
    }

    match player_service::active_device(&state.api, &token).await {
        Ok(device) => {
            ctx.session.device_name = device.as_ref().map(|d| d.device_name.clone());
            ctx.session.device_id = device.and_then(|d| d.device_id);
        }
        Err(e) => {
            tracing::warn!("⚠️ Dashboard: active-device lookup failed: {}", e);
            ctx.session.device_name = None;
            ctx.session.device_id = None;
        }
    }

    ctx.commit(&state).await?;

    let session = &ctx.session;
    let page = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Now playing</title>
</head>
<body data-access-token="{token}">
  <h1>Now playing</h1>
  <p>Track: <span id="track-name">{track}</span></p>
  <p>Artist: <span id="artist-name">{artist}</span></p>
  <p>Device: <span id="device-name">{device}</span> (<span id="device-id">{device_id}</span>)</p>
  <p><a href="/refresh_token">Refresh token</a> | <a href="/logout">Log out</a></p>
</body>
</html>
"#,
        token = escape_html(&token),
        track = field(session.track_name.as_deref()),
        artist = field(session.artist_name.as_deref()),
        device = field(session.device_name.as_deref()),
        device_id = field(session.device_id.as_deref()),
    );

    Ok(Html(page).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tyler, The Creator" & 'co'</b>"#),
            "&lt;b&gt;&quot;Tyler, The Creator&quot; &amp; &#x27;co&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn missing_field_renders_placeholder() {
        assert_eq!(field(None), "-");
        assert_eq!(field(Some("SZA")), "SZA");
    }
}
