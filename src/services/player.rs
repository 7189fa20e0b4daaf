use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, Result},
    models::player::{
        ActiveDevice, CurrentlyPlaying, DeviceList, DeviceSummary, NowPlaying, PlaybackState,
        PlaylistPage, Subscription, UserProfile,
    },
};

const CURRENTLY_PLAYING: &str = "me/player/currently-playing";
const PLAYLISTS: &str = "me/playlists";
const DEVICES: &str = "me/player/devices";
const PLAYBACK_STATE: &str = "me/player";
const PROFILE: &str = "me";

/// A decoded upstream answer.
#[derive(Debug)]
pub enum Upstream<T> {
    /// `204 No Content`: the provider has nothing active to report.
    NoContent,
    Body(T),
}

/// Read-only client for the provider REST API.
#[derive(Clone)]
pub struct SpotifyApi {
    http: reqwest::Client,
    base_url: String,
}

impl SpotifyApi {
    /// Creates a new `SpotifyApi` rooted at `base_url`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource)
    }

    /// Issues one bearer-authenticated GET and decodes the body.
    ///
    /// # Arguments
    ///
    /// * `resource` - Path relative to the API root.
    /// * `access_token` - A token obtained from `ensure_valid_token`.
    ///
    /// # Returns
    ///
    /// `Upstream::NoContent` on 204, the decoded body on any other 2xx,
    /// `AppError::Upstream` on non-2xx and
    /// `AppError::MalformedUpstreamResponse` if the body does not decode.
    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        access_token: &str,
    ) -> Result<Upstream<T>> {
        let response = self
            .http
            .get(self.url(resource))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 GET {} -> {}", resource, status);

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Upstream::NoContent);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        sonic_rs::from_slice::<T>(&bytes)
            .map(Upstream::Body)
            .map_err(|e| AppError::MalformedUpstreamResponse(format!("{}: {}", resource, e)))
    }
}

/// The track currently playing, `None` when nothing is.
pub async fn currently_playing(api: &SpotifyApi, access_token: &str) -> Result<Option<NowPlaying>> {
    match api.get::<CurrentlyPlaying>(CURRENTLY_PLAYING, access_token).await? {
        Upstream::NoContent => Ok(None),
        Upstream::Body(state) => Ok(state
            .item
            .map(|track| NowPlaying::from((track, state.is_playing)))),
    }
}

/// Names of the user's playlists (first page).
pub async fn playlists(api: &SpotifyApi, access_token: &str) -> Result<Vec<String>> {
    match api.get::<PlaylistPage>(PLAYLISTS, access_token).await? {
        Upstream::NoContent => Ok(Vec::new()),
        Upstream::Body(page) => Ok(page
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|playlist| playlist.name)
            .collect()),
    }
}

/// Every device the provider knows about.
///
/// An empty or missing device list is `AppError::NotFound`.
pub async fn devices(api: &SpotifyApi, access_token: &str) -> Result<Vec<DeviceSummary>> {
    let devices = match api.get::<DeviceList>(DEVICES, access_token).await? {
        Upstream::NoContent => None,
        Upstream::Body(list) => list.devices,
    }
    .unwrap_or_default();

    if devices.is_empty() {
        return Err(AppError::NotFound("No devices found".to_string()));
    }

    Ok(devices.into_iter().map(DeviceSummary::from).collect())
}

/// The device playback is currently routed to, `None` when there is none.
pub async fn active_device(api: &SpotifyApi, access_token: &str) -> Result<Option<ActiveDevice>> {
    match api.get::<PlaybackState>(PLAYBACK_STATE, access_token).await? {
        Upstream::NoContent => Ok(None),
        Upstream::Body(state) => Ok(state.device.map(ActiveDevice::from)),
    }
}

/// The user's subscription tier.
pub async fn user_profile(api: &SpotifyApi, access_token: &str) -> Result<Subscription> {
    let product = match api.get::<UserProfile>(PROFILE, access_token).await? {
        Upstream::NoContent => None,
        Upstream::Body(profile) => profile.product,
    };

    product
        .map(|product| Subscription { product })
        .ok_or_else(|| AppError::NotFound("No subscription product found".to_string()))
}
