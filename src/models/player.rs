//! Upstream resource schemas and the reduced shapes this service returns.
//!
//! Every key whose absence means "nothing active" is an `Option`, so a
//! missing key decodes to `None` while a wrong-typed payload fails to decode.

use serde::{Deserialize, Serialize};

// ---- upstream: me/player/currently-playing ----

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

// ---- upstream: me/playlists ----

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Option<Vec<Playlist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub name: String,
}

// ---- upstream: me/player/devices and me/player ----

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Option<Vec<Device>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub device: Option<Device>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    /// Restricted devices report a null id.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

// ---- upstream: me ----

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub product: Option<String>,
}

// ---- responses ----

/// `/currentlyPlaying` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NowPlaying {
    pub track_name: String,
    pub artist_name: Option<String>,
    pub track_url: Option<String>,
    pub playing: bool,
}

impl From<(Track, bool)> for NowPlaying {
    fn from((track, playing): (Track, bool)) -> Self {
        Self {
            artist_name: track.artists.into_iter().next().map(|a| a.name),
            track_url: track.external_urls.spotify,
            track_name: track.name,
            playing,
        }
    }
}

/// One entry of the `/get_devices` array.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeviceSummary {
    pub device_name: String,
    pub device_id: Option<String>,
    pub device_active: bool,
}

impl From<Device> for DeviceSummary {
    fn from(device: Device) -> Self {
        Self {
            device_name: device.name,
            device_id: device.id,
            device_active: device.is_active,
        }
    }
}

/// `/get_current_playing_device` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveDevice {
    pub device_name: String,
    pub device_id: Option<String>,
}

impl From<Device> for ActiveDevice {
    fn from(device: Device) -> Self {
        Self {
            device_name: device.name,
            device_id: device.id,
        }
    }
}

/// `/user_profile` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Subscription {
    pub product: String,
}
