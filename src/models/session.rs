use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AuthError, models::token::TokenInfo};

/// Token material for one authenticated browser session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    /// Bearer credential for resource calls.
    pub access_token: String,
    /// Credential used to mint a new access token.
    pub refresh_token: String,
    /// Absolute instant after which `access_token` must not be used.
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Whether the access token can no longer be used at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Represents a browser session.
///
/// A session without `credentials` is unauthenticated. The dashboard fields
/// hold whatever the last `/sdk` render observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// The current token material, if the user has logged in.
    pub credentials: Option<Credentials>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub device_name: Option<String>,
    pub device_id: Option<String>,
}

impl Session {
    /// Returns `true` once a token exchange has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Stores a token response received at `received_at`.
    ///
    /// `expires_in` is turned into an absolute instant here. When the response
    /// carries no refresh token the previously stored one is kept.
    ///
    /// # Errors
    ///
    /// [`AuthError::Malformed`], leaving the session untouched, when no refresh
    /// token is available or `expires_in` is negative or out of range.
    pub fn apply_token(
        &mut self,
        info: TokenInfo,
        received_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let expires_at = expiry_from(received_at, info.expires_in)?;

        let refresh_token = match (info.refresh_token, &self.credentials) {
            (Some(token), _) => token,
            (None, Some(previous)) => previous.refresh_token.clone(),
            (None, None) => {
                return Err(AuthError::Malformed("missing field `refresh_token`".to_string()));
            }
        };

        self.credentials = Some(Credentials {
            access_token: info.access_token,
            refresh_token,
            expires_at,
        });

        Ok(())
    }
}

fn expiry_from(received_at: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, AuthError> {
    if expires_in < 0 {
        return Err(AuthError::Malformed(format!("negative expires_in: {expires_in}")));
    }

    Duration::try_seconds(expires_in)
        .and_then(|lifetime| received_at.checked_add_signed(lifetime))
        .ok_or_else(|| AuthError::Malformed(format!("expires_in out of range: {expires_in}")))
}
