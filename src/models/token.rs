use serde::Deserialize;

/// Body returned by the provider token endpoint, for both the
/// authorization-code exchange and refreshes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenInfo {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Absent on refresh responses when the provider keeps the old one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to receipt.
    pub expires_in: i64,
}
