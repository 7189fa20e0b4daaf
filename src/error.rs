use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures talking to the provider token endpoint.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The token endpoint could not be reached.
    #[error("Token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("Token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered 2xx with an unusable body.
    #[error("Malformed token response: {0}")]
    Malformed(String),
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No usable token in the session. Resolved by sending the browser to `/login`.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The provider answered a resource call with a non-2xx status.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The provider answered 2xx with a body that does not decode.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// A resource-specific "nothing there" outcome.
    #[error("{0}")]
    NotFound(String),

    /// The provider could not be reached for a resource call.
    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The authorization-code exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The inbound request was unusable.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Builds a `302 Found` pointing at `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// JSON error body shared by every error response.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl<'a> ErrorBody<'a> {
    fn new(error: &'a str) -> Self {
        Self {
            error,
            status: None,
            message: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let auth_message;
        let (status, body) = match &self {
            AppError::Unauthenticated => {
                tracing::debug!("🔒 No usable token, redirecting to /login");
                return found("/login");
            }

            AppError::Upstream { status, body } => {
                tracing::warn!("Upstream returned {}: {}", status, body);
                let code = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                (
                    code,
                    ErrorBody {
                        error: "Upstream request failed",
                        status: Some(*status),
                        message: Some(body.as_str()),
                    },
                )
            }

            AppError::MalformedUpstreamResponse(msg) => {
                tracing::error!("Malformed upstream response: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Failed to parse upstream response"),
                )
            }

            AppError::NotFound(msg) => {
                tracing::debug!("Resource not found: {}", msg);
                (StatusCode::NOT_FOUND, ErrorBody::new(msg))
            }

            AppError::Transport(e) => {
                tracing::error!("Upstream transport error: {}", e);
                (StatusCode::BAD_GATEWAY, ErrorBody::new("Upstream service unavailable"))
            }

            AppError::Auth(e) => {
                tracing::warn!("Authentication failed: {}", e);
                auth_message = e.to_string();
                (StatusCode::BAD_GATEWAY, ErrorBody::new(&auth_message))
            }

            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorBody::new(msg))
            }

            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Session store error"))
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Internal server error"))
            }
        };

        let body = sonic_rs::to_string(&body)
            .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
