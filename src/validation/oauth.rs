use crate::error::{AppError, Result};

/// Upper bound on an authorization code we are willing to forward.
const MAX_CODE_LEN: usize = 2048;

/// Validates an authorization code received on the callback.
///
/// # Arguments
///
/// * `code` - The `code` query parameter.
///
/// # Returns
///
/// A `Result<()>` indicating whether the code can be sent to the token endpoint.
pub fn validate_authorization_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(AppError::BadRequest(
            "Missing authorization code".to_string(),
        ));
    }

    if code.len() > MAX_CODE_LEN {
        return Err(AppError::BadRequest(
            "Authorization code is too long".to_string(),
        ));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
    {
        return Err(AppError::BadRequest(
            "Authorization code contains invalid characters".to_string(),
        ));
    }

    Ok(())
}
