/// Authorization Header Parsing
///
/// Pulls bearer tokens and API keys out of `Authorization: <scheme> <credential>`.

use actix_web::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::CredentialError;

/// Substring identifying an API-key authorization value, e.g. `ApiKey f271c81f`
pub const API_KEY_MARKER: &str = "ApiKey";

/// Extract the credential from the first `Authorization` header.
///
/// The scheme text is not checked, so `Bearer abc` and `Token abc` both yield `abc`.
/// Tokens past the second are ignored.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, CredentialError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::HeaderMissing)?;

    credential_of(value)
}

/// Extract an API key from whichever `Authorization` header carries the API-key marker.
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, CredentialError> {
    let value = headers
        .get_all(AUTHORIZATION)
        .find(|value| {
            value
                .to_str()
                .map(|v| v.contains(API_KEY_MARKER))
                .unwrap_or(false)
        })
        .ok_or(CredentialError::HeaderMissing)?;

    credential_of(value)
}

fn credential_of(value: &HeaderValue) -> Result<String, CredentialError> {
    let value = value
        .to_str()
        .map_err(|_| CredentialError::HeaderMalformed)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(_scheme), Some(credential)) => Ok(credential.to_string()),
        _ => Err(CredentialError::HeaderMalformed),
    }
}
