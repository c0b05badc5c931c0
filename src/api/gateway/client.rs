//! HTTP client construction helpers for the request gateway.

use std::time::Duration;

use url::Url;

use crate::api::error::ApiError;

/// Default per-request timeout applied to every API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the shared reqwest client used by the gateway and the refresh
/// transport.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when the client cannot be
/// constructed (e.g. TLS backend initialisation failure).
pub fn build_http_client() -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| ApiError::Configuration {
            message: format!("HTTP client construction failed: {error}"),
        })
}

/// Parses and normalises the API base URL.
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when the value does not parse as an
/// absolute URL.
pub fn parse_base_url(value: &str) -> Result<Url, ApiError> {
    let trimmed = value.trim_end_matches('/');
    Url::parse(trimmed).map_err(|error| ApiError::InvalidUrl(error.to_string()))
}

/// Joins a service path onto the base URL.
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when the path cannot be joined.
pub(super) fn join_path(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    let joined = format!("{}{path}", base_url.as_str().trim_end_matches('/'));
    Url::parse(&joined).map_err(|error| ApiError::InvalidUrl(error.to_string()))
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests panic on failure")]
mod tests {
    use super::parse_base_url;

    #[test]
    fn trailing_slash_is_normalised() {
        let url = parse_base_url("https://api.example.com/").expect("URL should parse");
        assert_eq!(url.as_str(), "https://api.example.com/");

        let joined = super::join_path(&url, "/api/auth/me").expect("join should succeed");
        assert_eq!(joined.as_str(), "https://api.example.com/api/auth/me");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(parse_base_url("not a url").is_err());
    }
}
