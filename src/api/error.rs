//! Error types exposed by the API boundary.

use thiserror::Error;

/// Errors surfaced while talking to the review service or managing the
/// local session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The configuration did not include an API base URL.
    #[error("API base URL is required")]
    MissingApiBaseUrl,

    /// Neither a stored session nor login credentials were available.
    #[error("login credentials are required")]
    MissingCredentials,

    /// A URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The service rejected the request with 401 and recovery failed or was
    /// not applicable.
    #[error("request was not authorized: {message}")]
    Unauthorized {
        /// Service error message returned with the 401 response.
        message: String,
    },

    /// No refresh token is stored, so the session cannot be recovered.
    #[error("refresh token is missing")]
    MissingRefreshToken,

    /// The service returned a non-authorization API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body detail describing the failure.
        message: String,
    },

    /// Networking failed while calling the service.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A response body could not be deserialised.
    #[error("response decode failed: {message}")]
    Decode {
        /// Deserialisation error detail.
        message: String,
    },

    /// Durable session storage failed.
    #[error("session storage error: {message}")]
    Storage {
        /// Error detail from the storage backend.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}
