//! Error mapping helpers for the request gateway.

use http::StatusCode;

use crate::api::error::ApiError;

/// Checks if a response status indicates an authorization failure the
/// gateway may recover from with a token refresh.
pub(super) fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
}

/// Maps a transport-level reqwest error.
pub(super) fn map_transport_error(operation: &str, error: &reqwest::Error) -> ApiError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        return ApiError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }
    if error.is_decode() {
        return ApiError::Decode {
            message: format!("{operation} response decode failed: {error}"),
        };
    }
    ApiError::Network {
        message: format!("{operation} failed: {error}"),
    }
}

/// Maps a non-success HTTP status to the error taxonomy.
pub(super) fn map_status_error(
    operation: &str,
    status: StatusCode,
    maybe_message: Option<String>,
) -> ApiError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());
    if is_auth_failure(status) {
        ApiError::Unauthorized {
            message: format!("{operation} failed: {message}"),
        }
    } else {
        ApiError::Api {
            status: status.as_u16(),
            message: format!("{operation} failed: {message}"),
        }
    }
}

/// Extracts the service's error message from a JSON body.
///
/// The service reports failures as `{"message": …}` or `{"error": …}`.
pub(super) fn extract_service_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use crate::api::error::ApiError;

    use super::{extract_service_message, map_status_error};

    #[test]
    fn service_message_is_preferred_over_error_field() {
        let body = r#"{"message":"quota exhausted","error":"ignored"}"#;
        assert_eq!(
            extract_service_message(body),
            Some("quota exhausted".to_owned())
        );
        assert_eq!(
            extract_service_message(r#"{"error":"bad request"}"#),
            Some("bad request".to_owned())
        );
        assert_eq!(extract_service_message("not json"), None);
    }

    #[test]
    fn unauthorized_maps_to_its_own_variant() {
        let unauthorized = map_status_error("list reviews", StatusCode::UNAUTHORIZED, None);
        assert!(matches!(unauthorized, ApiError::Unauthorized { .. }));

        let server_error =
            map_status_error("list reviews", StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(
            server_error,
            ApiError::Api {
                status: 500,
                message: "list reviews failed: unknown error".to_owned(),
            }
        );
    }
}
