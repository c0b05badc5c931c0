//! Replayable description of a single API call.
//!
//! The gateway's one-shot retry after a token refresh needs to issue the
//! same logical call twice. Describing the call as data (method, path,
//! query, JSON body) makes the replay an explicit second send rather than a
//! recursive error-handler chain.

use http::Method;
use serde::Serialize;

use super::error::ApiError;

/// A single outbound API call, cloneable for one-shot replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Describes a GET request for the given service path.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_owned(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Describes a POST request for the given service path.
    #[must_use]
    pub fn post(path: &str) -> Self {
        Self {
            method: Method::POST,
            path: path.to_owned(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: &str, value: &impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body cannot be serialised.
    pub fn with_json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|error| ApiError::Decode {
            message: format!("request body serialisation failed: {error}"),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// HTTP method of the call.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Service path of the call (e.g. `/api/auth/me`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in append order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body, when one is attached.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}
