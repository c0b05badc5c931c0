//! Request gateway and typed endpoint clients for the review service.
//!
//! Every outbound call flows through [`RequestGateway`]: it attaches bearer
//! credentials when the stored token passes the validity predicate, detects
//! authorization failures, triggers the single-flight token refresher, and
//! replays the original call exactly once. The endpoint traits put a
//! mockable seam between the REST boundary and the gates that consume it.

mod client;
mod endpoints;
mod error_mapping;

pub use client::{build_http_client, parse_base_url};
pub use endpoints::{HttpApiClient, HttpRefreshTransport};

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::models::{
    FreePlanUsage, LoginCheck, LoginResponse, ReviewListing, SubscriptionInfo, UserRecord,
};
use crate::api::request::ApiRequest;
use crate::session::refresher::TokenRefresher;
use crate::session::store::SessionStore;
use crate::session::token::AccessToken;
use crate::telemetry::SessionClearReason;

use client::join_path;
use error_mapping::{extract_service_message, is_auth_failure, map_status_error, map_transport_error};

/// Authentication endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Logs in with username and password.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Fetches the authenticated user for the stored credentials.
    async fn current_user(&self) -> Result<UserRecord, ApiError>;

    /// Exchanges an OAuth one-time code for a session.
    async fn exchange_oauth_code(&self, code: &str) -> Result<LoginResponse, ApiError>;
}

/// Subscription gating endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Checks whether the account may proceed past the login gate.
    async fn check_login(&self) -> Result<LoginCheck, ApiError>;

    /// Fetches the account's subscription record and warnings.
    async fn subscription_info(&self) -> Result<SubscriptionInfo, ApiError>;

    /// Fetches the account's free-plan usage history.
    async fn free_plan_usage(&self) -> Result<FreePlanUsage, ApiError>;
}

/// Review listing endpoint used by the polling coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewListingApi: Send + Sync {
    /// Lists the most recent reviews, newest first, bounded by `limit`.
    async fn list_reviews(&self, limit: u32) -> Result<ReviewListing, ApiError>;
}

/// Gateway wrapping every outbound API call with credential attachment and
/// one-shot refresh-and-replay recovery.
#[derive(Clone)]
pub struct RequestGateway {
    client: reqwest::Client,
    base_url: url::Url,
    store: SessionStore,
    refresher: Arc<TokenRefresher>,
}

impl RequestGateway {
    /// Creates a gateway over the given client and session collaborators.
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        base_url: url::Url,
        store: SessionStore,
        refresher: Arc<TokenRefresher>,
    ) -> Self {
        Self {
            client,
            base_url,
            store,
            refresher,
        }
    }

    /// Issues the request and deserialises a successful JSON response.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError::Unauthorized`] when a 401 could not be
    /// recovered, and the mapped taxonomy error for every other failure.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: &ApiRequest,
    ) -> Result<T, ApiError> {
        let response = self.send(operation, request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(
                operation,
                status,
                extract_service_message(&body),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|error| map_transport_error(operation, &error))
    }

    /// Issues the request, applying the one-shot refresh-and-replay policy,
    /// and returns the raw response.
    ///
    /// A 401 triggers recovery only when a credential had been attached;
    /// unauthenticated calls are returned as-is so they can never loop. The
    /// replayed request is issued exactly once and its response is returned
    /// regardless of outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] for transport failures and
    /// [`ApiError::Unauthorized`] when refresh-based recovery failed.
    pub async fn send(
        &self,
        operation: &str,
        request: &ApiRequest,
    ) -> Result<reqwest::Response, ApiError> {
        let token = self.store.access_token();
        let attached_credential = token.is_some();
        let response = self.issue(operation, request, token.as_ref()).await?;

        if !is_auth_failure(response.status()) || !attached_credential {
            return Ok(response);
        }

        match self.refresher.refresh().await {
            Ok(new_token) => {
                debug!(operation, "replaying request after token refresh");
                self.issue(operation, request, Some(&new_token)).await
            }
            Err(refresh_error) => {
                if refresh_error == ApiError::MissingRefreshToken
                    && let Err(clear_error) =
                        self.store.clear(SessionClearReason::MissingRefreshToken)
                {
                    warn!(%clear_error, "failed to clear session without refresh token");
                }
                let body = response.text().await.unwrap_or_default();
                Err(map_status_error(
                    operation,
                    http::StatusCode::UNAUTHORIZED,
                    extract_service_message(&body),
                ))
            }
        }
    }

    async fn issue(
        &self,
        operation: &str,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = join_path(&self.base_url, request.path())?;
        let mut builder = self.client.request(request.method().clone(), url);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        builder
            .send()
            .await
            .map_err(|error| map_transport_error(operation, &error))
    }
}

#[cfg(test)]
mod tests;
