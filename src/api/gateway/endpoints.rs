//! Reqwest-backed implementations of the endpoint traits.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::api::error::ApiError;
use crate::api::models::{
    FreePlanUsage, LoginCheck, LoginResponse, RefreshResponse, ReviewListing, SubscriptionInfo,
    UserRecord,
};
use crate::api::request::ApiRequest;
use crate::session::refresher::RefreshTransport;
use crate::session::token::{AccessToken, RefreshToken};

use super::RequestGateway;
use super::client::join_path;
use super::error_mapping::{extract_service_message, map_status_error, map_transport_error};
use super::{AuthApi, ReviewListingApi, SubscriptionApi};

/// Typed client implementing every endpoint trait over the gateway.
#[derive(Clone)]
pub struct HttpApiClient {
    gateway: RequestGateway,
}

impl HttpApiClient {
    /// Creates the client over an assembled gateway.
    #[must_use]
    pub const fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post("/auth/login")
            .with_json(&json!({ "username": username, "password": password }))?;
        self.gateway.execute_json("login", &request).await
    }

    async fn current_user(&self) -> Result<UserRecord, ApiError> {
        let request = ApiRequest::get("/auth/me");
        self.gateway.execute_json("current user", &request).await
    }

    async fn exchange_oauth_code(&self, code: &str) -> Result<LoginResponse, ApiError> {
        let request =
            ApiRequest::post("/auth/github/callback").with_json(&json!({ "code": code }))?;
        self.gateway
            .execute_json("OAuth code exchange", &request)
            .await
    }
}

#[async_trait]
impl SubscriptionApi for HttpApiClient {
    async fn check_login(&self) -> Result<LoginCheck, ApiError> {
        let request = ApiRequest::get("/subscription/check-login");
        self.gateway
            .execute_json("login gating check", &request)
            .await
    }

    async fn subscription_info(&self) -> Result<SubscriptionInfo, ApiError> {
        let request = ApiRequest::get("/subscription");
        self.gateway
            .execute_json("subscription lookup", &request)
            .await
    }

    async fn free_plan_usage(&self) -> Result<FreePlanUsage, ApiError> {
        let request = ApiRequest::get("/subscription/check-free-plan");
        self.gateway
            .execute_json("free-plan usage check", &request)
            .await
    }
}

#[async_trait]
impl ReviewListingApi for HttpApiClient {
    async fn list_reviews(&self, limit: u32) -> Result<ReviewListing, ApiError> {
        let request = ApiRequest::get("/reviews").with_query("limit", &limit);
        self.gateway.execute_json("list reviews", &request).await
    }
}

/// Bare refresh-token exchange transport.
///
/// Deliberately bypasses [`RequestGateway`]: the exchange is the recovery
/// path for gateway 401s and must not re-enter the retry policy. The call
/// is sent without a bearer credential.
#[derive(Clone)]
pub struct HttpRefreshTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRefreshTransport {
    /// Creates the transport over the shared HTTP client.
    #[must_use]
    pub const fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<AccessToken, ApiError> {
        const OPERATION: &str = "token refresh";

        let url = join_path(&self.base_url, "/auth/refresh")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "refreshToken": refresh_token.as_str() }))
            .send()
            .await
            .map_err(|error| map_transport_error(OPERATION, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(
                OPERATION,
                status,
                extract_service_message(&body),
            ));
        }

        let payload: RefreshResponse = response
            .json()
            .await
            .map_err(|error| map_transport_error(OPERATION, &error))?;
        AccessToken::new(&payload.access_token).ok_or_else(|| ApiError::Decode {
            message: "service returned a token failing the validity predicate".to_owned(),
        })
    }
}
