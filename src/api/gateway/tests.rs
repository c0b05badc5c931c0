//! Tests for the request gateway's credential and recovery policy.

#![expect(clippy::expect_used, reason = "tests panic on failure")]

use std::sync::Arc;

use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::error::ApiError;
use crate::api::models::test_support::user_with_role;
use crate::api::models::{ReviewListing, Role};
use crate::api::request::ApiRequest;
use crate::session::refresher::TokenRefresher;
use crate::session::storage::{InMemorySessionStorage, StorageEntry};
use crate::session::store::SessionStore;
use crate::telemetry::NoopTelemetrySink;

use super::{HttpRefreshTransport, RequestGateway, build_http_client, parse_base_url};

const STORED_ACCESS: &str = "stored-access-token";
const STORED_REFRESH: &str = "stored-refresh-token";
const REFRESHED_ACCESS: &str = "refreshed-access-token";

struct GatewayFixture {
    server: MockServer,
    store: SessionStore,
    gateway: RequestGateway,
}

async fn fixture(authenticated: bool) -> GatewayFixture {
    let server = MockServer::start().await;

    let storage = if authenticated {
        let user = user_with_role("octocat", Role::User);
        let user_json = serde_json::to_string(&user).expect("user should serialise");
        Arc::new(InMemorySessionStorage::seeded(&[
            (StorageEntry::AccessToken, STORED_ACCESS),
            (StorageEntry::RefreshToken, STORED_REFRESH),
            (StorageEntry::User, user_json.as_str()),
        ]))
    } else {
        Arc::new(InMemorySessionStorage::new())
    };
    let store = SessionStore::hydrate(storage, Arc::new(NoopTelemetrySink))
        .expect("hydrate should succeed");

    let client = build_http_client().expect("client should build");
    let base_url = parse_base_url(&server.uri()).expect("server URI should parse");
    let transport = HttpRefreshTransport::new(client.clone(), base_url.clone());
    let refresher = Arc::new(TokenRefresher::new(
        store.clone(),
        Arc::new(transport),
        Arc::new(NoopTelemetrySink),
    ));
    let gateway = RequestGateway::new(client, base_url, store.clone(), refresher);

    GatewayFixture {
        server,
        store,
        gateway,
    }
}

fn empty_listing() -> serde_json::Value {
    serde_json::json!({ "reviews": [] })
}

fn mock_refresh_success() -> Mock {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(serde_json::json!({ "refreshToken": STORED_REFRESH })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "accessToken": REFRESHED_ACCESS })),
        )
}

#[tokio::test]
async fn attaches_bearer_credential_when_token_is_valid() {
    let fx = fixture(true).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(bearer_token(STORED_ACCESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let request = ApiRequest::get("/reviews").with_query("limit", &50_u32);
    let listing: ReviewListing = fx
        .gateway
        .execute_json("list reviews", &request)
        .await
        .expect("request should succeed");
    assert!(listing.reviews.is_empty());
}

#[tokio::test]
async fn sends_unauthenticated_when_no_token_is_stored() {
    let fx = fixture(false).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let request = ApiRequest::get("/reviews");
    let _listing: ReviewListing = fx
        .gateway
        .execute_json("list reviews", &request)
        .await
        .expect("request should succeed");

    let received = fx
        .server
        .received_requests()
        .await
        .expect("requests should be recorded");
    assert_eq!(received.len(), 1);
    let first = received.first().expect("one request should be recorded");
    assert!(!first.headers.contains_key("authorization"));
}

#[tokio::test]
async fn unauthenticated_401_is_surfaced_without_a_refresh() {
    let fx = fixture(false).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fx.server)
        .await;

    let request = ApiRequest::get("/reviews");
    let result: Result<ReviewListing, ApiError> =
        fx.gateway.execute_json("list reviews", &request).await;
    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[tokio::test]
async fn refreshes_and_replays_once_after_401() {
    let fx = fixture(true).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(bearer_token(STORED_ACCESS))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "error": "token expired" })),
        )
        .expect(1)
        .mount(&fx.server)
        .await;
    mock_refresh_success().expect(1).mount(&fx.server).await;
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(bearer_token(REFRESHED_ACCESS))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_listing()))
        .expect(1)
        .mount(&fx.server)
        .await;

    let request = ApiRequest::get("/reviews");
    let listing: ReviewListing = fx
        .gateway
        .execute_json("list reviews", &request)
        .await
        .expect("replayed request should succeed");
    assert!(listing.reviews.is_empty());
    assert_eq!(
        fx.store.access_token().map(|token| token.as_str().to_owned()),
        Some(REFRESHED_ACCESS.to_owned())
    );
}

#[tokio::test]
async fn a_401_after_replay_is_surfaced_not_retried_again() {
    let fx = fixture(true).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&fx.server)
        .await;
    mock_refresh_success().expect(1).mount(&fx.server).await;

    let request = ApiRequest::get("/reviews");
    let result: Result<ReviewListing, ApiError> =
        fx.gateway.execute_json("list reviews", &request).await;

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[tokio::test]
async fn refresh_failure_clears_the_session_and_propagates_the_original_401() {
    let fx = fixture(true).await;

    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "error": "token expired" })),
        )
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&fx.server)
        .await;

    let request = ApiRequest::get("/reviews");
    let result: Result<ReviewListing, ApiError> =
        fx.gateway.execute_json("list reviews", &request).await;

    match result {
        Err(ApiError::Unauthorized { message }) => {
            assert!(message.contains("token expired"), "message: {message}");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert!(!fx.store.is_authenticated());
    assert!(fx.store.refresh_token().is_none());
}
