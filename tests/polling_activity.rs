//! End-to-end polling behaviour against a wiremock review service.

#![expect(clippy::expect_used, reason = "tests panic on failure")]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gatehouse::api::models::Role;
use gatehouse::api::models::test_support::user_with_role;
use gatehouse::session::{InMemorySessionStorage, StorageEntry};
use gatehouse::{
    HttpApiClient, HttpRefreshTransport, NoopTelemetrySink, PENDING_REVIEWS_KEY,
    PollingCoordinator, RequestGateway, ReviewListingApi, SessionStore, TokenRefresher,
    build_http_client, parse_base_url,
};
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACCESS: &str = "integration-access-token";

fn authenticated_storage() -> Arc<InMemorySessionStorage> {
    let user = serde_json::to_string(&user_with_role("octocat", Role::User))
        .expect("user should serialise");
    Arc::new(InMemorySessionStorage::seeded(&[
        (StorageEntry::AccessToken, ACCESS),
        (StorageEntry::RefreshToken, "integration-refresh-token"),
        (StorageEntry::User, user.as_str()),
    ]))
}

fn reviews_api(server: &MockServer) -> Arc<dyn ReviewListingApi> {
    let store = SessionStore::hydrate(authenticated_storage(), Arc::new(NoopTelemetrySink))
        .expect("hydrate should succeed");
    let base_url = parse_base_url(&server.uri()).expect("mock URI should parse");
    let client = build_http_client().expect("client should build");
    let transport = HttpRefreshTransport::new(client.clone(), base_url.clone());
    let refresher = Arc::new(TokenRefresher::new(
        store.clone(),
        Arc::new(transport),
        Arc::new(NoopTelemetrySink),
    ));
    let gateway = RequestGateway::new(client, base_url, store, refresher);
    Arc::new(HttpApiClient::new(gateway))
}

#[rstest]
#[tokio::test]
async fn ticks_split_pending_reviews_on_the_recency_window() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [
                {
                    "id": "review-fresh",
                    "status": "pending",
                    "createdAt": (now - chrono::Duration::minutes(4)).to_rfc3339(),
                },
                {
                    "id": "review-stale",
                    "status": "pending",
                    "createdAt": (now - chrono::Duration::minutes(6)).to_rfc3339(),
                },
                {
                    "id": "review-done",
                    "status": "completed",
                    "createdAt": now.to_rfc3339(),
                },
            ],
            "count": 3,
        })))
        .mount(&server)
        .await;

    let coordinator = PollingCoordinator::with_cadence(
        reviews_api(&server),
        Arc::new(NoopTelemetrySink),
        // Long cadence so only the immediate first tick is observed.
        Duration::from_secs(600),
        50,
    );
    let mut activity = coordinator.subscribe();

    coordinator.start(PENDING_REVIEWS_KEY);
    activity.changed().await.expect("activity should publish");

    let snapshot = activity.borrow_and_update().clone();
    assert_eq!(snapshot.pending.len(), 2);
    assert!(snapshot.actively_processing.contains("review-fresh"));
    assert!(!snapshot.actively_processing.contains("review-stale"));
    assert!(
        snapshot
            .pending
            .iter()
            .all(|review| review.id != "review-done")
    );

    coordinator.stop_all();
    assert_eq!(coordinator.active_count(), 0);
}

#[rstest]
#[tokio::test]
async fn refresh_now_lists_once_and_republishes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reviews": [
                {
                    "id": "review-fresh",
                    "status": "pending",
                    "createdAt": Utc::now().to_rfc3339(),
                },
            ],
            "count": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = PollingCoordinator::with_cadence(
        reviews_api(&server),
        Arc::new(NoopTelemetrySink),
        Duration::from_secs(600),
        50,
    );
    let mut activity = coordinator.subscribe();

    let listing = coordinator
        .refresh_now()
        .await
        .expect("refresh should succeed");

    assert_eq!(listing.reviews.len(), 1);
    assert!(activity.has_changed().expect("channel should be open"));
    let snapshot = activity.borrow_and_update().clone();
    assert!(snapshot.actively_processing.contains("review-fresh"));
}
