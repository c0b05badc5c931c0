//! Gatehouse library crate: the session and authorization gateway of a
//! code-review service client.
//!
//! The library manages the access/refresh token lifecycle, transparently
//! recovers from authorization failures on in-flight requests, gates
//! navigation behind authentication and subscription state, and
//! coordinates deduplicated background polling for pending server-side
//! work.

pub mod api;
pub mod config;
pub mod nav;
pub mod polling;
pub mod session;
pub mod telemetry;

pub use api::{
    ApiError, ApiRequest, AuthApi, HttpApiClient, HttpRefreshTransport, RequestGateway,
    ReviewListingApi, SubscriptionApi, build_http_client, parse_base_url,
};
pub use config::GatehouseConfig;
pub use nav::{
    DecliningPlanPrompt, NavigationGate, PlanSelectionContext, PlanSelectionOutcome,
    PlanSelectionPrompt, RouteDecision, RoutePath,
};
pub use polling::{PENDING_REVIEWS_KEY, PollingCoordinator, ReviewActivity};
pub use session::{
    AccessToken, AuthSession, FileSessionStorage, OAuthCallbackParams, RefreshToken,
    RefreshTransport, Session, SessionStorage, SessionStore, TokenRefresher,
};
pub use telemetry::{
    NoopTelemetrySink, SessionClearReason, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink,
};
