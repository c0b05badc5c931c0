//! REST boundary for the review service.
//!
//! This module owns the error taxonomy, the wire/domain models, the
//! replayable request description, and the gateway that wraps every
//! outbound call with credential attachment and one-shot 401 recovery.

pub mod error;
pub mod gateway;
pub mod models;
pub mod request;

pub use error::ApiError;
pub use gateway::{
    AuthApi, HttpApiClient, HttpRefreshTransport, RequestGateway, ReviewListingApi,
    SubscriptionApi, build_http_client, parse_base_url,
};
pub use models::{
    FreePlanUsage, LoginCheck, LoginResponse, PlanType, RefreshResponse, Review, ReviewListing,
    ReviewStatus, Role, SubscriptionInfo, SubscriptionRecord, SubscriptionWarnings, UserRecord,
};
pub use request::ApiRequest;
