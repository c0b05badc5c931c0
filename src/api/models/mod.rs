//! Data models shared between the API boundary and the session subsystem.
//!
//! These types deserialise directly from the review service's JSON payloads
//! (camelCase on the wire) and double as the domain representation used by
//! the gates and the polling coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Authorization role attached to a user account.
///
/// Role is the sole authorization discriminator; there are no finer-grained
/// permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular account, subject to subscription gating.
    #[default]
    User,
    /// Administrator, bypasses subscription gating.
    Admin,
}

/// Authenticated user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Account identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Authorization role.
    #[serde(default)]
    pub role: Role,
    /// Contact email, when the account exposes one.
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Processing state of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Queued or currently being analysed server-side.
    Pending,
    /// Analysis finished.
    Completed,
    /// Analysis failed.
    Failed,
    /// Status value this client does not recognise.
    #[serde(other)]
    Unknown,
}

/// A code review returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review identifier.
    pub id: String,
    /// Processing status.
    pub status: ReviewStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Pull request title, when available.
    #[serde(default)]
    pub title: Option<String>,
    /// Repository full name (owner/repo).
    #[serde(default)]
    pub repository: Option<String>,
    /// Pull request number the review belongs to.
    #[serde(default)]
    pub pr_number: Option<u64>,
}

/// Review listing response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    /// Reviews in the requested window.
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Total count reported by the service, when present.
    #[serde(default)]
    pub count: Option<u64>,
}

/// Successful login or OAuth-callback exchange payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Authenticated user.
    pub user: UserRecord,
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Token used to mint replacement access tokens.
    pub refresh_token: String,
}

/// Refresh-token exchange payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Replacement bearer token.
    pub access_token: String,
}

/// Result of the login gating check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCheck {
    /// Whether the account may proceed past the gate.
    pub allowed: bool,
    /// Whether the account must pick a plan before proceeding.
    #[serde(default)]
    pub needs_plan_selection: bool,
    /// Machine-readable denial reason, when denied.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    /// Free tier.
    Free,
    /// Paid professional tier.
    Pro,
    /// Paid enterprise tier.
    Enterprise,
}

/// Subscription record for the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    /// Subscription identifier.
    pub id: String,
    /// Active plan tier.
    pub plan_type: PlanType,
    /// Current billing period end, when reported.
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Expiry warnings attached to a subscription lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWarnings {
    /// The subscription period has already ended.
    #[serde(default)]
    pub is_expired: bool,
    /// The subscription period ends soon.
    #[serde(default)]
    pub is_expiring_soon: bool,
    /// Days remaining until expiry.
    #[serde(default)]
    pub days_until_expiry: Option<i64>,
}

/// Full subscription lookup response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    /// Subscription record; absent when the account never selected a plan.
    #[serde(default)]
    pub subscription: Option<SubscriptionRecord>,
    /// Expiry warnings, when the service computed any.
    #[serde(default)]
    pub warnings: Option<SubscriptionWarnings>,
    /// Whether the account must pick a plan.
    #[serde(default)]
    pub needs_plan_selection: Option<bool>,
}

/// Free-plan usage history for the authenticated account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreePlanUsage {
    /// The account previously consumed the free tier.
    #[serde(default)]
    pub has_used_free_plan: bool,
    /// The account previously held a paid plan.
    #[serde(default)]
    pub has_had_paid_plan: bool,
    /// The account may still select the free tier.
    #[serde(default)]
    pub can_use_free_plan: bool,
}
