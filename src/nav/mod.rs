//! Navigation gating over session and subscription state.
//!
//! [`NavigationGate::evaluate`] decides, per navigation attempt, whether a
//! route may render. The decision is a plain sequential async function:
//! session check, admin bypass, fresh subscription lookup (never cached
//! across attempts), and — when the account must pick a plan — a
//! cooperative suspension awaiting the plan-selection collaborator.

pub mod plan_selection;

pub use plan_selection::{
    DecliningPlanPrompt, PlanSelectionContext, PlanSelectionOutcome, PlanSelectionPrompt,
};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::gateway::SubscriptionApi;
use crate::api::models::PlanType;
use crate::session::store::SessionStore;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Default landing route for authenticated users.
pub const DEFAULT_LANDING_ROUTE: &str = "/dashboard";

/// Route to the login screen.
pub const LOGIN_ROUTE: &str = "/auth/login";

/// A navigation target inside the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath(String);

impl RoutePath {
    /// Wraps a route path string.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(path.to_owned())
    }

    /// Borrow the path value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Terminal outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The route may render.
    Allow,
    /// Navigation is denied; redirect to login, preserving the requested
    /// destination as the return target.
    RedirectToLogin {
        /// The originally requested destination.
        return_url: String,
        /// Machine-readable denial reason, when the service supplied one.
        reason: Option<String>,
    },
    /// Navigation is denied; redirect elsewhere inside the authenticated
    /// area (used by the admin gate).
    RedirectTo {
        /// Redirect target.
        route: String,
    },
}

/// Gate evaluating whether a navigation attempt may proceed.
pub struct NavigationGate {
    store: SessionStore,
    subscriptions: Arc<dyn SubscriptionApi>,
    prompt: Arc<dyn PlanSelectionPrompt>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl NavigationGate {
    /// Creates a gate over the session store and its collaborators.
    #[must_use]
    pub const fn new(
        store: SessionStore,
        subscriptions: Arc<dyn SubscriptionApi>,
        prompt: Arc<dyn PlanSelectionPrompt>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            store,
            subscriptions,
            prompt,
            telemetry,
        }
    }

    /// Evaluates a navigation attempt to a protected route.
    ///
    /// Subscription state is looked up fresh on every attempt; it can
    /// change server-side between requests. A failed lookup allows the
    /// route (fail-open): a transient backend error must not lock users
    /// out.
    pub async fn evaluate(&self, requested: &RoutePath) -> RouteDecision {
        if !self.store.is_authenticated() {
            debug!(route = requested.as_str(), "denying unauthenticated navigation");
            return RouteDecision::RedirectToLogin {
                return_url: requested.as_str().to_owned(),
                reason: None,
            };
        }

        // Admins bypass subscription checks entirely.
        if self.store.is_admin() {
            return RouteDecision::Allow;
        }

        let check = match self.subscriptions.check_login().await {
            Ok(check) => check,
            Err(error) => {
                warn!(%error, route = requested.as_str(), "subscription lookup failed; allowing (fail-open)");
                self.telemetry.record(TelemetryEvent::GateFailOpen {
                    route: requested.as_str().to_owned(),
                });
                return RouteDecision::Allow;
            }
        };

        if check.allowed {
            return RouteDecision::Allow;
        }

        if !check.needs_plan_selection {
            return RouteDecision::RedirectToLogin {
                return_url: requested.as_str().to_owned(),
                reason: check.reason,
            };
        }

        let context = self.plan_selection_context().await;
        match self.prompt.select_plan(context).await {
            PlanSelectionOutcome::Selected(plan) => {
                debug!(route = requested.as_str(), ?plan, "plan selected; resuming navigation");
                RouteDecision::Allow
            }
            PlanSelectionOutcome::Declined | PlanSelectionOutcome::Abandoned => {
                RouteDecision::RedirectToLogin {
                    return_url: requested.as_str().to_owned(),
                    reason: check.reason,
                }
            }
        }
    }

    /// Evaluates the admin-only route gate.
    ///
    /// This is a capability check, not a session check: it composes after
    /// [`Self::evaluate`] passes, and non-admins are sent to the default
    /// authenticated landing route rather than to login.
    #[must_use]
    pub fn evaluate_admin(&self, requested: &RoutePath) -> RouteDecision {
        if !self.store.is_authenticated() {
            return RouteDecision::RedirectToLogin {
                return_url: requested.as_str().to_owned(),
                reason: None,
            };
        }
        if !self.store.is_admin() {
            return RouteDecision::RedirectTo {
                route: DEFAULT_LANDING_ROUTE.to_owned(),
            };
        }
        RouteDecision::Allow
    }

    /// Gathers the flags handed to the plan-selection interaction. Each
    /// lookup fails soft to `false`: the flags refine the interaction, they
    /// do not gate it.
    async fn plan_selection_context(&self) -> PlanSelectionContext {
        let (is_first_login, is_expired, previous_plan) =
            match self.subscriptions.subscription_info().await {
                Ok(info) => {
                    let expired = info
                        .warnings
                        .is_some_and(|warnings| warnings.is_expired);
                    let plan = info.subscription.as_ref().map(|record| record.plan_type);
                    (info.subscription.is_none(), expired, plan)
                }
                Err(error) => {
                    debug!(%error, "subscription detail lookup failed; using defaults");
                    (false, false, None)
                }
            };

        let has_used_free_plan = match self.subscriptions.free_plan_usage().await {
            Ok(usage) => {
                usage.has_used_free_plan
                    || (previous_plan == Some(PlanType::Free) && is_expired)
            }
            Err(error) => {
                debug!(%error, "free-plan usage lookup failed; using defaults");
                previous_plan == Some(PlanType::Free) && is_expired
            }
        };

        PlanSelectionContext {
            is_first_login,
            is_expired,
            has_used_free_plan,
        }
    }
}
