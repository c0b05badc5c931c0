//! Cooperative plan-selection suspension point.
//!
//! When gating decides the account must pick a plan, navigation suspends
//! until the embedding UI collects a decision. The gate models that as an
//! awaited trait call: the future resolves when the interaction completes,
//! and abandoning the interaction resolves it as a decline.

use async_trait::async_trait;

use crate::api::models::PlanType;

/// Flags describing why plan selection is being requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSelectionContext {
    /// No subscription record exists yet for the account.
    pub is_first_login: bool,
    /// The previous subscription period has ended.
    pub is_expired: bool,
    /// The account already consumed the free tier.
    pub has_used_free_plan: bool,
}

/// Result of the plan-selection interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSelectionOutcome {
    /// The user selected a plan and the selection was accepted.
    Selected(PlanType),
    /// The user explicitly declined to pick a plan.
    Declined,
    /// The user abandoned the interaction without a decision. Treated as a
    /// decline by the gate.
    Abandoned,
}

/// Collaborator presenting the plan-selection interaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanSelectionPrompt: Send + Sync {
    /// Presents the interaction and resolves once the user decides or
    /// abandons it.
    async fn select_plan(&self, context: PlanSelectionContext) -> PlanSelectionOutcome;
}

/// Prompt for headless embedders: declines every plan-selection request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecliningPlanPrompt;

#[async_trait]
impl PlanSelectionPrompt for DecliningPlanPrompt {
    async fn select_plan(&self, _context: PlanSelectionContext) -> PlanSelectionOutcome {
        PlanSelectionOutcome::Declined
    }
}
