// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! User model and the subscription sub-document.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Access tier, ordered `Bronze < Silver < Gold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl PlanTier {
    /// Numeric access level used for gating comparisons.
    pub const fn level(self) -> u8 {
        match self {
            PlanTier::Bronze => 0,
            PlanTier::Silver => 1,
            PlanTier::Gold => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlanTier::Bronze => "bronze",
            PlanTier::Silver => "silver",
            PlanTier::Gold => "gold",
        }
    }

    /// Parse a lowercase tier name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bronze" => Some(PlanTier::Bronze),
            "silver" => Some(PlanTier::Silver),
            "gold" => Some(PlanTier::Gold),
            _ => None,
        }
    }

    /// Tiers that can be bought through checkout.
    pub fn is_purchasable(self) -> bool {
        self != PlanTier::Bronze
    }

    /// Whether a holder of this tier may watch content requiring `required`.
    pub fn grants(self, required: PlanTier) -> bool {
        self.level() >= required.level()
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing status mirrored from the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Inactive,
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    Unpaid,
}

impl SubscriptionStatus {
    /// Map a Stripe subscription status string. Unknown values become `Inactive`.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            "incomplete" | "incomplete_expired" => SubscriptionStatus::Incomplete,
            "unpaid" => SubscriptionStatus::Unpaid,
            _ => SubscriptionStatus::Inactive,
        }
    }

    pub fn is_entitled(self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

/// Subscription sub-document stored on each user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    /// End of the current billing period (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl Subscription {
    /// Tier the user can actually watch right now.
    pub fn effective_tier(&self) -> PlanTier {
        if self.status.is_entitled() {
            self.plan
        } else {
            PlanTier::Bronze
        }
    }

    /// Checkout finished: the user is now paying for `tier`.
    pub fn activate(
        &mut self,
        tier: PlanTier,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    ) {
        self.status = SubscriptionStatus::Active;
        self.plan = tier;
        if customer_id.is_some() {
            self.stripe_customer_id = customer_id;
        }
        if subscription_id.is_some() {
            self.stripe_subscription_id = subscription_id;
        }
    }

    /// Subscription removed at the provider: back to the free tier.
    pub fn downgrade_to_bronze(&mut self) {
        self.status = SubscriptionStatus::Inactive;
        self.plan = PlanTier::Bronze;
        self.stripe_subscription_id = None;
        self.current_period_end = None;
        self.cancel_at_period_end = false;
    }

    pub fn mark_past_due(&mut self) {
        self.status = SubscriptionStatus::PastDue;
    }
}

/// User document stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID, also used as document ID
    pub id: String,
    /// Lowercased, unique
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[serde(default)]
    pub subscription: Subscription,
    pub created_at: String,
    pub updated_at: String,
    /// SHA-256 hex of the outstanding password reset token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_hash: Option<String>,
    /// Unix seconds after which the reset token is rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token_expires_at: Option<i64>,
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
