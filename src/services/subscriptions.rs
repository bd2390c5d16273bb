// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Applies Stripe webhook events to the user's subscription sub-document.
//!
//! Events are applied as they arrive: no deduplication of redeliveries and no
//! ordering between concurrent deliveries for the same customer.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{PlanTier, SubscriptionStatus, User};
use crate::services::stripe::StripeClient;
use crate::services::webhook::{
    CheckoutSessionObject, InvoiceObject, StripeEvent, SubscriptionObject,
};
use crate::time_utils::now_rfc3339;

/// What a webhook event did to local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A user document was rewritten
    Updated { user_id: String },
    /// The event named a user or customer we do not know
    NoMatchingUser,
    /// Event type we do not handle
    Ignored,
}

/// Reconciles billing events into user records.
pub struct SubscriptionSync<'a> {
    db: &'a FirestoreDb,
    stripe: &'a StripeClient,
    config: &'a Config,
}

impl<'a> SubscriptionSync<'a> {
    pub fn new(db: &'a FirestoreDb, stripe: &'a StripeClient, config: &'a Config) -> Self {
        Self { db, stripe, config }
    }

    /// Dispatch on the event type.
    pub async fn handle_event(&self, event: &StripeEvent) -> Result<EventOutcome, AppError> {
        let object = event.data.object.clone();
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                self.checkout_completed(parse_object(object)?).await
            }
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.subscription_changed(parse_object(object)?).await
            }
            "customer.subscription.deleted" => {
                self.subscription_deleted(parse_object(object)?).await
            }
            "invoice.payment_failed" => self.payment_failed(parse_object(object)?).await,
            "invoice.payment_succeeded" => self.payment_succeeded(parse_object(object)?).await,
            other => {
                tracing::info!(event_type = %other, "Ignoring unhandled Stripe event");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    async fn checkout_completed(
        &self,
        session: CheckoutSessionObject,
    ) -> Result<EventOutcome, AppError> {
        let user_id = session
            .metadata
            .get("userId")
            .ok_or_else(|| AppError::BadRequest("checkout session has no userId".to_string()))?;
        let tier = session
            .metadata
            .get("tier")
            .and_then(|t| PlanTier::parse(t))
            .filter(|t| t.is_purchasable())
            .ok_or_else(|| AppError::BadRequest("checkout session has no valid tier".to_string()))?;

        let Some(mut user) = self.db.get_user(user_id).await? else {
            tracing::warn!(user_id = %user_id, "Checkout completed for unknown user");
            return Ok(EventOutcome::NoMatchingUser);
        };

        user.subscription
            .activate(tier, session.customer, session.subscription.clone());

        if let Some(subscription_id) = &session.subscription {
            // Best effort: the period end arrives again with customer.subscription.updated
            match self.stripe.retrieve_subscription(subscription_id).await {
                Ok(sub) => {
                    user.subscription.current_period_end = sub.current_period_end;
                    user.subscription.cancel_at_period_end = sub.cancel_at_period_end;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        subscription_id = %subscription_id,
                        "Could not fetch subscription after checkout"
                    );
                }
            }
        }

        tracing::info!(user_id = %user.id, tier = %tier, "Subscription activated via checkout");
        self.save(user).await
    }

    async fn subscription_changed(
        &self,
        sub: SubscriptionObject,
    ) -> Result<EventOutcome, AppError> {
        let Some(mut user) = self.user_for_customer(&sub.customer).await? else {
            return Ok(EventOutcome::NoMatchingUser);
        };

        let tier = sub
            .price_id()
            .and_then(|price| self.config.tier_for_price(price))
            .or_else(|| sub.metadata.get("tier").and_then(|t| PlanTier::parse(t)));

        let s = &mut user.subscription;
        if let Some(status) = &sub.status {
            s.status = SubscriptionStatus::from_provider(status);
        }
        if let Some(tier) = tier {
            s.plan = tier;
        }
        if sub.id.is_some() {
            s.stripe_subscription_id = sub.id.clone();
        }
        s.current_period_end = sub.current_period_end;
        s.cancel_at_period_end = sub.cancel_at_period_end;

        tracing::info!(
            user_id = %user.id,
            status = ?user.subscription.status,
            plan = %user.subscription.plan,
            cancel_at_period_end = user.subscription.cancel_at_period_end,
            "Subscription updated"
        );
        self.save(user).await
    }

    async fn subscription_deleted(
        &self,
        sub: SubscriptionObject,
    ) -> Result<EventOutcome, AppError> {
        let Some(mut user) = self.user_for_customer(&sub.customer).await? else {
            return Ok(EventOutcome::NoMatchingUser);
        };

        user.subscription.downgrade_to_bronze();

        tracing::info!(user_id = %user.id, "Subscription deleted, downgraded to bronze");
        self.save(user).await
    }

    async fn payment_failed(&self, invoice: InvoiceObject) -> Result<EventOutcome, AppError> {
        let Some(mut user) = self.user_for_customer(&invoice.customer).await? else {
            return Ok(EventOutcome::NoMatchingUser);
        };

        user.subscription.mark_past_due();

        tracing::warn!(user_id = %user.id, "Invoice payment failed, marked past_due");
        self.save(user).await
    }

    async fn payment_succeeded(&self, invoice: InvoiceObject) -> Result<EventOutcome, AppError> {
        let Some(mut user) = self.user_for_customer(&invoice.customer).await? else {
            return Ok(EventOutcome::NoMatchingUser);
        };

        if user.subscription.stripe_subscription_id.is_none() {
            tracing::debug!(user_id = %user.id, "Paid invoice without a subscription, ignoring");
            return Ok(EventOutcome::Ignored);
        }

        user.subscription.status = SubscriptionStatus::Active;
        self.save(user).await
    }

    async fn user_for_customer(&self, customer_id: &str) -> Result<Option<User>, AppError> {
        let user = self.db.find_user_by_customer_id(customer_id).await?;
        if user.is_none() {
            tracing::warn!(customer_id = %customer_id, "No user for Stripe customer");
        }
        Ok(user)
    }

    async fn save(&self, mut user: User) -> Result<EventOutcome, AppError> {
        user.updated_at = now_rfc3339();
        self.db.update_user(&user).await?;
        Ok(EventOutcome::Updated { user_id: user.id })
    }
}

fn parse_object<T: for<'de> serde::Deserialize<'de>>(
    object: serde_json::Value,
) -> Result<T, AppError> {
    serde_json::from_value(object)
        .map_err(|e| AppError::BadRequest(format!("Unexpected event object: {}", e)))
}
