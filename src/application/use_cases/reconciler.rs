//! Subscription reconciler.
//!
//! Applies billing-provider webhook events to the local account table so the
//! stored tier and status mirror the provider's view. Every write is a plain
//! last-write-wins set, so redelivering an event converges to the same row.
//! Events delivered out of order can still leave a stale status behind; the
//! provider's `created` timestamp is not compared.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{billing_provider::BillingProvider, webhook_verifier::WebhookVerifier},
    domain::entities::{
        billing_event::{BillingEvent, CheckoutSnapshot, InvoiceSnapshot, SubscriptionSnapshot},
        price_table::PriceTable,
        subscription_status::SubscriptionStatus,
        subscription_tier::SubscriptionTier,
        user_account::{AccountPatch, AccountTarget},
    },
};

use super::account::UserAccountRepo;

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: Value,
}

/// What the reconciler did with an accepted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileAction {
    /// A single update ran; `rows_matched` may be 0 when no account matched.
    Updated { rows_matched: u64 },
    /// Event understood but required no write.
    Skipped { reason: &'static str },
    /// Event type this service does not act on.
    Unhandled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub event_id: String,
    pub event_type: String,
    #[serde(flatten)]
    pub action: ReconcileAction,
}

enum Plan {
    Write(AccountTarget, AccountPatch),
    Skip(&'static str),
    Unhandled,
}

#[derive(Clone)]
pub struct SubscriptionReconciler {
    repo: Arc<dyn UserAccountRepo>,
    provider: Arc<dyn BillingProvider>,
    verifier: Arc<dyn WebhookVerifier>,
    prices: PriceTable,
}

impl SubscriptionReconciler {
    pub fn new(
        repo: Arc<dyn UserAccountRepo>,
        provider: Arc<dyn BillingProvider>,
        verifier: Arc<dyn WebhookVerifier>,
        prices: PriceTable,
    ) -> Self {
        Self {
            repo,
            provider,
            verifier,
            prices,
        }
    }

    /// Authenticate, parse and apply one webhook delivery.
    ///
    /// Signature and payload errors are client errors and change nothing.
    /// Store or provider failures are returned as retryable errors so the
    /// provider redelivers the event.
    #[instrument(skip(self, raw_body, signature), fields(body_len = raw_body.len()))]
    pub async fn handle_webhook(
        &self,
        raw_body: &str,
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let signature = signature
            .ok_or_else(|| AppError::InvalidSignature("Missing signature header".into()))?;
        self.verifier.verify(raw_body, signature)?;

        let envelope: WebhookEnvelope = serde_json::from_str(raw_body)
            .map_err(|e| AppError::InvalidInput(format!("Malformed webhook payload: {}", e)))?;
        let event = BillingEvent::parse(&envelope.event_type, &envelope.data.object)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        info!(
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            "Processing billing event"
        );

        let plan = self
            .plan(event)
            .await
            .map_err(redeliverable("Billing provider lookup failed"))?;
        let action = match plan {
            Plan::Write(target, patch) => {
                let rows_matched = self
                    .repo
                    .apply_patch(&target, &patch)
                    .await
                    .map_err(redeliverable("Account update failed"))?;
                if rows_matched == 0 {
                    warn!(
                        event_id = %envelope.id,
                        %target,
                        "No account matched billing event"
                    );
                } else {
                    info!(
                        event_id = %envelope.id,
                        %target,
                        tier = ?patch.subscription_tier,
                        status = ?patch.subscription_status,
                        "Account billing state updated"
                    );
                }
                ReconcileAction::Updated { rows_matched }
            }
            Plan::Skip(reason) => ReconcileAction::Skipped { reason },
            Plan::Unhandled => {
                debug!(event_type = %envelope.event_type, "Ignoring unhandled event type");
                ReconcileAction::Unhandled
            }
        };

        Ok(WebhookOutcome {
            event_id: envelope.id,
            event_type: envelope.event_type,
            action,
        })
    }

    async fn plan(&self, event: BillingEvent) -> AppResult<Plan> {
        let plan = match event {
            BillingEvent::SubscriptionChanged(subscription) => {
                let (target, patch) = subscription_changed(&self.prices, subscription);
                Plan::Write(target, patch)
            }
            BillingEvent::SubscriptionDeleted(subscription) => {
                let (target, patch) = subscription_deleted(subscription);
                Plan::Write(target, patch)
            }
            BillingEvent::CheckoutCompleted(session) => self.checkout_completed(session).await?,
            BillingEvent::InvoicePaid(invoice) => {
                info!(invoice_id = %invoice.id, customer_id = %invoice.customer_id, "Invoice paid");
                Plan::Skip("invoice paid")
            }
            BillingEvent::InvoicePaymentFailed(invoice) => {
                let (target, patch) = payment_failed(invoice);
                Plan::Write(target, patch)
            }
            BillingEvent::Unrecognized(_) => Plan::Unhandled,
        };
        Ok(plan)
    }

    async fn checkout_completed(&self, session: CheckoutSnapshot) -> AppResult<Plan> {
        let Some(reference) = session.client_reference_id.as_deref() else {
            warn!(session_id = %session.id, "Checkout completed without client reference");
            return Ok(Plan::Skip("missing client reference"));
        };
        let Ok(user_id) = Uuid::parse_str(reference) else {
            warn!(session_id = %session.id, reference, "Checkout client reference is not a user id");
            return Ok(Plan::Skip("invalid client reference"));
        };
        let Some(subscription_id) = session.subscription_id.as_deref() else {
            warn!(session_id = %session.id, %user_id, "Checkout completed without subscription");
            return Ok(Plan::Skip("missing subscription"));
        };

        let subscription = self.provider.get_subscription(subscription_id).await?;
        let tier = tier_of(&self.prices, &subscription);

        let patch = AccountPatch {
            stripe_customer_id: Some(session.customer_id.unwrap_or(subscription.customer_id)),
            stripe_subscription_id: Some(subscription.id),
            subscription_tier: Some(tier),
            subscription_status: Some(Some(SubscriptionStatus::Active)),
        };
        Ok(Plan::Write(AccountTarget::UserId(user_id), patch))
    }
}

/// Anything failing after the delivery is authenticated must come back as a
/// retryable error so the event is delivered again.
fn redeliverable(context: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| {
        if err.is_retryable() {
            err
        } else {
            warn!(error = %err, context, "Billing event not applied");
            AppError::Internal(format!("{}: {}", context, err))
        }
    }
}

fn tier_of(prices: &PriceTable, subscription: &SubscriptionSnapshot) -> SubscriptionTier {
    subscription
        .price_id
        .as_deref()
        .map(|price| prices.tier_for_price(price))
        .unwrap_or_default()
}

fn subscription_changed(
    prices: &PriceTable,
    subscription: SubscriptionSnapshot,
) -> (AccountTarget, AccountPatch) {
    let tier = tier_of(prices, &subscription);
    let status = SubscriptionStatus::from_stripe(&subscription.status);
    if status.is_none() {
        warn!(
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Unmapped subscription status, clearing stored status"
        );
    }

    let patch = AccountPatch {
        stripe_customer_id: Some(subscription.customer_id.clone()),
        stripe_subscription_id: Some(subscription.id),
        subscription_tier: Some(tier),
        subscription_status: Some(status),
    };
    (AccountTarget::CustomerId(subscription.customer_id), patch)
}

fn subscription_deleted(subscription: SubscriptionSnapshot) -> (AccountTarget, AccountPatch) {
    let patch = AccountPatch {
        subscription_tier: Some(SubscriptionTier::Free),
        subscription_status: Some(Some(SubscriptionStatus::Canceled)),
        ..Default::default()
    };
    (AccountTarget::CustomerId(subscription.customer_id), patch)
}

fn payment_failed(invoice: InvoiceSnapshot) -> (AccountTarget, AccountPatch) {
    let patch = AccountPatch {
        subscription_status: Some(Some(SubscriptionStatus::PastDue)),
        ..Default::default()
    };
    (AccountTarget::CustomerId(invoice.customer_id), patch)
}
