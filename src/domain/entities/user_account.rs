use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{subscription_status::SubscriptionStatus, subscription_tier::SubscriptionTier};

/// Row of the `users` table relevant to billing and AI usage.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: Option<SubscriptionStatus>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub ai_requests_count: i32,
    pub ai_requests_reset_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Which account row a billing update applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountTarget {
    CustomerId(String),
    UserId(Uuid),
}

impl std::fmt::Display for AccountTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountTarget::CustomerId(id) => write!(f, "customer {}", id),
            AccountTarget::UserId(id) => write!(f, "user {}", id),
        }
    }
}

/// Billing fields written by a single reconciliation step.
///
/// `None` leaves the column untouched. `status: Some(None)` explicitly
/// clears the status (unknown provider status).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub subscription_status: Option<Option<SubscriptionStatus>>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self == &AccountPatch::default()
    }

    /// Apply the patch to an in-memory account.
    pub fn apply_to(&self, account: &mut UserAccount) {
        if let Some(customer_id) = &self.stripe_customer_id {
            account.stripe_customer_id = Some(customer_id.clone());
        }
        if let Some(subscription_id) = &self.stripe_subscription_id {
            account.stripe_subscription_id = Some(subscription_id.clone());
        }
        if let Some(tier) = self.subscription_tier {
            account.subscription_tier = tier;
        }
        if let Some(status) = self.subscription_status {
            account.subscription_status = status;
        }
    }
}
