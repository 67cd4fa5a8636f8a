use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        subscription_status::SubscriptionStatus,
        subscription_tier::SubscriptionTier,
        usage_window::{self, UsageState},
        user_account::{AccountPatch, AccountTarget, UserAccount},
    },
};

/// Result of the atomic increment-if-below-limit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Counter was incremented; carries the new value.
    Reserved(i32),
    /// Counter was already at the limit; nothing changed.
    LimitReached,
}

#[async_trait]
pub trait UserAccountRepo: Send + Sync {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserAccount>>;

    /// Apply a billing patch with a single UPDATE. Returns the number of rows matched.
    async fn apply_patch(&self, target: &AccountTarget, patch: &AccountPatch) -> AppResult<u64>;

    /// Reset the AI counter to 0 and the window start to `now`, only if the
    /// stored window start still equals `expected_reset_at`.
    /// Returns false when another request already reset the window.
    async fn reset_usage_window(
        &self,
        user_id: Uuid,
        expected_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Increment the AI counter by one iff it is below `limit` (`None` = no
    /// limit), as one indivisible operation in the store.
    async fn reserve_ai_request(
        &self,
        user_id: Uuid,
        limit: Option<i32>,
    ) -> AppResult<ReservationOutcome>;
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub current: i32,
    /// `null` means unlimited.
    pub limit: Option<i32>,
    pub reset_at: DateTime<Utc>,
    pub state: UsageState,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub tier: SubscriptionTier,
    pub status: Option<SubscriptionStatus>,
    pub has_billing_account: bool,
    pub ai_usage: UsageSummary,
}

#[derive(Clone)]
pub struct AccountUseCases {
    repo: Arc<dyn UserAccountRepo>,
}

impl AccountUseCases {
    pub fn new(repo: Arc<dyn UserAccountRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<AccountProfile> {
        let account = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(profile_at(&account, Utc::now()))
    }
}

/// Build the profile as the next metered request would see it: a pending
/// monthly reset is applied to the displayed usage without writing it.
fn profile_at(account: &UserAccount, now: DateTime<Utc>) -> AccountProfile {
    let limit = account.subscription_tier.ai_request_limit();
    let pending_reset = usage_window::needs_reset(account.ai_requests_reset_at, now);
    let current =
        usage_window::effective_count(account.ai_requests_count, account.ai_requests_reset_at, now);
    let reset_at = if pending_reset {
        now
    } else {
        account.ai_requests_reset_at
    };

    AccountProfile {
        id: account.id,
        email: account.email.clone(),
        tier: account.subscription_tier,
        status: account.subscription_status,
        has_billing_account: account.stripe_customer_id.is_some(),
        ai_usage: UsageSummary {
            current,
            limit,
            reset_at,
            state: UsageState::of(current, limit),
        },
    }
}
