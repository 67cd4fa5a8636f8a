use serde::{Deserialize, Serialize};

/// Monthly AI coaching requests included in the free tier.
pub const FREE_TIER_AI_REQUESTS: i32 = 5;

/// Subscription level of a user account.
///
/// Never set directly by the user: it is derived from the price on the
/// billing provider's subscription, and falls back to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Elite,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Elite => "elite",
        }
    }

    /// Monthly AI request quota. `None` means unlimited.
    pub fn ai_request_limit(&self) -> Option<i32> {
        match self {
            SubscriptionTier::Free => Some(FREE_TIER_AI_REQUESTS),
            SubscriptionTier::Pro | SubscriptionTier::Elite => None,
        }
    }

    /// Returns true for tiers that can be bought through checkout.
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
