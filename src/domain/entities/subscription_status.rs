use serde::{Deserialize, Serialize};

/// Subscription status as stored on the user account.
///
/// Only the four statuses the app acts on are modelled. Anything else the
/// billing provider reports is stored as NULL (unknown) rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Trialing => "trialing",
        }
    }

    /// Convert from Stripe subscription status string
    pub fn from_stripe(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "trialing" => Some(SubscriptionStatus::Trialing),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
