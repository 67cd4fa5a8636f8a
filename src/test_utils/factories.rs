//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{subscription_tier::SubscriptionTier, user_account::UserAccount};

/// Create a free-tier account with no usage in the current month.
pub fn create_test_account(overrides: impl FnOnce(&mut UserAccount)) -> UserAccount {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let mut account = UserAccount {
        id,
        email: format!("user-{}@example.com", id.simple()),
        subscription_tier: SubscriptionTier::Free,
        subscription_status: None,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        ai_requests_count: 0,
        ai_requests_reset_at: now,
        created_at: Some(now),
        updated_at: Some(now),
    };
    overrides(&mut account);
    account
}
