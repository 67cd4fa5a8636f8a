use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::billing_event::SubscriptionSnapshot};

// ============================================================================
// Port Types
// ============================================================================

/// Unique identifier for a customer in the billing provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for a subscription checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: CustomerId,
    pub price_id: String,
    /// Echoed back on `checkout.session.completed` so the webhook can find the user.
    pub client_reference_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalSession {
    pub url: String,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Outbound calls to the billing provider.
///
/// Implementations are opaque remote calls; the app only depends on a
/// subscription's status, its first price id and the customer id.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<CustomerId>;

    async fn create_checkout_session(&self, request: CheckoutRequest)
    -> AppResult<CheckoutSession>;

    async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> AppResult<PortalSession>;

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<SubscriptionSnapshot>;
}
