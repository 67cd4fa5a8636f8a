//! Fake billing provider that records requests instead of calling out.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{
        BillingProvider, CheckoutRequest, CheckoutSession, CustomerId, PortalSession,
    },
    domain::entities::billing_event::SubscriptionSnapshot,
};

#[derive(Default)]
pub struct FakeBillingProvider {
    pub subscriptions: Mutex<HashMap<String, SubscriptionSnapshot>>,
    pub customers: Mutex<Vec<(CustomerId, Uuid)>>,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
    fail: AtomicBool,
}

impl FakeBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subscription(&self, subscription: SubscriptionSnapshot) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id.clone(), subscription);
    }

    /// Make every call fail as if the provider were down.
    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_checkout(&self) -> Option<CheckoutRequest> {
        self.checkouts.lock().unwrap().last().cloned()
    }

    pub fn customers_created(&self) -> usize {
        self.customers.lock().unwrap().len()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("Stripe request failed: timeout".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingProvider for FakeBillingProvider {
    async fn create_customer(&self, _email: &str, user_id: Uuid) -> AppResult<CustomerId> {
        self.check_available()?;
        let customer_id = CustomerId::new(format!("cus_{}", user_id.simple()));
        self.customers
            .lock()
            .unwrap()
            .push((customer_id.clone(), user_id));
        Ok(customer_id)
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutSession> {
        self.check_available()?;
        let mut checkouts = self.checkouts.lock().unwrap();
        let session_id = format!("cs_test_{}", checkouts.len() + 1);
        checkouts.push(request);
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{}", session_id)),
            session_id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> AppResult<PortalSession> {
        self.check_available()?;
        Ok(PortalSession {
            url: format!(
                "https://billing.test/portal/{}?return_url={}",
                customer_id, return_url
            ),
        })
    }

    async fn get_subscription(&self, subscription_id: &str) -> AppResult<SubscriptionSnapshot> {
        self.check_available()?;
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or(AppError::NotFound)
    }
}
