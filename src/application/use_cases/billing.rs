use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::account::UserAccountRepo;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{
        BillingProvider, CheckoutRequest, CheckoutSession, CustomerId, PortalSession,
    },
    domain::entities::{
        billing_interval::BillingInterval,
        price_table::PriceTable,
        subscription_tier::SubscriptionTier,
        user_account::{AccountPatch, AccountTarget},
    },
};

#[derive(Clone)]
pub struct BillingUseCases {
    repo: Arc<dyn UserAccountRepo>,
    provider: Arc<dyn BillingProvider>,
    prices: PriceTable,
    /// Frontend origin without trailing slash, used for redirect URLs.
    app_origin: String,
}

impl BillingUseCases {
    pub fn new(
        repo: Arc<dyn UserAccountRepo>,
        provider: Arc<dyn BillingProvider>,
        prices: PriceTable,
        app_origin: &str,
    ) -> Self {
        Self {
            repo,
            provider,
            prices,
            app_origin: app_origin.trim_end_matches('/').to_string(),
        }
    }

    /// Start a subscription checkout for a paid tier.
    ///
    /// The resulting session carries the user id as its client reference;
    /// the tier itself is only granted once the webhook confirms payment.
    #[instrument(skip(self))]
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        interval: BillingInterval,
    ) -> AppResult<CheckoutSession> {
        if !tier.is_paid() {
            return Err(AppError::InvalidInput(format!(
                "Tier '{}' cannot be purchased",
                tier
            )));
        }
        let price_id = self.prices.price_for(tier, interval).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "No {} price configured for tier '{}'",
                interval.as_str(),
                tier
            ))
        })?;

        let account = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let customer_id = match account.stripe_customer_id {
            Some(id) => CustomerId::new(id),
            None => {
                let customer_id = self.provider.create_customer(&account.email, user_id).await?;
                let patch = AccountPatch {
                    stripe_customer_id: Some(customer_id.as_str().to_string()),
                    ..Default::default()
                };
                self.repo
                    .apply_patch(&AccountTarget::UserId(user_id), &patch)
                    .await?;
                info!(%user_id, %customer_id, "Created billing customer");
                customer_id
            }
        };

        let session = self
            .provider
            .create_checkout_session(CheckoutRequest {
                customer_id,
                price_id: price_id.to_string(),
                client_reference_id: user_id,
                success_url: format!(
                    "{}/pricing/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.app_origin
                ),
                cancel_url: format!("{}/pricing", self.app_origin),
            })
            .await?;

        info!(%user_id, session_id = %session.session_id, %tier, "Checkout session created");
        Ok(session)
    }

    /// Open the provider's self-service portal for an existing customer.
    #[instrument(skip(self))]
    pub async fn create_portal(&self, user_id: Uuid) -> AppResult<PortalSession> {
        let account = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let customer_id = account
            .stripe_customer_id
            .map(CustomerId::new)
            .ok_or_else(|| AppError::InvalidInput("No billing account found".into()))?;

        self.provider
            .create_portal_session(&customer_id, &format!("{}/settings", self.app_origin))
            .await
    }
}
