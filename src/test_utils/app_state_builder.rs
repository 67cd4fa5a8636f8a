//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires every use case to in-memory mocks and a fixed
//! configuration, so route tests only seed the accounts they need.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::jwt,
    domain::entities::{price_table::PriceTable, user_account::UserAccount},
    infra::{
        config::{AppConfig, LogFormat, OpenAiConfig, StripeConfig},
        stripe_signature::StripeSignatureVerifier,
    },
    test_utils::{FakeBillingProvider, InMemoryUserAccountRepo, ScriptedCoachModel},
    use_cases::{
        account::AccountUseCases, billing::BillingUseCases, coach::CoachUseCases,
        metering::UsageMeter, reconciler::SubscriptionReconciler,
    },
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-route-tests";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_route_tests";

pub struct TestAppStateBuilder {
    repo: Arc<InMemoryUserAccountRepo>,
    provider: Arc<FakeBillingProvider>,
    coach_model: Arc<ScriptedCoachModel>,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryUserAccountRepo::new()),
            provider: Arc::new(FakeBillingProvider::new()),
            coach_model: Arc::new(ScriptedCoachModel::replying("Stay focused.")),
        }
    }

    pub fn with_account(self, account: UserAccount) -> Self {
        self.repo
            .accounts
            .lock()
            .unwrap()
            .insert(account.id, account);
        self
    }

    pub fn with_coach_reply(mut self, reply: &str) -> Self {
        self.coach_model = Arc::new(ScriptedCoachModel::replying(reply));
        self
    }

    pub fn with_failing_billing_provider(self) -> Self {
        self.provider.fail_requests(true);
        self
    }

    pub fn account_repo(&self) -> Arc<InMemoryUserAccountRepo> {
        self.repo.clone()
    }

    pub fn billing_provider(&self) -> Arc<FakeBillingProvider> {
        self.provider.clone()
    }

    pub fn coach_model(&self) -> Arc<ScriptedCoachModel> {
        self.coach_model.clone()
    }

    /// Signed access token for `user_id`.
    pub fn token(user_id: Uuid) -> String {
        jwt::issue(
            user_id,
            &SecretString::new(TEST_JWT_SECRET.into()),
            time::Duration::minutes(15),
        )
    }

    /// `Authorization` header value for `user_id`.
    pub fn bearer(user_id: Uuid) -> String {
        format!("Bearer {}", Self::token(user_id))
    }

    pub fn build(self) -> AppState {
        let config = test_config();
        let prices = config.stripe.prices.clone();

        let reconciler = SubscriptionReconciler::new(
            self.repo.clone(),
            self.provider.clone(),
            Arc::new(StripeSignatureVerifier::new(
                config.stripe.webhook_secret.clone(),
                config.stripe.webhook_tolerance_secs,
            )),
            prices.clone(),
        );
        let billing_use_cases = BillingUseCases::new(
            self.repo.clone(),
            self.provider.clone(),
            prices,
            config.app_origin.as_str(),
        );
        let coach_use_cases =
            CoachUseCases::new(UsageMeter::new(self.repo.clone()), self.coach_model.clone());
        let account_use_cases = AccountUseCases::new(self.repo.clone());

        AppState {
            config: Arc::new(config),
            reconciler: Arc::new(reconciler),
            coach_use_cases: Arc::new(coach_use_cases),
            billing_use_cases: Arc::new(billing_use_cases),
            account_use_cases: Arc::new(account_use_cases),
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: "postgres://localhost/flowboard_test".into(),
        database_max_connections: 1,
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        log_format: LogFormat::Pretty,
        stripe: StripeConfig {
            secret_key: SecretString::new("sk_test_unused".into()),
            webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
            webhook_tolerance_secs: 300,
            prices: PriceTable::new(
                Some("price_pro_monthly".into()),
                Some("price_pro_yearly".into()),
                Some("price_elite_monthly".into()),
                Some("price_elite_yearly".into()),
            ),
        },
        openai: OpenAiConfig {
            api_key: SecretString::new("sk-unused".into()),
            base_url: Url::parse("https://api.openai.com/v1/").unwrap(),
            model: "gpt-4o-mini".into(),
            max_tokens: 300,
            temperature: 0.7,
        },
    }
}
