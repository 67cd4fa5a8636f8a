use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::price_table::PriceTable,
    infra::{
        config::{AppConfig, LogFormat},
        error::InfraError,
        http_client::{COMPLETION_REQUEST_TIMEOUT, try_build_client, try_build_client_with_timeout},
        openai_client::OpenAiClient,
        postgres_persistence,
        stripe_client::StripeClient,
        stripe_signature::StripeSignatureVerifier,
    },
    use_cases::{
        account::{AccountUseCases, UserAccountRepo},
        billing::BillingUseCases,
        coach::CoachUseCases,
        metering::UsageMeter,
        reconciler::SubscriptionReconciler,
    },
};

/// Expects `init_tracing` to have run so startup warnings are recorded.
pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let postgres_arc = Arc::new(
        postgres_persistence(&config.database_url, config.database_max_connections).await?,
    );
    let account_repo = postgres_arc.clone() as Arc<dyn UserAccountRepo>;

    let prices = config.stripe.prices.clone();
    log_price_mapping(&prices);

    let stripe = Arc::new(StripeClient::new(
        try_build_client().map_err(InfraError::HttpClient)?,
        config.stripe.secret_key.clone(),
    ));
    let verifier = Arc::new(StripeSignatureVerifier::new(
        config.stripe.webhook_secret.clone(),
        config.stripe.webhook_tolerance_secs,
    ));
    let coach_model = Arc::new(OpenAiClient::new(
        try_build_client_with_timeout(COMPLETION_REQUEST_TIMEOUT)
            .map_err(InfraError::HttpClient)?,
        &config.openai,
    )?);

    let reconciler =
        SubscriptionReconciler::new(account_repo.clone(), stripe.clone(), verifier, prices.clone());
    let billing_use_cases = BillingUseCases::new(
        account_repo.clone(),
        stripe,
        prices,
        config.app_origin.as_str(),
    );
    let coach_use_cases = CoachUseCases::new(UsageMeter::new(account_repo.clone()), coach_model);
    let account_use_cases = AccountUseCases::new(account_repo);

    Ok(AppState {
        config: Arc::new(config),
        reconciler: Arc::new(reconciler),
        coach_use_cases: Arc::new(coach_use_cases),
        billing_use_cases: Arc::new(billing_use_cases),
        account_use_cases: Arc::new(account_use_cases),
    })
}

fn log_price_mapping(prices: &PriceTable) {
    let configured = prices.configured();
    if configured.is_empty() {
        warn!("No Stripe price ids configured; every subscription will map to the free tier");
    }
    for (price_id, tier) in configured {
        info!(price_id, %tier, "Stripe price mapped");
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flowboard=debug,tower_http=debug".into());

    // Console (pretty logs) for local runs, JSON lines when shipped to a collector
    let (pretty_layer, json_layer) = match format {
        LogFormat::Pretty => (
            Some(fmt::layer().with_target(false).with_level(true).pretty()),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
