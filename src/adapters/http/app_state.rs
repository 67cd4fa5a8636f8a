use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        account::AccountUseCases, billing::BillingUseCases, coach::CoachUseCases,
        reconciler::SubscriptionReconciler,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reconciler: Arc<SubscriptionReconciler>,
    pub coach_use_cases: Arc<CoachUseCases>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub account_use_cases: Arc<AccountUseCases>,
}
