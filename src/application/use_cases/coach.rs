use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::metering::{UsageMeter, UsagePermit};
use crate::{
    app_error::{AppError, AppResult},
    application::ports::coach_model::CoachModel,
    domain::entities::coach_request::CoachRequest,
};

#[derive(Debug, Clone, Serialize)]
pub struct CoachReply {
    pub response: String,
    pub usage: UsagePermit,
}

#[derive(Clone)]
pub struct CoachUseCases {
    meter: UsageMeter,
    model: Arc<dyn CoachModel>,
}

impl CoachUseCases {
    pub fn new(meter: UsageMeter, model: Arc<dyn CoachModel>) -> Self {
        Self { meter, model }
    }

    /// Answer one coaching request, charging it against the user's quota.
    ///
    /// Invalid requests are rejected before any usage is recorded. Once the
    /// quota is reserved the request counts, even if the model call fails.
    #[instrument(skip(self, request), fields(request_type = request.request_type.as_str()))]
    pub async fn coach(&self, user_id: Uuid, request: CoachRequest) -> AppResult<CoachReply> {
        let prompt = request
            .prompt()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let usage = self.meter.authorize(user_id).await?;

        let response = self.model.complete(&prompt).await.map_err(|e| {
            error!(%user_id, error = %e, "AI coach completion failed");
            AppError::Internal("Failed to generate AI response".into())
        })?;

        info!(%user_id, current = usage.current, limit = ?usage.limit, "AI coach request served");
        Ok(CoachReply { response, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::entities::{
            coach_request::{CoachRequestType, CoachTask, SessionReflection},
            subscription_tier::SubscriptionTier,
        },
        test_utils::{InMemoryUserAccountRepo, ScriptedCoachModel, create_test_account},
    };

    fn request(request_type: CoachRequestType, task: Option<CoachTask>) -> CoachRequest {
        CoachRequest {
            request_type,
            task,
            history: serde_json::Value::Null,
            reflection: SessionReflection::default(),
        }
    }

    fn task() -> Option<CoachTask> {
        Some(CoachTask {
            title: "Ship billing".into(),
            description: None,
        })
    }

    #[tokio::test]
    async fn test_coach_returns_reply_with_usage() {
        let account = create_test_account(|a| a.ai_requests_count = 2);
        let user_id = account.id;
        let repo = Arc::new(InMemoryUserAccountRepo::with_accounts(vec![account]));
        let model = Arc::new(ScriptedCoachModel::replying("Step 1: breathe"));
        let coach = CoachUseCases::new(UsageMeter::new(repo), model.clone());

        let reply = coach
            .coach(user_id, request(CoachRequestType::TaskBreakdown, task()))
            .await
            .unwrap();

        assert_eq!(reply.response, "Step 1: breathe");
        assert_eq!(reply.usage.current, 3);
        assert_eq!(reply.usage.limit, Some(5));
        assert_eq!(reply.usage.tier, SubscriptionTier::Free);
        assert!(model.last_prompt().unwrap().user.contains("Ship billing"));
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_metered() {
        let account = create_test_account(|_| {});
        let user_id = account.id;
        let repo = Arc::new(InMemoryUserAccountRepo::with_accounts(vec![account]));
        let model = Arc::new(ScriptedCoachModel::replying("unused"));
        let coach = CoachUseCases::new(UsageMeter::new(repo.clone()), model.clone());

        let err = coach
            .coach(user_id, request(CoachRequestType::DopamineDetox, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(repo.get(user_id).unwrap().ai_requests_count, 0);
        assert!(model.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_exhausted_quota_skips_model() {
        let account = create_test_account(|a| a.ai_requests_count = 5);
        let user_id = account.id;
        let repo = Arc::new(InMemoryUserAccountRepo::with_accounts(vec![account]));
        let model = Arc::new(ScriptedCoachModel::replying("unused"));
        let coach = CoachUseCases::new(UsageMeter::new(repo), model.clone());

        let err = coach
            .coach(user_id, request(CoachRequestType::MotivationalInsight, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded { limit: 5, current: 5 }));
        assert!(model.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_model_failure_still_counts_usage() {
        let account = create_test_account(|_| {});
        let user_id = account.id;
        let repo = Arc::new(InMemoryUserAccountRepo::with_accounts(vec![account]));
        let coach = CoachUseCases::new(
            UsageMeter::new(repo.clone()),
            Arc::new(ScriptedCoachModel::failing()),
        );

        let err = coach
            .coach(user_id, request(CoachRequestType::MotivationalInsight, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(repo.get(user_id).unwrap().ai_requests_count, 1);
    }
}
