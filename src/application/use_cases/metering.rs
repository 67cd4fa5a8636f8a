//! AI usage metering gate.
//!
//! Enforces the per-tier monthly quota on AI coaching calls. Correctness under
//! concurrent requests comes from the store's atomic increment-if-below-limit
//! operation, never from in-process locking: every request re-reads the
//! account and the final say belongs to `reserve_ai_request`.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::account::{ReservationOutcome, UserAccountRepo};
use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{subscription_tier::SubscriptionTier, usage_window},
};

/// Permission to perform one metered action, with the usage it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsagePermit {
    pub current: i32,
    /// `None` (JSON `null`) means unlimited.
    pub limit: Option<i32>,
    pub tier: SubscriptionTier,
}

#[derive(Clone)]
pub struct UsageMeter {
    repo: Arc<dyn UserAccountRepo>,
}

impl UsageMeter {
    pub fn new(repo: Arc<dyn UserAccountRepo>) -> Self {
        Self { repo }
    }

    /// Reserve one AI request for `user_id`.
    ///
    /// The counter is incremented before the caller performs the metered
    /// action; a failed downstream call is still counted.
    #[instrument(skip(self))]
    pub async fn authorize(&self, user_id: Uuid) -> AppResult<UsagePermit> {
        let account = self
            .repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let tier = account.subscription_tier;
        let limit = tier.ai_request_limit();
        let now = Utc::now();

        let mut current = account.ai_requests_count;
        if usage_window::needs_reset(account.ai_requests_reset_at, now) {
            let applied = self
                .repo
                .reset_usage_window(user_id, account.ai_requests_reset_at, now)
                .await?;
            info!(
                %user_id,
                previous_count = account.ai_requests_count,
                previous_reset_at = %account.ai_requests_reset_at,
                applied,
                "AI usage window rolled over"
            );
            current = 0;
        }

        if let Some(limit) = limit
            && current >= limit
        {
            info!(%user_id, limit, current, "AI request rejected at pre-check");
            return Err(AppError::QuotaExceeded { limit, current });
        }

        match self.repo.reserve_ai_request(user_id, limit).await {
            Ok(ReservationOutcome::Reserved(new_count)) => Ok(UsagePermit {
                current: new_count,
                limit,
                tier,
            }),
            Ok(ReservationOutcome::LimitReached) => match limit {
                Some(limit) => {
                    info!(%user_id, limit, "AI request lost the reservation race");
                    Err(AppError::QuotaExceeded {
                        limit,
                        current: limit,
                    })
                }
                // Nothing can block an unlimited reservation except a vanished row.
                None => Err(AppError::NotFound),
            },
            Err(e) => {
                error!(%user_id, error = %e, "AI usage reservation failed, denying request");
                Err(AppError::Internal("Failed to record AI usage".into()))
            }
        }
    }
}
