use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::account::{ReservationOutcome, UserAccountRepo},
    domain::entities::user_account::{AccountPatch, AccountTarget, UserAccount},
};

const ACCOUNT_COLUMNS: &str = "id, email, subscription_tier, subscription_status, stripe_customer_id, stripe_subscription_id, ai_requests_count, ai_requests_reset_at, created_at, updated_at";

fn row_to_account(row: sqlx::postgres::PgRow) -> UserAccount {
    UserAccount {
        id: row.get("id"),
        email: row.get("email"),
        subscription_tier: row.get("subscription_tier"),
        subscription_status: row.get("subscription_status"),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        ai_requests_count: row.get("ai_requests_count"),
        ai_requests_reset_at: row.get("ai_requests_reset_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// One UPDATE for every patch shape: absent fields keep their column value.
/// `$5` says whether `$6` replaces the status, so the status can be cleared.
const PATCH_SET: &str = r#"
    UPDATE users SET
        stripe_customer_id = COALESCE($2, stripe_customer_id),
        stripe_subscription_id = COALESCE($3, stripe_subscription_id),
        subscription_tier = COALESCE($4, subscription_tier),
        subscription_status = CASE WHEN $5 THEN $6 ELSE subscription_status END,
        updated_at = NOW()
"#;

#[async_trait]
impl UserAccountRepo for PostgresPersistence {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_account))
    }

    async fn apply_patch(&self, target: &AccountTarget, patch: &AccountPatch) -> AppResult<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let filter = match target {
            AccountTarget::CustomerId(_) => "stripe_customer_id = $1",
            AccountTarget::UserId(_) => "id = $1",
        };
        let sql = format!("{PATCH_SET} WHERE {filter}");

        let statement = sqlx::query(&sql);
        let statement = match target {
            AccountTarget::CustomerId(customer_id) => statement.bind(customer_id.as_str()),
            AccountTarget::UserId(user_id) => statement.bind(*user_id),
        };

        let result = statement
            .bind(patch.stripe_customer_id.as_deref())
            .bind(patch.stripe_subscription_id.as_deref())
            .bind(patch.subscription_tier)
            .bind(patch.subscription_status.is_some())
            .bind(patch.subscription_status.flatten())
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected())
    }

    async fn reset_usage_window(
        &self,
        user_id: Uuid,
        expected_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET ai_requests_count = 0, ai_requests_reset_at = $3, updated_at = NOW()
            WHERE id = $1 AND ai_requests_reset_at = $2
            "#,
        )
        .bind(user_id)
        .bind(expected_reset_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn reserve_ai_request(
        &self,
        user_id: Uuid,
        limit: Option<i32>,
    ) -> AppResult<ReservationOutcome> {
        let new_count: Option<i32> =
            sqlx::query_scalar("SELECT increment_ai_requests_if_below($1, $2)")
                .bind(user_id)
                .bind(limit)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)?;

        Ok(match new_count {
            Some(count) => ReservationOutcome::Reserved(count),
            None => ReservationOutcome::LimitReached,
        })
    }
}
