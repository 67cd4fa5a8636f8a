//! In-memory mock for the account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::account::{ReservationOutcome, UserAccountRepo},
    domain::entities::user_account::{AccountPatch, AccountTarget, UserAccount},
};

// ============================================================================
// InMemoryUserAccountRepo
// ============================================================================

/// Reservations run under a single lock, matching the store's atomic
/// increment-if-below-limit.
#[derive(Default)]
pub struct InMemoryUserAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, UserAccount>>,
    fail_reservations: AtomicBool,
    reject_patches: AtomicBool,
    pending_bumps: Mutex<Vec<Uuid>>,
    patches: AtomicUsize,
}

impl InMemoryUserAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<UserAccount>) -> Self {
        let map = accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
            ..Default::default()
        }
    }

    pub fn get(&self, user_id: Uuid) -> Option<UserAccount> {
        self.accounts.lock().unwrap().get(&user_id).cloned()
    }

    /// Make every reservation fail as if the database were unreachable.
    pub fn fail_reservations(&self, fail: bool) {
        self.fail_reservations.store(fail, Ordering::SeqCst);
    }

    /// Make every `apply_patch` fail the way a unique violation on
    /// `stripe_customer_id` surfaces from the store.
    pub fn reject_patches(&self, reject: bool) {
        self.reject_patches.store(reject, Ordering::SeqCst);
    }

    /// Simulate a concurrent request consuming one slot right before the
    /// next reservation for `user_id`.
    pub fn bump_before_next_reservation(&self, user_id: Uuid) {
        self.pending_bumps.lock().unwrap().push(user_id);
    }

    /// Number of `apply_patch` calls made.
    pub fn patch_count(&self) -> usize {
        self.patches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserAccountRepo for InMemoryUserAccountRepo {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserAccount>> {
        Ok(self.get(user_id))
    }

    async fn apply_patch(&self, target: &AccountTarget, patch: &AccountPatch) -> AppResult<u64> {
        self.patches.fetch_add(1, Ordering::SeqCst);
        if self.reject_patches.load(Ordering::SeqCst) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }
        let mut accounts = self.accounts.lock().unwrap();
        let mut matched = 0;
        for account in accounts.values_mut() {
            let hit = match target {
                AccountTarget::UserId(id) => account.id == *id,
                AccountTarget::CustomerId(id) => {
                    account.stripe_customer_id.as_deref() == Some(id.as_str())
                }
            };
            if hit {
                patch.apply_to(account);
                account.updated_at = Some(Utc::now());
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn reset_usage_window(
        &self,
        user_id: Uuid,
        expected_reset_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(&user_id) {
            Some(account) if account.ai_requests_reset_at == expected_reset_at => {
                account.ai_requests_count = 0;
                account.ai_requests_reset_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reserve_ai_request(
        &self,
        user_id: Uuid,
        limit: Option<i32>,
    ) -> AppResult<ReservationOutcome> {
        if self.fail_reservations.load(Ordering::SeqCst) {
            return Err(AppError::Database("connection refused".into()));
        }

        let mut accounts = self.accounts.lock().unwrap();
        let Some(account) = accounts.get_mut(&user_id) else {
            return Ok(ReservationOutcome::LimitReached);
        };

        let mut bumps = self.pending_bumps.lock().unwrap();
        if let Some(pos) = bumps.iter().position(|id| *id == user_id) {
            bumps.remove(pos);
            account.ai_requests_count += 1;
        }

        match limit {
            Some(limit) if account.ai_requests_count >= limit => Ok(ReservationOutcome::LimitReached),
            _ => {
                account.ai_requests_count += 1;
                Ok(ReservationOutcome::Reserved(account.ai_requests_count))
            }
        }
    }
}
