use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    repositories::profiles::ProfileRepository, value_objects::profiles::remaining,
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::axum_http::error_responses::HttpError;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("free generation limit of {limit} reached, upgrade to continue")]
    QuotaExceeded { limit: i32 },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for UsageError {
    fn status_code(&self) -> StatusCode {
        match self {
            UsageError::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            UsageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub is_pro: bool,
    pub generations_used: i32,
}

/// Free-tier metering: pro users are never limited; everyone else gets
/// `free_limit` successful generations.
pub struct UsageGuard<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    free_limit: i32,
}

impl<P> UsageGuard<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, free_limit: i32) -> Self {
        Self {
            profile_repo,
            free_limit,
        }
    }

    pub async fn ensure_can_generate(&self, user_id: Uuid) -> Result<UsageSnapshot, UsageError> {
        let profile = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "usage_guard: failed to load profile");
            UsageError::Internal(err)
        })?;

        let snapshot = profile
            .map(|p| UsageSnapshot {
                is_pro: p.is_pro,
                generations_used: p.generations_used,
            })
            .unwrap_or(UsageSnapshot {
                is_pro: false,
                generations_used: 0,
            });

        if !snapshot.is_pro && snapshot.generations_used >= self.free_limit {
            info!(
                %user_id,
                generations_used = snapshot.generations_used,
                limit = self.free_limit,
                "usage_guard: free limit reached"
            );
            return Err(UsageError::QuotaExceeded {
                limit: self.free_limit,
            });
        }

        Ok(snapshot)
    }

    /// Counts one successful generation and returns the new total.
    pub async fn record_generation(&self, user_id: Uuid) -> Result<i32, UsageError> {
        let used = self
            .profile_repo
            .increment_generations_used(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "usage_guard: failed to increment usage");
                UsageError::Internal(err)
            })?;
        info!(%user_id, generations_used = used, "usage_guard: generation recorded");
        Ok(used)
    }

    pub fn remaining(&self, snapshot: UsageSnapshot, generations_used: i32) -> Option<i32> {
        remaining(snapshot.is_pro, generations_used, self.free_limit)
    }
}
