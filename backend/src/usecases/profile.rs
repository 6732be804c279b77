use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    repositories::profiles::ProfileRepository, value_objects::profiles::ProfileDto,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::axum_http::error_responses::HttpError;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for ProfileError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub struct ProfileUseCase<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    free_limit: i32,
}

impl<P> ProfileUseCase<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, free_limit: i32) -> Self {
        Self {
            profile_repo,
            free_limit,
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileDto, ProfileError> {
        let profile = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "profile: failed to load profile");
            ProfileError::Internal(err)
        })?;
        Ok(ProfileDto::from_entity(user_id, profile, self.free_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::usage_guard::tests::sample_profile;
    use crates::domain::repositories::profiles::MockProfileRepository;

    #[tokio::test]
    async fn missing_profile_gets_free_defaults() {
        let user_id = Uuid::new_v4();
        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(None) }));

        let profile = ProfileUseCase::new(Arc::new(profile_repo), 3)
            .get_profile(user_id)
            .await
            .unwrap();

        assert_eq!(profile.id, user_id);
        assert!(!profile.is_pro);
        assert_eq!(profile.remaining_generations, Some(3));
    }

    #[tokio::test]
    async fn pro_profile_has_no_remaining_cap() {
        let user_id = Uuid::new_v4();
        let mut profile_repo = MockProfileRepository::new();
        profile_repo.expect_find_by_id().returning(move |_| {
            let mut profile = sample_profile(user_id, true, 12);
            profile.subscription_status = Some("active".to_string());
            Box::pin(async move { Ok(Some(profile)) })
        });

        let profile = ProfileUseCase::new(Arc::new(profile_repo), 3)
            .get_profile(user_id)
            .await
            .unwrap();

        assert!(profile.is_pro);
        assert_eq!(profile.generations_used, 12);
        assert_eq!(profile.remaining_generations, None);
        assert_eq!(profile.subscription_status.as_deref(), Some("active"));
    }
}
