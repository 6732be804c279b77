use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    repositories::{auth_provider::AuthProvider, profiles::ProfileRepository},
    value_objects::{
        auth::{AuthProviderUser, CreateSessionRequest, CurrentUserDto},
        profiles::ProfileDto,
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::axum_http::error_responses::HttpError;

#[derive(Debug, Error)]
pub enum AuthSessionError {
    #[error("access_token is required")]
    MissingToken,
    #[error("session is invalid or expired")]
    InvalidSession,
    #[error("auth provider request failed")]
    Upstream(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for AuthSessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthSessionError::MissingToken => StatusCode::BAD_REQUEST,
            AuthSessionError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthSessionError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AuthSessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Tokens accepted from the client once the auth service vouched for them.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    pub user: AuthProviderUser,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: CurrentUserDto,
    pub profile: ProfileDto,
}

pub struct AuthSessionUseCase<A, P>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    auth_provider: Arc<A>,
    profile_repo: Arc<P>,
    free_limit: i32,
}

impl<A, P> AuthSessionUseCase<A, P>
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(auth_provider: Arc<A>, profile_repo: Arc<P>, free_limit: i32) -> Self {
        Self {
            auth_provider,
            profile_repo,
            free_limit,
        }
    }

    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<VerifiedSession, AuthSessionError> {
        let access_token = request.access_token.trim().to_string();
        if access_token.is_empty() {
            return Err(AuthSessionError::MissingToken);
        }

        let user = self
            .auth_provider
            .get_user(access_token.clone())
            .await
            .map_err(|err| {
                error!(error = ?err, "auth_session: auth provider lookup failed");
                AuthSessionError::Upstream(err)
            })?
            .ok_or_else(|| {
                info!("auth_session: token rejected by auth provider");
                AuthSessionError::InvalidSession
            })?;

        info!(user_id = %user.id, "auth_session: session established");
        Ok(VerifiedSession {
            user,
            access_token,
            refresh_token: request
                .refresh_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }

    /// Revokes the session upstream when possible. Cookie removal happens
    /// regardless, so failures are only logged.
    pub async fn sign_out(&self, access_token: Option<String>) {
        let Some(access_token) = access_token else {
            return;
        };
        if let Err(err) = self.auth_provider.sign_out(access_token).await {
            warn!(error = ?err, "auth_session: upstream sign out failed");
        }
    }

    pub async fn me(&self, user_id: Uuid, email: Option<String>) -> Result<MeResponse, AuthSessionError> {
        let profile = self.profile_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "auth_session: failed to load profile");
            AuthSessionError::Internal(err)
        })?;

        Ok(MeResponse {
            user: CurrentUserDto { id: user_id, email },
            profile: ProfileDto::from_entity(user_id, profile, self.free_limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::{
        auth_provider::MockAuthProvider, profiles::MockProfileRepository,
    };
    use mockall::predicate::eq;

    fn usecase(auth_provider: MockAuthProvider) -> AuthSessionUseCase<MockAuthProvider, MockProfileRepository> {
        AuthSessionUseCase::new(
            Arc::new(auth_provider),
            Arc::new(MockProfileRepository::new()),
            3,
        )
    }

    #[tokio::test]
    async fn verified_token_becomes_session() {
        let user_id = Uuid::new_v4();
        let mut auth_provider = MockAuthProvider::new();
        auth_provider
            .expect_get_user()
            .with(eq("access-123".to_string()))
            .returning(move |_| {
                Box::pin(async move {
                    Ok(Some(AuthProviderUser {
                        id: user_id,
                        email: Some("creator@example.com".to_string()),
                    }))
                })
            });

        let session = usecase(auth_provider)
            .create_session(CreateSessionRequest {
                access_token: " access-123 ".to_string(),
                refresh_token: Some("refresh-456".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, user_id);
        assert_eq!(session.access_token, "access-123");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-456"));
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let mut auth_provider = MockAuthProvider::new();
        auth_provider
            .expect_get_user()
            .returning(|_| Box::pin(async move { Ok(None) }));

        let err = usecase(auth_provider)
            .create_session(CreateSessionRequest {
                access_token: "expired".to_string(),
                refresh_token: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_token_is_bad_request() {
        let mut auth_provider = MockAuthProvider::new();
        auth_provider.expect_get_user().never();

        let err = usecase(auth_provider)
            .create_session(CreateSessionRequest {
                access_token: "  ".to_string(),
                refresh_token: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_out_swallows_upstream_errors() {
        let mut auth_provider = MockAuthProvider::new();
        auth_provider
            .expect_sign_out()
            .times(1)
            .returning(|_| Box::pin(async move { Err(anyhow::anyhow!("timeout")) }));

        usecase(auth_provider).sign_out(Some("token".to_string())).await;
    }
}
