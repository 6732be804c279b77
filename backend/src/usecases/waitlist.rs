use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::waitlist::InsertWaitlistEntity,
    repositories::waitlist::WaitlistRepository,
    value_objects::waitlist::{JoinWaitlistRequest, JoinWaitlistResponse},
};
use thiserror::Error;
use tracing::{error, info};

use crate::axum_http::error_responses::HttpError;

const MAX_NAME_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for WaitlistError {
    fn status_code(&self) -> StatusCode {
        match self {
            WaitlistError::InvalidEmail => StatusCode::BAD_REQUEST,
            WaitlistError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct WaitlistUseCase<W>
where
    W: WaitlistRepository + Send + Sync + 'static,
{
    waitlist_repo: Arc<W>,
}

impl<W> WaitlistUseCase<W>
where
    W: WaitlistRepository + Send + Sync + 'static,
{
    pub fn new(waitlist_repo: Arc<W>) -> Self {
        Self { waitlist_repo }
    }

    pub async fn join(&self, request: JoinWaitlistRequest) -> Result<JoinWaitlistResponse, WaitlistError> {
        let email = normalize_email(&request.email).ok_or(WaitlistError::InvalidEmail)?;
        let name = request
            .name
            .map(|n| n.trim().chars().take(MAX_NAME_CHARS).collect::<String>())
            .filter(|n| !n.is_empty());

        let inserted = self
            .waitlist_repo
            .join_waitlist(InsertWaitlistEntity { email, name })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "waitlist: insert failed");
                WaitlistError::Internal(err)
            })?;

        info!(already_joined = !inserted, "waitlist: join processed");
        Ok(JoinWaitlistResponse {
            ok: true,
            already_joined: !inserted,
        })
    }
}

/// Trims and lower-cases; requires `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    valid.then_some(email)
}
