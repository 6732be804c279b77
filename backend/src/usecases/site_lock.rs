use axum::http::StatusCode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

use crate::axum_http::error_responses::HttpError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SiteLockError {
    #[error("wrong password")]
    WrongPassword,
}

impl HttpError for SiteLockError {
    fn status_code(&self) -> StatusCode {
        match self {
            SiteLockError::WrongPassword => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    /// No password configured, nothing to unlock.
    LockDisabled,
}

/// Password gate for pre-launch deployments.
pub struct SiteLockUseCase {
    password_tag: Option<Vec<u8>>,
}

impl SiteLockUseCase {
    pub fn new(password: Option<String>) -> Self {
        let password_tag = password
            .filter(|p| !p.is_empty())
            .map(|p| tag(p.as_bytes()).finalize().into_bytes().to_vec());
        Self { password_tag }
    }

    pub fn is_enabled(&self) -> bool {
        self.password_tag.is_some()
    }

    pub fn unlock(&self, candidate: &str) -> Result<UnlockOutcome, SiteLockError> {
        let Some(expected) = self.password_tag.as_deref() else {
            return Ok(UnlockOutcome::LockDisabled);
        };

        // Both sides are hashed first so neither length nor prefix leaks through timing.
        if tag(candidate.as_bytes()).verify_slice(expected).is_ok() {
            info!("site_lock: unlocked");
            Ok(UnlockOutcome::Unlocked)
        } else {
            warn!("site_lock: wrong password");
            Err(SiteLockError::WrongPassword)
        }
    }

    /// Whether a request carrying `unlocked_cookie` may pass the gate.
    pub fn allows(&self, unlocked_cookie: Option<&str>) -> bool {
        !self.is_enabled() || unlocked_cookie == Some("true")
    }
}

fn tag(input: &[u8]) -> HmacSha256 {
    // Zero key: the MAC only serves as a fixed-length digest for comparison.
    let mut mac = <HmacSha256 as Mac>::new(&Default::default());
    mac.update(input);
    mac
}
