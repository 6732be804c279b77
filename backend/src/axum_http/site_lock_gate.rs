use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::{cookies::SITE_UNLOCKED_COOKIE, error_responses::AppError};
use crate::usecases::site_lock::SiteLockUseCase;

const EXEMPT_PREFIXES: [&str; 3] = ["/api/lock/", "/api/webhooks/", "/api/health-check"];

/// Rejects every non-exempt request without `site_unlocked=true` while the
/// lock is enabled.
pub async fn enforce(
    State(site_lock): State<Arc<SiteLockUseCase>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let unlocked = jar.get(SITE_UNLOCKED_COOKIE).map(|cookie| cookie.value());

    if is_exempt(path) || site_lock.allows(unlocked) {
        return next.run(request).await;
    }

    debug!(%path, "site_lock: request blocked");
    AppError::new(StatusCode::FORBIDDEN, "site is locked").into_response()
}

fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}
