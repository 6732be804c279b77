use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use cookie::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    axum_http::{
        cookies::{CookiePolicy, SITE_UNLOCKED_COOKIE, SITE_UNLOCKED_MAX_AGE_DAYS},
        error_responses::AppError,
    },
    usecases::site_lock::{SiteLockUseCase, UnlockOutcome},
};

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LockStatusResponse {
    pub locked_site: bool,
    pub unlocked: bool,
}

pub fn routes(site_lock: Arc<SiteLockUseCase>) -> Router {
    Router::new()
        .route("/unlock", post(unlock))
        .route("/lock", post(lock))
        .route("/status", get(status))
        .with_state(site_lock)
}

pub async fn unlock(
    State(site_lock): State<Arc<SiteLockUseCase>>,
    Extension(cookie_policy): Extension<CookiePolicy>,
    jar: CookieJar,
    Json(request): Json<UnlockRequest>,
) -> impl IntoResponse {
    match site_lock.unlock(&request.password) {
        Ok(UnlockOutcome::Unlocked) => {
            let jar = cookie_policy.set(
                jar,
                SITE_UNLOCKED_COOKIE,
                "true".to_string(),
                Duration::days(SITE_UNLOCKED_MAX_AGE_DAYS),
            );
            (jar, Json(json!({ "ok": true }))).into_response()
        }
        Ok(UnlockOutcome::LockDisabled) => Json(json!({ "ok": true, "locked_site": false })).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn lock(
    Extension(cookie_policy): Extension<CookiePolicy>,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = cookie_policy.clear(jar, SITE_UNLOCKED_COOKIE);
    (jar, Json(json!({ "ok": true })))
}

pub async fn status(State(site_lock): State<Arc<SiteLockUseCase>>, jar: CookieJar) -> impl IntoResponse {
    let cookie = jar.get(SITE_UNLOCKED_COOKIE).map(|c| c.value());
    Json(LockStatusResponse {
        locked_site: site_lock.is_enabled(),
        unlocked: site_lock.allows(cookie),
    })
}
