use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use cookie::time::Duration;
use crates::{
    domain::{
        repositories::{auth_provider::AuthProvider, profiles::ProfileRepository},
        value_objects::auth::{CreateSessionRequest, CurrentUserDto},
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
        },
        supabase::auth_client::SupabaseAuthClient,
    },
};
use serde_json::json;
use tracing::info;

use crate::{
    auth::{ACCESS_TOKEN_COOKIE, AuthUser, REFRESH_TOKEN_COOKIE, extract_access_token},
    axum_http::{
        cookies::{CookiePolicy, SESSION_MAX_AGE_DAYS},
        error_responses::AppError,
    },
    usecases::auth_session::AuthSessionUseCase,
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    auth_client: Arc<SupabaseAuthClient>,
    free_generation_limit: i32,
) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let usecase = AuthSessionUseCase::new(
        auth_client,
        Arc::new(profile_repository),
        free_generation_limit,
    );

    router(usecase)
}

pub fn router<A, P>(usecase: AuthSessionUseCase<A, P>) -> Router
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/session", post(create_session::<A, P>))
        .route("/signout", post(sign_out::<A, P>))
        .route("/me", get(me::<A, P>))
        .with_state(Arc::new(usecase))
}

/// Trades a client-side Supabase session for HTTP-only cookies.
pub async fn create_session<A, P>(
    State(usecase): State<Arc<AuthSessionUseCase<A, P>>>,
    Extension(cookie_policy): Extension<CookiePolicy>,
    jar: CookieJar,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    let session = match usecase.create_session(request).await {
        Ok(session) => session,
        Err(err) => return AppError::from(err).into_response(),
    };

    let max_age = Duration::days(SESSION_MAX_AGE_DAYS);
    let mut jar = cookie_policy.set(jar, ACCESS_TOKEN_COOKIE, session.access_token, max_age);
    if let Some(refresh_token) = session.refresh_token {
        jar = cookie_policy.set(jar, REFRESH_TOKEN_COOKIE, refresh_token, max_age);
    }

    let user = CurrentUserDto {
        id: session.user.id,
        email: session.user.email,
    };
    (jar, Json(json!({ "user": user }))).into_response()
}

pub async fn sign_out<A, P>(
    State(usecase): State<Arc<AuthSessionUseCase<A, P>>>,
    Extension(cookie_policy): Extension<CookiePolicy>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    usecase.sign_out(extract_access_token(&headers)).await;
    info!("auth_session: signed out");

    let jar = cookie_policy.clear(jar, ACCESS_TOKEN_COOKIE);
    let jar = cookie_policy.clear(jar, REFRESH_TOKEN_COOKIE);
    (jar, Json(json!({ "ok": true })))
}

pub async fn me<A, P>(
    State(usecase): State<Arc<AuthSessionUseCase<A, P>>>,
    AuthUser { user_id, email, .. }: AuthUser,
) -> impl IntoResponse
where
    A: AuthProvider + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
{
    match usecase.me(user_id, email).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
