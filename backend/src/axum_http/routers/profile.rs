use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use crates::{
    domain::repositories::profiles::ProfileRepository,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
    },
};

use crate::{auth::AuthUser, axum_http::error_responses::AppError, usecases::profile::ProfileUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>, free_generation_limit: i32) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let usecase = ProfileUseCase::new(Arc::new(profile_repository), free_generation_limit);

    Router::new()
        .route("/", get(get_profile))
        .with_state(Arc::new(usecase))
}

pub async fn get_profile<P>(
    State(usecase): State<Arc<ProfileUseCase<P>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    P: ProfileRepository + Send + Sync + 'static,
{
    match usecase.get_profile(user_id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
