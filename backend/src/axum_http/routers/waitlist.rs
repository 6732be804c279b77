use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use crates::{
    domain::{
        repositories::waitlist::WaitlistRepository,
        value_objects::waitlist::JoinWaitlistRequest,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::waitlist::WaitlistPostgres,
    },
};

use crate::{axum_http::error_responses::AppError, usecases::waitlist::WaitlistUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let waitlist_repository = WaitlistPostgres::new(Arc::clone(&db_pool));
    let usecase = WaitlistUseCase::new(Arc::new(waitlist_repository));

    Router::new()
        .route("/", post(join_waitlist))
        .with_state(Arc::new(usecase))
}

pub async fn join_waitlist<W>(
    State(usecase): State<Arc<WaitlistUseCase<W>>>,
    Json(request): Json<JoinWaitlistRequest>,
) -> impl IntoResponse
where
    W: WaitlistRepository + Send + Sync + 'static,
{
    match usecase.join(request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
