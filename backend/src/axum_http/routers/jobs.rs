use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crates::{
    domain::{
        repositories::{
            jobs::JobRepository, profiles::ProfileRepository, storage::ObjectStorage,
            text_generation::TextGenerator,
        },
        value_objects::jobs::CreateJobRequest,
    },
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{jobs::JobPostgres, profiles::ProfilePostgres},
        },
        storages::supabase_storage::SupabaseStorageClient,
    },
    llm::openai_client::OpenAiClient,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{
        jobs::{JobError, JobsUseCase},
        usage_guard::{UsageError, UsageGuard},
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    text_generator: Arc<OpenAiClient>,
    storage: Arc<SupabaseStorageClient>,
    free_generation_limit: i32,
) -> Router {
    let job_repository = JobPostgres::new(Arc::clone(&db_pool));
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));

    let usecase = JobsUseCase::new(
        Arc::new(job_repository),
        UsageGuard::new(Arc::new(profile_repository), free_generation_limit),
        text_generator,
        storage,
    );

    router(usecase)
}

pub fn router<J, P, T, S>(usecase: JobsUseCase<J, P, T, S>) -> Router
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_jobs::<J, P, T, S>).post(create_job::<J, P, T, S>))
        .route("/:id", get(get_job::<J, P, T, S>).post(process_job::<J, P, T, S>))
        .with_state(Arc::new(usecase))
}

pub async fn list_jobs<J, P, T, S>(
    State(usecase): State<Arc<JobsUseCase<J, P, T, S>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    match usecase.list_jobs(user_id).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn create_job<J, P, T, S>(
    State(usecase): State<Arc<JobsUseCase<J, P, T, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<CreateJobRequest>,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    info!(%user_id, "jobs: create request received");
    match usecase.create_job(user_id, request).await {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(err) => {
            info!(%user_id, error = %err, "jobs: create rejected");
            AppError::from(err).into_response()
        }
    }
}

pub async fn get_job<J, P, T, S>(
    State(usecase): State<Arc<JobsUseCase<J, P, T, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    match usecase.get_job(user_id, job_id).await {
        Ok(job) => Json(job).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn process_job<J, P, T, S>(
    State(usecase): State<Arc<JobsUseCase<J, P, T, S>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(job_id): Path<Uuid>,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    info!(%user_id, %job_id, "jobs: process request received");
    match usecase.process_job(user_id, job_id).await {
        Ok(job) => Json(job).into_response(),
        Err(err) => {
            match &err {
                JobError::Conflict(status) => {
                    info!(%user_id, %job_id, %status, "jobs: process conflict")
                }
                JobError::Usage(UsageError::QuotaExceeded { .. }) => {
                    info!(%user_id, %job_id, "jobs: process over free limit")
                }
                _ => error!(%user_id, %job_id, error = ?err, "jobs: process failed"),
            }
            AppError::from(err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axum_http::routers::test_support::{bearer, body_json, with_extensions};
    use axum::{body::Body, http::Request};
    use crates::domain::repositories::{
        jobs::MockJobRepository, profiles::MockProfileRepository, storage::MockObjectStorage,
        text_generation::MockTextGenerator,
    };
    use tower::ServiceExt;

    fn app(job_repo: MockJobRepository) -> Router {
        let usecase = JobsUseCase::new(
            Arc::new(job_repo),
            UsageGuard::new(Arc::new(MockProfileRepository::new()), 3),
            Arc::new(MockTextGenerator::new()),
            Arc::new(MockObjectStorage::new()),
        );
        with_extensions(Router::new().nest("/api/jobs", router(usecase)))
    }

    #[tokio::test]
    async fn unauthenticated_requests_get_401() {
        let mut job_repo = MockJobRepository::new();
        job_repo.expect_find_job_for_user().never();
        job_repo.expect_list_jobs_for_user().never();
        let app = app(job_repo);

        let list = app
            .clone()
            .oneshot(Request::builder().uri("/api/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let single = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(list.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(single.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(single).await;
        assert_eq!(body["code"], 401);
    }

    #[tokio::test]
    async fn another_users_job_gets_404() {
        let caller_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_find_job_for_user()
            .withf(move |id, user_id| *id == job_id && *user_id == caller_id)
            .returning(|_, _| Box::pin(async move { Ok(None) }));

        let response = app(job_repo)
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}", job_id))
                    .header("authorization", bearer(caller_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "job not found");
    }

    #[tokio::test]
    async fn list_returns_callers_jobs() {
        let caller_id = Uuid::new_v4();
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_list_jobs_for_user()
            .withf(move |user_id, limit| *user_id == caller_id && *limit == 50)
            .returning(|_, _| Box::pin(async move { Ok(Vec::new()) }));

        let response = app(job_repo)
            .oneshot(
                Request::builder()
                    .uri("/api/jobs")
                    .header("authorization", bearer(caller_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
