use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use crates::{
    domain::{
        repositories::{profiles::ProfileRepository, text_generation::TextGenerator},
        value_objects::generation::GenerateClipIdeasRequest,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
    },
    llm::openai_client::OpenAiClient,
};
use tracing::info;

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::{generation::GenerationUseCase, usage_guard::UsageGuard},
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    text_generator: Arc<OpenAiClient>,
    free_generation_limit: i32,
) -> Router {
    let profile_repository = ProfilePostgres::new(Arc::clone(&db_pool));
    let usecase = GenerationUseCase::new(
        UsageGuard::new(Arc::new(profile_repository), free_generation_limit),
        text_generator,
    );

    router(usecase)
}

pub fn router<P, T>(usecase: GenerationUseCase<P, T>) -> Router
where
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(generate_clip_ideas::<P, T>))
        .with_state(Arc::new(usecase))
}

pub async fn generate_clip_ideas<P, T>(
    State(usecase): State<Arc<GenerationUseCase<P, T>>>,
    AuthUser { user_id, .. }: AuthUser,
    Json(request): Json<GenerateClipIdeasRequest>,
) -> impl IntoResponse
where
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    info!(%user_id, "generate: request received");
    match usecase.generate_clip_ideas(user_id, request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axum_http::routers::test_support::{bearer, body_json, with_extensions};
    use crate::usecases::usage_guard::tests::sample_profile;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use crates::domain::repositories::{
        profiles::MockProfileRepository, text_generation::MockTextGenerator,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn user_over_free_limit_gets_402_and_llm_is_not_called() {
        let user_id = Uuid::new_v4();
        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .returning(move |_| Box::pin(async move { Ok(Some(sample_profile(user_id, false, 3))) }));
        profile_repo.expect_increment_generations_used().never();
        let mut text_generator = MockTextGenerator::new();
        text_generator.expect_complete().never();

        let usecase = GenerationUseCase::new(
            UsageGuard::new(Arc::new(profile_repo), 3),
            Arc::new(text_generator),
        );
        let app = with_extensions(Router::new().nest("/api/generate", router(usecase)));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generate")
                    .header("authorization", bearer(user_id))
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"prompt":"espresso at home"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["code"], 402);
    }
}
