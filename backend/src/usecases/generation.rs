use std::sync::Arc;

use axum::http::StatusCode;
use crates::{
    domain::{
        repositories::{profiles::ProfileRepository, text_generation::TextGenerator},
        value_objects::generation::{GenerateClipIdeasRequest, GenerateClipIdeasResponse},
    },
    llm::prompts,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::usage_guard::{UsageError, UsageGuard};
use crate::axum_http::error_responses::HttpError;

pub const MAX_PROMPT_CHARS: usize = 4000;
pub const DEFAULT_IDEA_COUNT: usize = 5;
pub const MAX_IDEA_COUNT: usize = 10;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt must be at most 4000 characters")]
    PromptTooLong,
    #[error("count must be between 1 and 10")]
    InvalidCount,
    #[error("text generation failed")]
    Upstream(#[source] anyhow::Error),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl HttpError for GenerationError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::EmptyPrompt
            | GenerationError::PromptTooLong
            | GenerationError::InvalidCount => StatusCode::BAD_REQUEST,
            GenerationError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GenerationError::Usage(err) => err.status_code(),
        }
    }
}

pub struct GenerationUseCase<P, T>
where
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    usage_guard: UsageGuard<P>,
    text_generator: Arc<T>,
}

impl<P, T> GenerationUseCase<P, T>
where
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
{
    pub fn new(usage_guard: UsageGuard<P>, text_generator: Arc<T>) -> Self {
        Self {
            usage_guard,
            text_generator,
        }
    }

    pub async fn generate_clip_ideas(
        &self,
        user_id: Uuid,
        request: GenerateClipIdeasRequest,
    ) -> Result<GenerateClipIdeasResponse, GenerationError> {
        let topic = request.prompt.trim();
        if topic.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if topic.chars().count() > MAX_PROMPT_CHARS {
            return Err(GenerationError::PromptTooLong);
        }
        let count = request.count.unwrap_or(DEFAULT_IDEA_COUNT);
        if !(1..=MAX_IDEA_COUNT).contains(&count) {
            return Err(GenerationError::InvalidCount);
        }

        let snapshot = self.usage_guard.ensure_can_generate(user_id).await?;

        info!(%user_id, count, "generation: requesting clip ideas");
        let completion = self
            .text_generator
            .complete(prompts::clip_ideas(topic, count))
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "generation: llm call failed");
                GenerationError::Upstream(err)
            })?;

        let ideas = prompts::parse_ideas(&completion, count);
        if ideas.is_empty() {
            warn!(%user_id, "generation: completion contained no ideas");
            return Err(GenerationError::Upstream(anyhow::anyhow!(
                "completion contained no ideas"
            )));
        }

        let generations_used = self.usage_guard.record_generation(user_id).await?;

        Ok(GenerateClipIdeasResponse {
            ideas,
            generations_used,
            remaining: self.usage_guard.remaining(snapshot, generations_used),
        })
    }
}
