use std::sync::Arc;

use axum::http::StatusCode;
use crates::{
    domain::{
        entities::jobs::{InsertJobEntity, JobEntity, JobTransitionEntity},
        repositories::{
            jobs::JobRepository, profiles::ProfileRepository, storage::ObjectStorage,
            text_generation::TextGenerator,
        },
        value_objects::{
            enums::job_statuses::JobStatus,
            jobs::{CreateJobRequest, JobDto},
        },
    },
    llm::prompts,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::usage_guard::{UsageError, UsageGuard};
use crate::axum_http::error_responses::HttpError;

pub const JOB_LIST_LIMIT: i64 = 50;
const MAX_JOB_PROMPT_CHARS: usize = 4000;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt must be at most 4000 characters")]
    PromptTooLong,
    #[error("input_path must point to one of your uploads")]
    ForeignInputPath,
    #[error("job not found")]
    NotFound,
    #[error("job is {0}")]
    Conflict(JobStatus),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HttpError for JobError {
    fn status_code(&self) -> StatusCode {
        match self {
            JobError::EmptyPrompt | JobError::PromptTooLong | JobError::ForeignInputPath => {
                StatusCode::BAD_REQUEST
            }
            JobError::NotFound => StatusCode::NOT_FOUND,
            JobError::Conflict(_) => StatusCode::CONFLICT,
            JobError::Usage(err) => err.status_code(),
            JobError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, JobError>;

pub struct JobsUseCase<J, P, T, S>
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    usage_guard: UsageGuard<P>,
    text_generator: Arc<T>,
    storage: Arc<S>,
}

impl<J, P, T, S> JobsUseCase<J, P, T, S>
where
    J: JobRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    T: TextGenerator + Send + Sync + 'static,
    S: ObjectStorage + Send + Sync + 'static,
{
    pub fn new(
        job_repo: Arc<J>,
        usage_guard: UsageGuard<P>,
        text_generator: Arc<T>,
        storage: Arc<S>,
    ) -> Self {
        Self {
            job_repo,
            usage_guard,
            text_generator,
            storage,
        }
    }

    pub async fn create_job(&self, user_id: Uuid, request: CreateJobRequest) -> UseCaseResult<JobDto> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(JobError::EmptyPrompt);
        }
        if prompt.chars().count() > MAX_JOB_PROMPT_CHARS {
            return Err(JobError::PromptTooLong);
        }

        let input_path = request
            .input_path
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());
        if let Some(path) = input_path.as_deref() {
            if !is_owned_path(user_id, path) {
                warn!(%user_id, input_path = %path, "jobs: rejected foreign input path");
                return Err(JobError::ForeignInputPath);
            }
        }

        self.usage_guard.ensure_can_generate(user_id).await?;

        let job = self
            .job_repo
            .create_job(InsertJobEntity {
                user_id,
                status: JobStatus::Queued.to_string(),
                prompt: prompt.to_string(),
                input_path,
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "jobs: failed to insert job");
                JobError::Internal(err)
            })?;

        info!(%user_id, job_id = %job.id, "jobs: job queued");
        Ok(JobDto::from(job))
    }

    pub async fn list_jobs(&self, user_id: Uuid) -> UseCaseResult<Vec<JobDto>> {
        let jobs = self
            .job_repo
            .list_jobs_for_user(user_id, JOB_LIST_LIMIT)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "jobs: failed to list jobs");
                JobError::Internal(err)
            })?;
        Ok(jobs.into_iter().map(JobDto::from).collect())
    }

    pub async fn get_job(&self, user_id: Uuid, job_id: Uuid) -> UseCaseResult<JobDto> {
        self.load_owned(user_id, job_id).await.map(JobDto::from)
    }

    /// Advances a queued job to completion inside the calling request.
    /// Only the request that wins the `queued -> processing` claim does the work.
    pub async fn process_job(&self, user_id: Uuid, job_id: Uuid) -> UseCaseResult<JobDto> {
        let job = self.load_owned(user_id, job_id).await?;
        let status = parse_status(&job)?;

        if status.is_terminal() {
            return Ok(JobDto::from(job));
        }
        if status == JobStatus::Processing {
            return Err(JobError::Conflict(JobStatus::Processing));
        }

        // Queued jobs are metered again here; creation alone does not consume quota.
        self.usage_guard.ensure_can_generate(user_id).await?;

        let Some(claimed) = self
            .transition(job_id, JobStatus::Queued, JobTransitionEntity::processing())
            .await?
        else {
            let current = self.load_owned(user_id, job_id).await?;
            let current_status = parse_status(&current)?;
            info!(%user_id, %job_id, status = %current_status, "jobs: claim lost");
            return Err(JobError::Conflict(current_status));
        };
        info!(%user_id, %job_id, "jobs: job claimed");

        let outcome = match self.run(user_id, &claimed).await {
            Ok((result_text, output_path)) => {
                info!(%user_id, %job_id, %output_path, "jobs: job finished");
                JobTransitionEntity::done(result_text, output_path)
            }
            Err(err) => {
                error!(%user_id, %job_id, error = ?err, "jobs: job failed");
                JobTransitionEntity::failed(err.to_string())
            }
        };
        let succeeded = outcome.target_status() == Some(JobStatus::Done);

        let finished = self
            .transition(job_id, JobStatus::Processing, outcome)
            .await?
            .ok_or_else(|| {
                error!(%user_id, %job_id, "jobs: job left processing while owned");
                JobError::Internal(anyhow::anyhow!("job {} left processing unexpectedly", job_id))
            })?;

        if succeeded {
            if let Err(err) = self.usage_guard.record_generation(user_id).await {
                // The output is already stored; a missed count is not worth failing the job.
                warn!(%user_id, %job_id, error = ?err, "jobs: usage not recorded");
            }
        }

        Ok(JobDto::from(finished))
    }

    async fn run(&self, user_id: Uuid, job: &JobEntity) -> anyhow::Result<(String, String)> {
        let result_text = self
            .text_generator
            .complete(prompts::captions(&job.prompt, job.input_path.as_deref()))
            .await?;

        let output_path = self
            .storage
            .put_object(
                format!("{}/outputs/{}.txt", user_id, job.id),
                result_text.clone().into_bytes(),
                "text/plain; charset=utf-8".to_string(),
            )
            .await?;

        Ok((result_text, output_path))
    }

    async fn load_owned(&self, user_id: Uuid, job_id: Uuid) -> UseCaseResult<JobEntity> {
        self.job_repo
            .find_job_for_user(job_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %job_id, db_error = ?err, "jobs: failed to load job");
                JobError::Internal(err)
            })?
            .ok_or(JobError::NotFound)
    }

    async fn transition(
        &self,
        job_id: Uuid,
        from: JobStatus,
        transition: JobTransitionEntity,
    ) -> UseCaseResult<Option<JobEntity>> {
        self.job_repo
            .transition_job(job_id, from, transition)
            .await
            .map_err(|err| {
                error!(%job_id, %from, db_error = ?err, "jobs: transition failed");
                JobError::Internal(err)
            })
    }
}

fn parse_status(job: &JobEntity) -> UseCaseResult<JobStatus> {
    JobStatus::from_str(&job.status).ok_or_else(|| {
        error!(job_id = %job.id, status = %job.status, "jobs: unknown status in database");
        JobError::Internal(anyhow::anyhow!("unknown job status {}", job.status))
    })
}

/// Uploads live under `{user_id}/`; anything else belongs to someone else.
fn is_owned_path(user_id: Uuid, path: &str) -> bool {
    let prefix = format!("{}/", user_id);
    path.starts_with(&prefix) && path.len() > prefix.len() && !path.split('/').any(|s| s == "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::usage_guard::tests::sample_profile;
    use chrono::Utc;
    use crates::domain::repositories::{
        jobs::MockJobRepository, profiles::MockProfileRepository, storage::MockObjectStorage,
        text_generation::MockTextGenerator,
    };
    use mockall::predicate::eq;

    fn sample_job(id: Uuid, user_id: Uuid, status: JobStatus) -> JobEntity {
        let now = Utc::now();
        JobEntity {
            id,
            user_id,
            status: status.to_string(),
            prompt: "Launch teaser for the new mug".to_string(),
            input_path: Some(format!("{}/clip.mp4", user_id)),
            output_path: None,
            result_text: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        job_repo: MockJobRepository,
        profile_repo: MockProfileRepository,
        text_generator: MockTextGenerator,
        storage: MockObjectStorage,
    ) -> JobsUseCase<MockJobRepository, MockProfileRepository, MockTextGenerator, MockObjectStorage>
    {
        JobsUseCase::new(
            Arc::new(job_repo),
            UsageGuard::new(Arc::new(profile_repo), 3),
            Arc::new(text_generator),
            Arc::new(storage),
        )
    }

    fn expect_find(job_repo: &mut MockJobRepository, job: Option<JobEntity>) {
        job_repo.expect_find_job_for_user().returning(move |_, _| {
            let job = job.clone();
            Box::pin(async move { Ok(job) })
        });
    }

    fn expect_profile(profile_repo: &mut MockProfileRepository, user_id: Uuid, generations_used: i32) {
        profile_repo.expect_find_by_id().returning(move |_| {
            Box::pin(async move { Ok(Some(sample_profile(user_id, false, generations_used))) })
        });
    }

    #[tokio::test]
    async fn another_users_job_is_not_found() {
        let owner_id = Uuid::new_v4();
        let caller_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_find_job_for_user()
            .with(eq(job_id), eq(caller_id))
            .returning(|_, _| Box::pin(async move { Ok(None) }));

        let usecase = usecase(
            job_repo,
            MockProfileRepository::new(),
            MockTextGenerator::new(),
            MockObjectStorage::new(),
        );

        let err = usecase.get_job(caller_id, job_id).await.unwrap_err();

        assert!(matches!(err, JobError::NotFound));
        assert_ne!(owner_id, caller_id);
    }

    #[tokio::test]
    async fn create_rejects_input_path_outside_user_prefix() {
        let user_id = Uuid::new_v4();
        let mut job_repo = MockJobRepository::new();
        job_repo.expect_create_job().never();

        let usecase = usecase(
            job_repo,
            MockProfileRepository::new(),
            MockTextGenerator::new(),
            MockObjectStorage::new(),
        );

        let foreign = usecase
            .create_job(
                user_id,
                CreateJobRequest {
                    prompt: "captions".to_string(),
                    input_path: Some(format!("{}/clip.mp4", Uuid::new_v4())),
                },
            )
            .await;
        let traversal = usecase
            .create_job(
                user_id,
                CreateJobRequest {
                    prompt: "captions".to_string(),
                    input_path: Some(format!("{}/../other/clip.mp4", user_id)),
                },
            )
            .await;

        assert!(matches!(foreign, Err(JobError::ForeignInputPath)));
        assert!(matches!(traversal, Err(JobError::ForeignInputPath)));
    }

    #[tokio::test]
    async fn create_inserts_queued_job() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut profile_repo = MockProfileRepository::new();
        profile_repo
            .expect_find_by_id()
            .returning(move |_| Box::pin(async move { Ok(Some(sample_profile(user_id, false, 0))) }));

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_create_job()
            .withf(move |insert| {
                insert.user_id == user_id
                    && insert.status == "queued"
                    && insert.prompt == "captions please"
                    && insert.input_path == Some(format!("{}/clip.mp4", user_id))
            })
            .returning(move |_| {
                Box::pin(async move { Ok(sample_job(job_id, user_id, JobStatus::Queued)) })
            });

        let usecase = usecase(
            job_repo,
            profile_repo,
            MockTextGenerator::new(),
            MockObjectStorage::new(),
        );

        let job = usecase
            .create_job(
                user_id,
                CreateJobRequest {
                    prompt: "  captions please ".to_string(),
                    input_path: Some(format!("{}/clip.mp4", user_id)),
                },
            )
            .await
            .unwrap();

        assert_eq!(job.id, job_id);
        assert_eq!(job.status(), Some(JobStatus::Queued));
    }

    #[tokio::test]
    async fn process_runs_queued_job_to_done() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let output_key = format!("{}/outputs/{}.txt", user_id, job_id);

        let mut job_repo = MockJobRepository::new();
        expect_find(&mut job_repo, Some(sample_job(job_id, user_id, JobStatus::Queued)));
        job_repo
            .expect_transition_job()
            .with(eq(job_id), eq(JobStatus::Queued), mockall::predicate::always())
            .times(1)
            .returning(move |_, _, _| {
                Box::pin(async move { Ok(Some(sample_job(job_id, user_id, JobStatus::Processing))) })
            });
        let stored_key = output_key.clone();
        job_repo
            .expect_transition_job()
            .withf(move |id, from, transition| {
                *id == job_id
                    && *from == JobStatus::Processing
                    && transition.target_status() == Some(JobStatus::Done)
                    && transition.output_path.as_deref() == Some(stored_key.as_str())
            })
            .times(1)
            .returning(move |_, _, transition| {
                let mut job = sample_job(job_id, user_id, JobStatus::Done);
                job.result_text = transition.result_text;
                job.output_path = transition.output_path;
                Box::pin(async move { Ok(Some(job)) })
            });

        let mut text_generator = MockTextGenerator::new();
        text_generator
            .expect_complete()
            .times(1)
            .returning(|_| Box::pin(async move { Ok("Caption one #mug #launch".to_string()) }));

        let mut storage = MockObjectStorage::new();
        let expected_key = output_key.clone();
        storage
            .expect_put_object()
            .withf(move |key, bytes, _| *key == expected_key && bytes.as_slice() == b"Caption one #mug #launch")
            .times(1)
            .returning(|key, _, _| Box::pin(async move { Ok(key) }));

        let mut profile_repo = MockProfileRepository::new();
        expect_profile(&mut profile_repo, user_id, 0);
        profile_repo
            .expect_increment_generations_used()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(1) }));

        let usecase = usecase(job_repo, profile_repo, text_generator, storage);

        let job = usecase.process_job(user_id, job_id).await.unwrap();

        assert_eq!(job.status(), Some(JobStatus::Done));
        assert_eq!(job.output_path.as_deref(), Some(output_key.as_str()));
        assert_eq!(job.result_text.as_deref(), Some("Caption one #mug #launch"));
    }

    #[tokio::test]
    async fn process_records_error_when_generation_fails() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        expect_find(&mut job_repo, Some(sample_job(job_id, user_id, JobStatus::Queued)));
        job_repo
            .expect_transition_job()
            .with(eq(job_id), eq(JobStatus::Queued), mockall::predicate::always())
            .returning(move |_, _, _| {
                Box::pin(async move { Ok(Some(sample_job(job_id, user_id, JobStatus::Processing))) })
            });
        job_repo
            .expect_transition_job()
            .withf(|_, from, transition| {
                *from == JobStatus::Processing
                    && transition.target_status() == Some(JobStatus::Error)
                    && transition.error.as_deref() == Some("model overloaded")
            })
            .returning(move |_, _, transition| {
                let mut job = sample_job(job_id, user_id, JobStatus::Error);
                job.error = transition.error;
                Box::pin(async move { Ok(Some(job)) })
            });

        let mut text_generator = MockTextGenerator::new();
        text_generator
            .expect_complete()
            .returning(|_| Box::pin(async move { Err(anyhow::anyhow!("model overloaded")) }));
        let mut storage = MockObjectStorage::new();
        storage.expect_put_object().never();
        let mut profile_repo = MockProfileRepository::new();
        expect_profile(&mut profile_repo, user_id, 1);
        profile_repo.expect_increment_generations_used().never();

        let usecase = usecase(job_repo, profile_repo, text_generator, storage);

        let job = usecase.process_job(user_id, job_id).await.unwrap();

        assert_eq!(job.status(), Some(JobStatus::Error));
        assert_eq!(job.error.as_deref(), Some("model overloaded"));
    }

    #[tokio::test]
    async fn lost_claim_is_a_conflict() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        let mut reads = 0;
        job_repo.expect_find_job_for_user().returning(move |_, _| {
            reads += 1;
            let status = if reads == 1 {
                JobStatus::Queued
            } else {
                JobStatus::Processing
            };
            Box::pin(async move { Ok(Some(sample_job(job_id, user_id, status))) })
        });
        job_repo
            .expect_transition_job()
            .times(1)
            .returning(|_, _, _| Box::pin(async move { Ok(None) }));

        let mut text_generator = MockTextGenerator::new();
        text_generator.expect_complete().never();
        let mut profile_repo = MockProfileRepository::new();
        expect_profile(&mut profile_repo, user_id, 0);

        let usecase = usecase(
            job_repo,
            profile_repo,
            text_generator,
            MockObjectStorage::new(),
        );

        let err = usecase.process_job(user_id, job_id).await.unwrap_err();

        assert!(matches!(err, JobError::Conflict(JobStatus::Processing)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn process_at_free_limit_is_rejected_before_any_work() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        expect_find(&mut job_repo, Some(sample_job(job_id, user_id, JobStatus::Queued)));
        job_repo.expect_transition_job().never();

        let mut profile_repo = MockProfileRepository::new();
        expect_profile(&mut profile_repo, user_id, 3);
        profile_repo.expect_increment_generations_used().never();

        let mut text_generator = MockTextGenerator::new();
        text_generator.expect_complete().never();
        let mut storage = MockObjectStorage::new();
        storage.expect_put_object().never();

        let usecase = usecase(job_repo, profile_repo, text_generator, storage);

        let err = usecase.process_job(user_id, job_id).await.unwrap_err();

        assert!(matches!(err, JobError::Usage(UsageError::QuotaExceeded { limit: 3 })));
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn processing_job_is_a_conflict_and_finished_job_is_returned() {
        let user_id = Uuid::new_v4();
        let processing_id = Uuid::new_v4();
        let done_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_find_job_for_user()
            .returning(move |job_id, _| {
                let status = if job_id == processing_id {
                    JobStatus::Processing
                } else {
                    JobStatus::Done
                };
                Box::pin(async move { Ok(Some(sample_job(job_id, user_id, status))) })
            });
        job_repo.expect_transition_job().never();

        let usecase = usecase(
            job_repo,
            MockProfileRepository::new(),
            MockTextGenerator::new(),
            MockObjectStorage::new(),
        );

        let in_flight = usecase.process_job(user_id, processing_id).await;
        let finished = usecase.process_job(user_id, done_id).await.unwrap();

        assert!(matches!(in_flight, Err(JobError::Conflict(JobStatus::Processing))));
        assert_eq!(finished.status(), Some(JobStatus::Done));
    }

    #[test]
    fn owned_path_requires_user_prefix() {
        let user_id = Uuid::new_v4();

        assert!(is_owned_path(user_id, &format!("{}/a.mp4", user_id)));
        assert!(!is_owned_path(user_id, &format!("{}/", user_id)));
        assert!(!is_owned_path(user_id, "a.mp4"));
        assert!(!is_owned_path(user_id, &format!("x{}/a.mp4", user_id)));
    }
}
