use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::jobs::{InsertJobEntity, JobEntity, JobTransitionEntity},
    value_objects::enums::job_statuses::JobStatus,
};

#[async_trait]
#[automock]
pub trait JobRepository {
    async fn create_job(&self, insert_job_entity: InsertJobEntity) -> Result<JobEntity>;

    async fn find_job_for_user(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobEntity>>;

    async fn list_jobs_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<JobEntity>>;

    /// Compare-and-swap on `status`: the row is only written while it is still
    /// in `from`. Returns `None` when another writer moved it first.
    async fn transition_job(
        &self,
        job_id: Uuid,
        from: JobStatus,
        transition: JobTransitionEntity,
    ) -> Result<Option<JobEntity>>;
}
