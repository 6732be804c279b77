use anyhow::{Result, bail};
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::jobs},
};
use domain::{
    entities::jobs::{InsertJobEntity, JobEntity, JobTransitionEntity},
    repositories::jobs::JobRepository,
    value_objects::enums::job_statuses::JobStatus,
};

pub struct JobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl JobRepository for JobPostgres {
    async fn create_job(&self, insert_job_entity: InsertJobEntity) -> Result<JobEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(jobs::table)
            .values(&insert_job_entity)
            .returning(JobEntity::as_returning())
            .get_result::<JobEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_job_for_user(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = jobs::table
            .filter(jobs::id.eq(job_id))
            .filter(jobs::user_id.eq(user_id))
            .select(JobEntity::as_select())
            .first::<JobEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_jobs_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = jobs::table
            .filter(jobs::user_id.eq(user_id))
            .order(jobs::created_at.desc())
            .limit(limit)
            .select(JobEntity::as_select())
            .load::<JobEntity>(&mut conn)?;

        Ok(results)
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        from: JobStatus,
        transition: JobTransitionEntity,
    ) -> Result<Option<JobEntity>> {
        match transition.target_status() {
            Some(to) if from.can_transition_to(to) => {}
            _ => bail!(
                "illegal job transition {} -> {} for job {}",
                from,
                transition.status,
                job_id
            ),
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(
            jobs::table
                .filter(jobs::id.eq(job_id))
                .filter(jobs::status.eq(from.to_string())),
        )
        .set(&transition)
        .returning(JobEntity::as_returning())
        .get_result::<JobEntity>(&mut conn)
        .optional()?;

        Ok(result)
    }
}
