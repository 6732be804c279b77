use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::jobs::JobEntity, value_objects::enums::job_statuses::JobStatus,
};

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    pub input_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobDto {
    pub id: Uuid,
    pub status: String,
    pub prompt: String,
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub result_text: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobEntity> for JobDto {
    fn from(value: JobEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            prompt: value.prompt,
            input_path: value.input_path,
            output_path: value.output_path,
            result_text: value.result_text,
            error: value.error,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl JobDto {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_str(&self.status)
    }
}
