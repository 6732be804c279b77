use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::job_statuses::JobStatus,
    infra::db::postgres::schema::jobs,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = jobs)]
pub struct JobEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub prompt: String,
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub result_text: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = jobs)]
pub struct InsertJobEntity {
    pub user_id: Uuid,
    pub status: String,
    pub prompt: String,
    pub input_path: Option<String>,
}

/// Column values written together with a status change.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = jobs)]
pub struct JobTransitionEntity {
    pub status: String,
    pub output_path: Option<String>,
    pub result_text: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobTransitionEntity {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing.to_string(),
            output_path: None,
            result_text: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn done(result_text: String, output_path: String) -> Self {
        Self {
            status: JobStatus::Done.to_string(),
            output_path: Some(output_path),
            result_text: Some(result_text),
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: JobStatus::Error.to_string(),
            output_path: None,
            result_text: None,
            error: Some(error),
            updated_at: Utc::now(),
        }
    }

    pub fn target_status(&self) -> Option<JobStatus> {
        JobStatus::from_str(&self.status)
    }
}
