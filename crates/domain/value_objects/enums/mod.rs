pub mod job_statuses;
pub mod subscription_statuses;
