pub mod auth_provider;
pub mod jobs;
pub mod profiles;
pub mod storage;
pub mod text_generation;
pub mod waitlist;
