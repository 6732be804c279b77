pub mod auth_session;
pub mod billing;
pub mod generation;
pub mod jobs;
pub mod profile;
pub mod site_lock;
pub mod uploads;
pub mod usage_guard;
pub mod waitlist;
