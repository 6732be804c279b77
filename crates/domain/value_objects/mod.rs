pub mod auth;
pub mod enums;
pub mod generation;
pub mod jobs;
pub mod profiles;
pub mod waitlist;
