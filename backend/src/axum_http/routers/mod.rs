pub mod auth_session;
pub mod billing;
pub mod generate;
pub mod jobs;
pub mod profile;
pub mod site_lock;
pub mod stripe_webhook;
pub mod uploads;
pub mod waitlist;

#[cfg(test)]
pub(crate) mod test_support;
