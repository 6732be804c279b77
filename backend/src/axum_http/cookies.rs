use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;

pub const SITE_UNLOCKED_COOKIE: &str = "site_unlocked";
pub const SITE_UNLOCKED_MAX_AGE_DAYS: i64 = 30;
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Cookie attributes that depend on the deployment stage.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn set(&self, jar: CookieJar, name: &'static str, value: String, max_age: Duration) -> CookieJar {
        jar.add(
            Cookie::build((name, value))
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure)
                .path("/")
                .max_age(max_age),
        )
    }

    /// Overwrites `name` with an already-expired empty cookie.
    pub fn clear(&self, jar: CookieJar, name: &'static str) -> CookieJar {
        self.set(jar, name, String::new(), Duration::ZERO)
    }
}
