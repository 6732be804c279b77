use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User as reported by the hosted auth service for a given access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthProviderUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserDto {
    pub id: Uuid,
    pub email: Option<String>,
}
