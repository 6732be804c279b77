use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct JoinWaitlistRequest {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct JoinWaitlistResponse {
    pub ok: bool,
    pub already_joined: bool,
}
