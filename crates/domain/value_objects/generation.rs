use serde::{Deserialize, Serialize};

/// A system/user message pair sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateClipIdeasRequest {
    pub prompt: String,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateClipIdeasResponse {
    pub ideas: Vec<String>,
    pub generations_used: i32,
    pub remaining: Option<i32>,
}
