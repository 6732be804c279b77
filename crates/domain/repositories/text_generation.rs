use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::generation::ChatPrompt;

#[async_trait]
#[automock]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String>;
}
