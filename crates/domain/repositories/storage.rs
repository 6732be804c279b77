use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[async_trait]
#[automock]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `object_key` and returns the stored path.
    async fn put_object(
        &self,
        object_key: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<String>;
}
