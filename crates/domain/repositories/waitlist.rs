use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::waitlist::InsertWaitlistEntity;

#[async_trait]
#[automock]
pub trait WaitlistRepository {
    /// Returns `false` when the email was already on the list.
    async fn join_waitlist(&self, insert_waitlist_entity: InsertWaitlistEntity) -> Result<bool>;
}
