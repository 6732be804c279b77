use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::profiles::{ProfileEntity, UpdateProfileBillingEntity};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>>;

    async fn find_by_stripe_customer_id(
        &self,
        stripe_customer_id: String,
    ) -> Result<Option<ProfileEntity>>;

    /// Creates the row when missing, then applies the non-empty fields.
    async fn apply_billing_update(
        &self,
        user_id: Uuid,
        update: UpdateProfileBillingEntity,
    ) -> Result<()>;

    /// Atomically adds one to `generations_used` and returns the new value.
    async fn increment_generations_used(&self, user_id: Uuid) -> Result<i32>;
}
