use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::auth::AuthProviderUser;

#[async_trait]
#[automock]
pub trait AuthProvider: Send + Sync {
    /// Resolves the user behind `access_token`; `None` when the hosted auth
    /// service rejects the token.
    async fn get_user(&self, access_token: String) -> Result<Option<AuthProviderUser>>;

    async fn sign_out(&self, access_token: String) -> Result<()>;
}
