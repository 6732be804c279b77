use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{
    repositories::auth_provider::AuthProvider, value_objects::auth::AuthProviderUser,
};

/// Thin client for the Supabase GoTrue REST API.
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    project_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseAuthClient {
    pub fn new(project_url: String, anon_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build supabase auth http client")?;

        Ok(Self {
            http,
            project_url: project_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.project_url, path)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn get_user(&self, access_token: String) -> Result<Option<AuthProviderUser>> {
        // https://supabase.com/docs/reference/api/get-user
        let resp = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .context("supabase get user request failed")?;

        match resp.status() {
            status if status.is_success() => {
                let user: GoTrueUser = resp.json().await?;
                Ok(Some(AuthProviderUser {
                    id: user.id,
                    email: user.email,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(status = %resp.status(), "supabase_auth: access token rejected");
                Ok(None)
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                error!(
                    status = %status,
                    response_body = %body,
                    "supabase_auth: get user failed"
                );
                anyhow::bail!("Supabase auth request failed with status {}", status);
            }
        }
    }

    async fn sign_out(&self, access_token: String) -> Result<()> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .context("supabase logout request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Supabase logout failed with status {}", resp.status());
        }

        Ok(())
    }
}
