use anyhow::Result;
use backend::axum_http::http_serve::{self, ExternalClients};
use backend::config::{config_loader, config_model::DotEnvyConfig};
use crates::infra::{
    db::postgres::postgres_connection,
    storages::supabase_storage::{SupabaseStorageClient, SupabaseStorageConfig},
    supabase::auth_client::SupabaseAuthClient,
};
use crates::llm::openai_client::{OpenAiClient, OpenAiConfig};
use crates::payments::stripe_client::StripeClient;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {:?}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let clients = build_clients(&dotenvy_env).await?;
    info!("External clients are ready");

    http_serve::start(Arc::new(dotenvy_env), Arc::new(postgres_pool), clients).await?;

    Ok(())
}

async fn build_clients(config: &DotEnvyConfig) -> Result<ExternalClients> {
    let stripe = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
        config.app.base_url.clone(),
    )?;

    let openai = OpenAiClient::new(OpenAiConfig {
        api_key: config.openai.api_key.clone(),
        base_url: config.openai.base_url.clone(),
        model: config.openai.model.clone(),
    })?;

    let storage = SupabaseStorageClient::new(SupabaseStorageConfig {
        endpoint: config.storage.endpoint.clone(),
        region: config.storage.region.clone(),
        bucket: config.storage.bucket.clone(),
        access_key: config.storage.access_key_id.clone(),
        secret_key: config.storage.secret_access_key.clone(),
    })
    .await?;

    let auth = SupabaseAuthClient::new(
        config.supabase.project_url.clone(),
        config.supabase.anon_key.clone(),
    )?;

    Ok(ExternalClients {
        stripe: Arc::new(stripe),
        openai: Arc::new(openai),
        storage: Arc::new(storage),
        auth: Arc::new(auth),
    })
}
