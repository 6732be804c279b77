use std::str::FromStr;

use anyhow::{Context, Result};

use super::{
    config_model::{
        App, BackendServer, Database, DotEnvyConfig, OpenAi, SiteLock, Storage, Stripe, Supabase,
        Usage,
    },
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup so tests can avoid process env.
pub fn from_lookup<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let required = |key: &str| optional(key).with_context(|| format!("{key} is invalid"));

    let stage = match optional("STAGE") {
        Some(raw) => Stage::try_from(&raw)?,
        None => Stage::default(),
    };

    let backend_server = BackendServer {
        port: parse_or(optional("SERVER_PORT_BACKEND"), "SERVER_PORT_BACKEND", 8080)?,
        body_limit: parse_or(optional("SERVER_BODY_LIMIT"), "SERVER_BODY_LIMIT", 100)?,
        timeout: parse_or(optional("SERVER_TIMEOUT"), "SERVER_TIMEOUT", 60)?,
    };

    let base_url = optional("APP_BASE_URL")
        .unwrap_or_else(|| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string();

    let app = App {
        base_url: base_url.clone(),
        cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN"),
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let project_url = required("SUPABASE_PROJECT_URL")?
        .trim_end_matches('/')
        .to_string();

    let storage = Storage {
        endpoint: optional("SUPABASE_S3_ENDPOINT")
            .unwrap_or_else(|| format!("{}/storage/v1/s3", project_url)),
        region: required("SUPABASE_S3_REGION")?,
        bucket: optional("SUPABASE_UPLOAD_BUCKET").unwrap_or_else(|| "uploads".to_string()),
        access_key_id: required("SUPABASE_S3_ACCESS_KEY_ID")?,
        secret_access_key: required("SUPABASE_S3_SECRET_ACCESS_KEY")?,
    };

    let supabase = Supabase {
        project_url,
        anon_key: required("SUPABASE_ANON_KEY")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        price_pro: required("STRIPE_PRICE_PRO")?,
        success_url: optional("STRIPE_SUCCESS_URL")
            .unwrap_or_else(|| format!("{}/billing/success", base_url)),
        cancel_url: optional("STRIPE_CANCEL_URL")
            .unwrap_or_else(|| format!("{}/billing/cancel", base_url)),
    };

    let openai = OpenAi {
        api_key: required("OPENAI_API_KEY")?,
        base_url: optional("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        model: optional("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
    };

    let site_lock = SiteLock {
        password: optional("SITE_LOCK_PASSWORD"),
    };

    let usage = Usage {
        free_generation_limit: parse_or(
            optional("FREE_GENERATION_LIMIT"),
            "FREE_GENERATION_LIMIT",
            3,
        )?,
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        app,
        database,
        supabase,
        storage,
        stripe,
        openai,
        site_lock,
        usage,
    })
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
