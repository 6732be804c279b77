use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub app: App,
    pub database: Database,
    pub supabase: Supabase,
    pub storage: Storage,
    pub stripe: Stripe,
    pub openai: OpenAi,
    pub site_lock: SiteLock,
    pub usage: Usage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Storage {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub price_pro: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct OpenAi {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Default)]
pub struct SiteLock {
    /// `None` disables the lock.
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub free_generation_limit: i32,
}
