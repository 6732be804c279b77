use crate::{
    auth::JwtVerifier,
    axum_http::{cookies::CookiePolicy, default_routers, routers, site_lock_gate},
    config::config_model::DotEnvyConfig,
    usecases::site_lock::SiteLockUseCase,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use crates::{
    infra::{
        db::postgres::postgres_connection::PgPoolSquad,
        storages::supabase_storage::SupabaseStorageClient, supabase::auth_client::SupabaseAuthClient,
    },
    llm::openai_client::OpenAiClient,
    payments::stripe_client::StripeClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

/// Outbound clients shared by every request.
pub struct ExternalClients {
    pub stripe: Arc<StripeClient>,
    pub openai: Arc<OpenAiClient>,
    pub storage: Arc<SupabaseStorageClient>,
    pub auth: Arc<SupabaseAuthClient>,
}

pub fn build_router(
    config: &DotEnvyConfig,
    db_pool: Arc<PgPoolSquad>,
    clients: ExternalClients,
) -> Result<Router> {
    let free_limit = config.usage.free_generation_limit;
    let price_pro = config.stripe.price_pro.clone();
    let site_lock = Arc::new(SiteLockUseCase::new(config.site_lock.password.clone()));
    if site_lock.is_enabled() {
        info!("site lock is enabled");
    }

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/auth",
            routers::auth_session::routes(Arc::clone(&db_pool), clients.auth, free_limit),
        )
        .nest(
            "/api/profile",
            routers::profile::routes(Arc::clone(&db_pool), free_limit),
        )
        .nest(
            "/api/generate",
            routers::generate::routes(Arc::clone(&db_pool), Arc::clone(&clients.openai), free_limit),
        )
        .nest(
            "/api/uploads",
            routers::uploads::routes(Arc::clone(&clients.storage)),
        )
        .nest(
            "/api/jobs",
            routers::jobs::routes(
                Arc::clone(&db_pool),
                clients.openai,
                clients.storage,
                free_limit,
            ),
        )
        .nest("/api/lock", routers::site_lock::routes(Arc::clone(&site_lock)))
        .nest("/api/waitlist", routers::waitlist::routes(Arc::clone(&db_pool)))
        .nest(
            "/api/webhooks",
            routers::stripe_webhook::routes(
                Arc::clone(&db_pool),
                Arc::clone(&clients.stripe),
                price_pro.clone(),
            ),
        )
        .nest(
            "/api",
            routers::billing::routes(Arc::clone(&db_pool), clients.stripe, price_pro),
        )
        .route("/api/health-check", get(default_routers::health_check))
        .layer(middleware::from_fn_with_state(site_lock, site_lock_gate::enforce))
        .layer(Extension(Arc::new(JwtVerifier::new(
            config.supabase.jwt_secret.clone(),
        ))))
        .layer(Extension(CookiePolicy {
            secure: config.stage.secure_cookies(),
        }))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(cors_layer(config.app.cors_allowed_origin.as_deref())?)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Cookies only travel cross-origin when a concrete origin is configured.
fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match allowed_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS_ALLOWED_ORIGIN: {origin}"))?;
            Ok(cors.allow_origin(origin).allow_credentials(true))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

pub async fn start(
    config: Arc<DotEnvyConfig>,
    db_pool: Arc<PgPoolSquad>,
    clients: ExternalClients,
) -> Result<()> {
    let app = build_router(&config, db_pool, clients)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    // SIGTERM is how Docker/K8s/Fly stop the container.
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to install SIGTERM signal handler")?;
        async move {
            sigterm.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    info!(stage = %config.stage, "Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(terminate))
        .await?;

    Ok(())
}

async fn shutdown_signal(terminate: impl Future<Output = ()>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_origin_must_be_a_valid_header() {
        assert!(cors_layer(Some("https://app.example.com")).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
        assert!(cors_layer(None).is_ok());
    }

    #[tokio::test]
    async fn terminate_signal_ends_shutdown_wait() {
        let wait = shutdown_signal(async {});

        tokio::time::timeout(Duration::from_secs(1), wait)
            .await
            .unwrap();
    }
}
