mod config;
mod discord;
mod layer;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use config::ObservabilitySettings;
use discord::DiscordWebhook;
use layer::AlertLayer;

/// Installs the global tracing subscriber for `component`.
///
/// `RUST_LOG` drives the console filter (default `info`). When
/// `DISCORD_WEBHOOK_URL` is set, events at `DISCORD_NOTIFY_LEVEL` (default
/// `ERROR`) and above are also posted to Discord with secret-looking fields
/// redacted.
pub fn init_observability(component: &str) -> Result<()> {
    let settings = ObservabilitySettings::from_env(component);

    let alert_layer = match settings.discord.as_ref() {
        Some(sink) => {
            let webhook = DiscordWebhook::new(sink.webhook_url.clone())?;
            Some(
                AlertLayer::spawn(webhook, settings.source.clone(), sink.min_level)
                    .with_filter(LevelFilter::from_level(sink.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so log timestamps follow TZ.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    for warning in &settings.warnings {
        warn!(
            service = %settings.source.service,
            stage = %settings.source.stage,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %settings.source.service,
        stage = %settings.source.stage,
        component = %settings.source.component,
        discord_alerts = settings.discord.is_some(),
        "observability: initialized"
    );

    Ok(())
}
