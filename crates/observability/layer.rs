use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::config::AlertSource;
use super::discord::DiscordWebhook;

const ALERT_QUEUE_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub(crate) struct AlertEvent {
    pub(crate) source: AlertSource,
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) target: String,
    pub(crate) file: Option<String>,
    pub(crate) line: Option<u32>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<String>,
}

/// Forwards events at or above `min_level` to Discord without blocking the caller.
pub(crate) struct AlertLayer {
    tx: mpsc::Sender<AlertEvent>,
    source: AlertSource,
    min_level: Level,
}

impl AlertLayer {
    /// Must be called inside a tokio runtime.
    pub(crate) fn spawn(webhook: DiscordWebhook, source: AlertSource, min_level: Level) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(ALERT_QUEUE_CAPACITY);
        let webhook = Arc::new(webhook);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = webhook.post(&event).await {
                    // eprintln, a tracing call here would feed back into this layer.
                    eprintln!("observability: discord alert failed: {err}");
                }
            }
        });

        Self {
            tx,
            source,
            min_level,
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering is inverted: ERROR is the "smallest".
        if *metadata.level() > self.min_level {
            return;
        }

        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);
        let message = visitor.fields.remove("message");

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let alert = AlertEvent {
            source: self.source.clone(),
            level: *metadata.level(),
            timestamp: Utc::now(),
            target: metadata.target().to_string(),
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
            message,
            fields: visitor.fields,
            spans,
        };

        if self.tx.try_send(alert).is_err() {
            eprintln!("observability: alert queue unavailable, dropping event");
        }
    }
}

#[derive(Default)]
pub(crate) struct RedactingVisitor {
    pub(crate) fields: BTreeMap<String, String>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive(name) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.fields.insert(name.to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }
}

pub(crate) fn is_sensitive(field_name: &str) -> bool {
    const MARKERS: [&str; 7] = [
        "secret",
        "password",
        "token",
        "authorization",
        "cookie",
        "api_key",
        "webhook",
    ];
    let field = field_name.to_ascii_lowercase();
    MARKERS.iter().any(|marker| field.contains(marker))
}
