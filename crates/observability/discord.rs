use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use url::Url;

use super::layer::AlertEvent;

const DISCORD_CONTENT_LIMIT: usize = 2000;

pub(crate) struct DiscordWebhook {
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhook {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(3))
            .build()
            .context("failed to build discord http client")?;

        Ok(Self {
            webhook_url,
            client,
        })
    }

    pub(crate) async fn post(&self, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": render(event) }))
            .send()
            .await
            .map_err(|err| {
                // reqwest errors embed the URL, which is a credential here.
                if err.is_timeout() {
                    anyhow!("discord webhook timed out")
                } else {
                    anyhow!("discord webhook request failed")
                }
            })?;

        if !response.status().is_success() {
            return Err(anyhow!("discord webhook returned {}", response.status()));
        }
        Ok(())
    }
}

pub(crate) fn render(event: &AlertEvent) -> String {
    let mut lines = vec![format!(
        "**{}** `{}` `{}` `{}`",
        event.source.service, event.source.stage, event.source.component, event.level
    )];

    let location = match (&event.file, event.line) {
        (Some(file), Some(line)) => format!(" `{file}:{line}`"),
        _ => String::new(),
    };
    lines.push(format!(
        "`{}` `{}`{}",
        event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        event.target,
        location
    ));

    if let Some(message) = event.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        lines.push(format!("> {message}"));
    }

    if !event.spans.is_empty() {
        lines.push(format!("spans: `{}`", event.spans.join(" > ")));
    }

    for (key, value) in &event.fields {
        lines.push(format!("- `{key}` = `{value}`"));
    }

    truncate(lines.join("\n"), DISCORD_CONTENT_LIMIT)
}

fn truncate(content: String, limit: usize) -> String {
    const SUFFIX: &str = "\n... (truncated)";

    if content.chars().count() <= limit {
        return content;
    }

    let keep = limit.saturating_sub(SUFFIX.len());
    let mut truncated: String = content.chars().take(keep).collect();
    truncated.push_str(SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::config::AlertSource;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tracing::Level;

    fn event(message: &str) -> AlertEvent {
        let mut fields = BTreeMap::new();
        fields.insert("job_id".to_string(), "42".to_string());
        AlertEvent {
            source: AlertSource {
                service: "creator-api".to_string(),
                stage: "prod".to_string(),
                component: "backend".to_string(),
            },
            level: Level::ERROR,
            timestamp: Utc::now(),
            target: "backend::usecases::jobs".to_string(),
            file: Some("backend/src/usecases/jobs.rs".to_string()),
            line: Some(10),
            message: Some(message.to_string()),
            fields,
            spans: vec!["request".to_string()],
        }
    }

    #[test]
    fn render_includes_message_and_fields() {
        let content = render(&event("jobs: processing failed"));

        assert!(content.starts_with("**creator-api** `prod` `backend` `ERROR`"));
        assert!(content.contains("> jobs: processing failed"));
        assert!(content.contains("- `job_id` = `42`"));
        assert!(content.contains("spans: `request`"));
    }

    #[test]
    fn render_truncates_long_content() {
        let content = render(&event(&"x".repeat(5000)));

        assert_eq!(content.chars().count(), DISCORD_CONTENT_LIMIT);
        assert!(content.ends_with("(truncated)"));
    }
}
