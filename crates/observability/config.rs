use std::env;

use tracing::Level;
use url::Url;

/// Identifies which process emitted an alert.
#[derive(Clone, Debug)]
pub(crate) struct AlertSource {
    pub(crate) service: String,
    pub(crate) stage: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct DiscordSink {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilitySettings {
    pub(crate) source: AlertSource,
    pub(crate) discord: Option<DiscordSink>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilitySettings {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let component = component.trim().to_string();

        let source = AlertSource {
            service: non_empty("SERVICE_NAME").unwrap_or_else(|| component.clone()),
            stage: non_empty("STAGE").unwrap_or_else(|| "local".to_string()),
            component,
        };

        let mut warnings = Vec::new();
        let discord = discord_sink(&non_empty, &mut warnings);

        Self {
            source,
            discord,
            warnings,
        }
    }
}

fn discord_sink<F>(lookup: &F, warnings: &mut Vec<String>) -> Option<DiscordSink>
where
    F: Fn(&str) -> Option<String>,
{
    let enabled = lookup("DISCORD_NOTIFY_ENABLED")
        .and_then(|raw| parse_bool(&raw))
        .unwrap_or(true);
    if !enabled {
        return None;
    }

    let raw_url = lookup("DISCORD_WEBHOOK_URL")?;
    let webhook_url = match Url::parse(raw_url.trim()) {
        Ok(url) => url,
        Err(err) => {
            // The URL itself carries a secret, only the parse error is reported.
            warnings.push(format!(
                "DISCORD_WEBHOOK_URL is invalid, Discord alerts disabled ({err})"
            ));
            return None;
        }
    };

    let min_level = match lookup("DISCORD_NOTIFY_LEVEL") {
        Some(raw) => parse_level(&raw).unwrap_or_else(|| {
            warnings.push(format!(
                "DISCORD_NOTIFY_LEVEL `{raw}` is not a log level, using ERROR"
            ));
            Level::ERROR
        }),
        None => Level::ERROR,
    };

    Some(DiscordSink {
        webhook_url,
        min_level,
    })
}

pub(crate) fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> ObservabilitySettings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilitySettings::from_lookup("backend", |key| map.get(key).cloned())
    }

    #[test]
    fn discord_is_disabled_without_webhook() {
        let settings = settings(&[]);

        assert!(settings.discord.is_none());
        assert!(settings.warnings.is_empty());
        assert_eq!(settings.source.service, "backend");
        assert_eq!(settings.source.stage, "local");
    }

    #[test]
    fn invalid_webhook_url_produces_warning() {
        let settings = settings(&[("DISCORD_WEBHOOK_URL", "not a url")]);

        assert!(settings.discord.is_none());
        assert_eq!(settings.warnings.len(), 1);
        assert!(!settings.warnings[0].contains("not a url"));
    }

    #[test]
    fn unknown_level_falls_back_to_error() {
        let settings = settings(&[
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
            ("DISCORD_NOTIFY_LEVEL", "loud"),
        ]);

        let discord = settings.discord.unwrap();
        assert_eq!(discord.min_level, Level::ERROR);
        assert_eq!(settings.warnings.len(), 1);
    }

    #[test]
    fn explicit_disable_wins_over_webhook() {
        let settings = settings(&[
            ("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
            ("DISCORD_NOTIFY_ENABLED", "off"),
            ("DISCORD_NOTIFY_LEVEL", "warn"),
        ]);

        assert!(settings.discord.is_none());
    }
}
