use std::{fs, time::Duration};

use anyhow::{bail, Context};
use url::Url;

pub const CONFIG_FILE: &str = "practice.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            request_timeout_secs: 30,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.server_url)
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "server url '{}' must use http or https, not '{}'",
                self.server_url,
                url.scheme()
            );
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Defaults, then `practice.toml` in the working directory, then the
/// process environment. CLI flags are applied by the caller.
pub fn load_settings() -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    settings_from(raw.as_deref(), |key| std::env::var(key).ok())
        .with_context(|| format!("failed to load {CONFIG_FILE}"))
}

pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg = raw
            .parse::<toml::Table>()
            .context("config file is not valid TOML")?;
        if let Some(v) = file_cfg.get("server_url").and_then(|v| v.as_str()) {
            settings.server_url = v.to_string();
        }
        if let Some(v) = file_cfg.get("request_timeout_secs") {
            settings.request_timeout_secs = v
                .as_integer()
                .and_then(|secs| u64::try_from(secs).ok())
                .context("request_timeout_secs must be a non-negative integer")?;
        }
        if let Some(v) = file_cfg.get("log_filter").and_then(|v| v.as_str()) {
            settings.log_filter = v.to_string();
        }
    }

    if let Some(v) = env("PRACTICE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS '{v}' is not a number"))?;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
