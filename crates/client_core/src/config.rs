use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    pub register_path: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            register_path: "/api/auth/register".into(),
            request_timeout_secs: 15,
        }
    }
}

impl ClientSettings {
    /// Base URL and path are joined verbatim.
    pub fn register_endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.register_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<Url> {
        let endpoint = self.register_endpoint();
        let url = Url::parse(&endpoint)
            .with_context(|| format!("registration endpoint '{endpoint}' is not a valid URL"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!(
                "registration endpoint '{endpoint}' must use http or https, got '{}'",
                url.scheme()
            );
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(url)
    }
}

/// Defaults, then `client.toml` in the working directory when present, then
/// environment overrides.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to parse {DEFAULT_SETTINGS_FILE}"))?;
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Like [`load_settings`] but the file is mandatory.
pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    apply_file_overrides(&mut settings, &raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub(crate) fn apply_file_overrides(
    settings: &mut ClientSettings,
    raw: &str,
) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)?;

    if let Some(v) = file_cfg.get("base_url").and_then(toml::Value::as_str) {
        settings.base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("register_path").and_then(toml::Value::as_str) {
        settings.register_path = v.to_string();
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        settings.request_timeout_secs = match v {
            toml::Value::Integer(secs) => u64::try_from(*secs)
                .context("request_timeout_secs must not be negative")?,
            toml::Value::String(secs) => secs
                .parse()
                .with_context(|| format!("invalid request_timeout_secs '{secs}'"))?,
            other => anyhow::bail!("invalid request_timeout_secs value: {other}"),
        };
    }

    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = lookup("AUTH_REGISTER_PATH") {
        settings.register_path = v;
    }
    if let Some(v) = lookup("APP__AUTH_REGISTER_PATH") {
        settings.register_path = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
