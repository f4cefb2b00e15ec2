use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_ORIGIN: &str = "https://stackoverflow.com";
const ENV_PREFIX: &str = "STACKPEEK";

/// Runtime settings: built-in defaults overlaid with `STACKPEEK_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub origin: String,
    pub min_query_len: usize,
    pub debounce_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            origin: DEFAULT_ORIGIN.to_string(),
            min_query_len: 5,
            debounce_ms: 500,
            timeout_secs: 15,
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("origin", defaults.origin)?
            .set_default("min_query_len", defaults.min_query_len as u64)?
            .set_default("debounce_ms", defaults.debounce_ms)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("user_agent", defaults.user_agent)?
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to build settings")?;

        let mut settings: Settings = settings
            .try_deserialize()
            .context("Invalid STACKPEEK_* settings")?;
        settings.origin = normalize_origin(&settings.origin)?;
        Ok(settings)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Scheme, host and port of `raw`, lowercased and without a trailing slash.
/// Anything past the root (path, query, fragment) is rejected: search and
/// question URLs are built by appending to the origin.
pub fn normalize_origin(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw.trim())
        .with_context(|| format!("Invalid origin {raw:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Origin {raw:?} must be http or https");
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        bail!("Origin {raw:?} must not have a path, query or fragment");
    }
    Ok(url.origin().ascii_serialization())
}

fn default_user_agent() -> String {
    format!("stackpeek/{}", env!("CARGO_PKG_VERSION"))
}
