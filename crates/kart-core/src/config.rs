use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub search: SearchConfig,
}

/// Where the product catalog lives and how long to wait for it
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the backend API (e.g. "http://localhost:8082/api/v1")
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiescence window before a typed query is sent
    pub debounce_ms: u64,
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8082/api/v1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Config {
    /// Parse and validate the configured endpoint.
    ///
    /// Only absolute `http`/`https` URLs are accepted; `localhost:8082/api` would
    /// otherwise parse with `localhost` as its scheme.
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = &self.catalog.endpoint;
        let url =
            Url::parse(endpoint).map_err(|e| Error::invalid_endpoint(endpoint, e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_endpoint(
                endpoint,
                format!("scheme '{}' is not http or https", url.scheme()),
            ));
        }
        if url.cannot_be_a_base() {
            return Err(Error::invalid_endpoint(endpoint, "URL cannot carry a path"));
        }
        Ok(url)
    }
}

impl CatalogConfig {
    /// Request timeout. A zero value would fail every request, so it falls back to the default.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            tracing::warn!(
                "catalog.timeout_secs = 0 is not usable, using {}s",
                DEFAULT_TIMEOUT_SECS
            );
            return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        }
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub fn load_from(path: &Path) -> Config {
    load_path(path)
}

pub fn load() -> Config {
    match config_path() {
        Some(path) => load_path(&path),
        None => {
            tracing::warn!("Could not determine home directory, using default config");
            Config::default()
        }
    }
}

fn load_path(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!(
            "No kart config at {}, using built-in catalog defaults",
            path.display()
        );
        return Config::default();
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Cannot read kart config {}: {}; using defaults",
                path.display(),
                e
            );
            return Config::default();
        }
    };
    match toml::from_str::<Config>(&contents) {
        Ok(config) => {
            tracing::info!(
                "Catalog endpoint {} (debounce {}ms) from {}",
                config.catalog.endpoint,
                config.search.debounce_ms,
                path.display()
            );
            config
        }
        Err(e) => {
            tracing::warn!(
                "Invalid kart config {}: {}; using defaults",
                path.display(),
                e
            );
            Config::default()
        }
    }
}

fn config_path() -> Option<PathBuf> {
    // ~/.config/ (XDG convention) on every platform
    dirs::home_dir().map(|home| home.join(".config").join("kart").join("config.toml"))
}
