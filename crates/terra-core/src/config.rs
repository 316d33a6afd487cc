//! Configuration types for Terra components.
//!
//! Source URLs are resolved in layers: built-in defaults, then an optional
//! `sources.toml`, then CLI flags / environment variables (applied by the CLI).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Default country list endpoint.
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// Default exchange rate endpoint (rates quoted against USD).
pub const DEFAULT_EXCHANGE_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Default timeout for each source fetch, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Database connection pool configuration.
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Locations of the two external sources.
///
/// # Examples
///
/// ```
/// use terra_core::SourcesConfig;
///
/// let config: SourcesConfig = toml::from_str(r#"
///     exchange_rates_url = "https://rates.example.com/latest"
///     timeout_secs = 10
/// "#).unwrap();
///
/// assert_eq!(config.exchange_rates_url, "https://rates.example.com/latest");
/// assert!(config.countries_url.starts_with("https://restcountries.com"));
/// assert_eq!(config.http().timeout.as_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub countries_url: String,
    pub exchange_rates_url: String,
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            exchange_rates_url: DEFAULT_EXCHANGE_RATES_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SourcesConfig {
    pub fn http(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Default location of `sources.toml`: `<config dir>/terra/sources.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("terra").join("sources.toml"))
}

/// Loads source configuration.
///
/// With an explicit `path`, the file must exist and parse. Without one, the
/// default location is tried and built-in defaults are used if it is absent.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if a file that should be read cannot be
/// read or is not valid TOML.
pub fn load_sources_config(path: Option<&Path>) -> Result<SourcesConfig, AppError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(SourcesConfig::default()),
        },
    };

    if !required && !path.exists() {
        return Ok(SourcesConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", path.display(), e)))
}
