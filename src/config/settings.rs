//! Application settings.
//!
//! Settings come from three layers, later layers winning: built-in defaults, an optional
//! TOML file (`CONFIG_PATH`, default `config.toml`), and environment variables
//! (`DATABASE_URL`, `BIND_ADDRESS`, `IDENTITY_HEADER`). A `.env` file is loaded into the
//! environment by `main` before this runs.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/emi_ledger.sqlite?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Resolved settings used to start the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SeaORM` connection URL
    pub database_url: String,
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// Request header carrying the authenticated user id
    pub identity_header: String,
}

/// Shape of the optional `config.toml`. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Overrides the default database URL
    pub database_url: Option<String>,
    /// Overrides the default bind address
    pub bind_address: Option<String>,
    /// Overrides the default identity header
    pub identity_header: Option<String>,
}

impl AppConfig {
    /// Merges file settings and environment lookups over the defaults.
    pub fn from_sources<F>(file: FileConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, from_file: Option<String>, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or(from_file)
                .unwrap_or_else(|| {
                    debug!("{key} not set, using default: {default}");
                    default.to_string()
                })
        };

        Self {
            database_url: pick("DATABASE_URL", file.database_url, DEFAULT_DATABASE_URL),
            bind_address: pick("BIND_ADDRESS", file.bind_address, DEFAULT_BIND_ADDRESS),
            identity_header: pick(
                "IDENTITY_HEADER",
                file.identity_header,
                DEFAULT_IDENTITY_HEADER,
            )
            .to_ascii_lowercase(),
        }
    }
}

/// Parses a settings file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or is not valid TOML.
pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads the application configuration from the config file (if present) and the
/// process environment.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let file = if Path::new(&path).exists() {
        load_file_config(&path)?
    } else {
        info!("No config file at {path}, using environment and defaults");
        FileConfig::default()
    };

    Ok(AppConfig::from_sources(file, |key| std::env::var(key).ok()))
}
