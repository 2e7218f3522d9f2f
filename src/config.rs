//! Configuration manager for the accounts server.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8888";
const DEFAULT_LOG_LEVEL: &str = "info";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Public URL of current instance.
    #[serde(default)]
    pub url: String,
    /// Socket address the server binds to.
    #[serde(default = "default_address")]
    pub address: String,
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    #[serde(skip)]
    fallback: bool,
    /// Related to PostgreSQL configuration.
    /// Users are kept in memory when absent.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
}

/// Failure to load the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot parse `{}`: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid instance url: {0}")]
    Url(#[from] url::ParseError),
}

/// Log output format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

fn default_name() -> String {
    env!("CARGO_CRATE_NAME").to_owned()
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_owned()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: default_name(),
            url: String::default(),
            address: default_address(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            fallback: false,
            postgres: None,
        }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Use the path set in `CONFIG_PATH`, if any.
    pub fn path_from_env(self) -> Self {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => self.path(PathBuf::from(path)),
            None => self,
        }
    }

    /// Application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Ensure a URL carries a `http` or `https` scheme.
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{url}")
        };

        Ok(Url::parse(&url_with_scheme)?.to_string())
    }

    /// Whether defaults were used because no configuration file was found.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Path of the file to read.
    pub fn file_path(&self) -> &Path {
        if self.path.as_os_str().is_empty() {
            Path::new(DEFAULT_CONFIG_PATH)
        } else {
            &self.path
        }
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// A missing file yields the defaults; a file that does not parse is an
    /// error.
    pub fn read(self) -> Result<Arc<Self>, ConfigError> {
        let file_path = self.file_path().to_path_buf();

        let file = match File::open(&file_path) {
            Ok(file) => file,
            Err(_) => return Ok(Arc::new(self.fallback())),
        };

        let config = serde_yaml::from_reader(file).map_err(|source| ConfigError::Yaml {
            path: file_path,
            source,
        })?;

        Ok(Arc::new(self.complete(config)?))
    }

    fn complete(&self, mut config: Configuration) -> Result<Self, url::ParseError> {
        config.version = VERSION.to_owned();
        config.path = self.path.clone();

        if !config.url.is_empty() {
            config.url = self.normalize_url(&config.url)?;
        }

        Ok(config)
    }

    /// Return a default configuration as fallback.
    fn fallback(&self) -> Self {
        Self {
            path: self.path.clone(),
            fallback: true,
            ..Default::default()
        }
    }
}
