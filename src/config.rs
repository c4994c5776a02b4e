//! Configuration loading and management.
//!
//! Sources, lowest to highest priority: built-in defaults, a YAML file
//! (`--config`, else `todo-list/config.yaml`, else the user config dir),
//! environment variables, then CLI flags (applied by `main`).
//!
//! ## Environment Variables
//! - `TODO_LIST_DB_PATH` - Database path
//! - `TODO_LIST_HOST` - Address the server binds
//! - `TODO_LIST_PORT` - Port the server binds
//! - `TODO_LIST_API_URL` - Task endpoint URL used by the client

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::DEFAULT_OWNER;

/// Default port for the web server.
pub const DEFAULT_PORT: u16 = 8080;

/// Project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "todo-list/config.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Server-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (0 picks a free one).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Owner every request is served as. Client-supplied users are ignored.
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            owner: default_owner(),
        }
    }
}

/// Client-side (UI) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Task endpoint URL. When unset, the server's own endpoint is used.
    #[serde(default)]
    pub api_url: Option<String>,

    /// User selected at startup.
    #[serde(default = "default_owner")]
    pub user: String,

    /// File backing the UI's local storage.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            user: default_owner(),
            storage_path: default_storage_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("todo-list/todolist.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("todo-list/local-storage.json")
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the configuration: explicit file (must exist), else the first
    /// default location that exists, else defaults; then environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::load_from_default_locations(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_default_locations() -> Self {
        let user_config = dirs::config_dir().map(|d| d.join("todo-list").join("config.yaml"));
        let candidates = std::iter::once(PathBuf::from(PROJECT_CONFIG_FILE)).chain(user_config);

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config");
                    return config;
                }
                Err(e) => warn!("Ignoring config file {}: {:#}", path.display(), e),
            }
        }

        Self::default()
    }

    /// Apply `TODO_LIST_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(db_path) = std::env::var("TODO_LIST_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(host) = std::env::var("TODO_LIST_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("TODO_LIST_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid TODO_LIST_PORT '{}'", port),
            }
        }

        if let Ok(api_url) = std::env::var("TODO_LIST_API_URL") {
            self.client.api_url = Some(api_url);
        }
    }

    /// Endpoint URL the command-line client talks to.
    pub fn client_api_url(&self) -> String {
        self.client.api_url.clone().unwrap_or_else(|| {
            format!(
                "http://{}:{}{}",
                self.server.host,
                self.server.port,
                crate::api::API_PATH
            )
        })
    }
}
