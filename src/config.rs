use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const PKG_NAME: &str = "mollymon";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MollymonConfig {
    pub logging: LoggingConfig,
    pub contact: ContactConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Settings for the SCGI contact service and its message store.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContactConfig {
    pub db_path: String,
    pub socket_path: String,
    /// SCGI header carrying the visitor's (percent-encoded) message.
    pub input_header: String,
    /// Fall back to the request body when `input_header` is absent or empty.
    pub body_fallback: bool,
    pub read_timeout_secs: u64,
    pub max_connections: usize,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub prompt: String,
    pub thanks: String,
    pub failure: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub access_log: String,
    pub error_log: String,
    pub capsule_name: String,
    pub top_paths: usize,
    pub error_sample: usize,
    /// Access events under these path prefixes are ignored entirely.
    pub exclude_prefixes: Vec<String>,
    pub sections: Vec<SectionConfig>,
}

/// A titled sub-section of the traffic report covering one path prefix.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    pub title: String,
    pub prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            db_path: default_data_dir()
                .join("contact.db")
                .to_string_lossy()
                .into_owned(),
            socket_path: default_runtime_dir()
                .join("contact.sock")
                .to_string_lossy()
                .into_owned(),
            input_header: "QUERY_STRING".into(),
            body_fallback: true,
            read_timeout_secs: 10,
            max_connections: 16,
            max_header_bytes: 8 * 1024,
            max_body_bytes: 16 * 1024,
            prompt: "Please enter your message.".into(),
            thanks: "Thank you for your message!".into(),
            failure: "Something went wrong. Error has been logged.".into(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let logs = default_log_dir();
        Self {
            access_log: logs.join("access.log").to_string_lossy().into_owned(),
            error_log: logs.join("error.log").to_string_lossy().into_owned(),
            capsule_name: "capsule".into(),
            top_paths: 10,
            error_sample: 5,
            exclude_prefixes: Vec::new(),
            sections: Vec::new(),
        }
    }
}

impl ContactConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Returns the per-user data directory, e.g. `~/.local/share/mollymon/`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PKG_NAME)
}

/// Returns the runtime directory for the socket, falling back to the temp dir
/// on platforms without one.
pub fn default_runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PKG_NAME)
}

/// Returns the directory where rotated capsule logs are expected by default.
pub fn default_log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(PKG_NAME)
        .join("logs")
}

/// Returns the default config file path: `~/.config/mollymon/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(PKG_NAME)
        .join("config.toml")
}

impl MollymonConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MollymonConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MOLLYMON_DB, MOLLYMON_SOCKET, MOLLYMON_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOLLYMON_DB") {
            self.contact.db_path = val;
        }
        if let Ok(val) = std::env::var("MOLLYMON_SOCKET") {
            self.contact.socket_path = val;
        }
        if let Ok(val) = std::env::var("MOLLYMON_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.contact.db_path)
    }

    pub fn resolved_socket_path(&self) -> PathBuf {
        expand_tilde(&self.contact.socket_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
