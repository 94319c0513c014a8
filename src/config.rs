//! Configuration system for the VDOS dashboard
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (VDOS_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};

/// Main dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Simulation server connection
    pub server: ServerSettings,

    /// Refresh cadence and view sizes
    pub polling: PollingSettings,

    /// Defaults for starting a simulation
    pub simulation: SimulationSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Simulation server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the simulation manager (http:// or https://)
    pub base_url: String,

    /// Path prefix of the REST API
    pub api_prefix: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Poll cadence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Refresh period while the simulation is running or auto-ticking
    pub active_interval_ms: u64,

    /// Refresh period while the simulation is idle
    pub idle_interval_ms: u64,

    /// Number of planner metrics pulled per cycle
    pub planner_metrics_limit: u32,

    /// Number of most recent events rendered
    pub events_shown: usize,
}

/// Simulation start defaults (legacy single-project payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Project name used when no draft projects exist
    pub project_name: String,

    /// Project summary used when no draft projects exist
    pub project_summary: String,

    /// Duration in weeks used when no draft projects exist
    pub duration_weeks: u32,

    /// Optional planner model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hint: Option<String>,

    /// Optional seed for reproducible events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8015".to_string(),
            api_prefix: "/api/v1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            active_interval_ms: 5_000,
            idle_interval_ms: 60_000,
            planner_metrics_limit: 50,
            events_shown: 10,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            project_name: "Dashboard Project".to_string(),
            project_summary: "Generated from web dashboard".to_string(),
            duration_weeks: 1,
            model_hint: None,
            random_seed: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl ServerSettings {
    /// Full URL of the API root, e.g. `http://127.0.0.1:8015/api/v1`
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingSettings {
    pub fn active_interval(&self) -> Duration {
        Duration::from_millis(self.active_interval_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

impl DashboardConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: e.to_string(),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            PathBuf::from("vdos-dashboard.toml"),
            PathBuf::from("dashboard.toml"),
            dirs::config_dir()
                .map(|p| p.join("vdos").join("dashboard.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".vdos").join("dashboard.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/vdos/dashboard.toml"),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("VDOS_BASE_URL") {
            self.server.base_url = val;
        }
        if let Ok(val) = std::env::var("VDOS_API_PREFIX") {
            self.server.api_prefix = val;
        }
        if let Ok(val) = std::env::var("VDOS_REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.server.request_timeout_secs = n;
            }
        }

        // Polling settings
        if let Ok(val) = std::env::var("VDOS_ACTIVE_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.polling.active_interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("VDOS_IDLE_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.polling.idle_interval_ms = n;
            }
        }

        // Simulation settings
        if let Ok(val) = std::env::var("VDOS_MODEL_HINT") {
            self.simulation.model_hint = Some(val);
        }
        if let Ok(val) = std::env::var("VDOS_RANDOM_SEED") {
            if let Ok(n) = val.parse() {
                self.simulation.random_seed = Some(n);
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("VDOS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("VDOS_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("VDOS_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.is_empty() {
            return Err(Error::config_field_invalid(
                "server.base_url",
                "Server base URL cannot be empty",
            ));
        }
        let url = Url::parse(&self.server.base_url).map_err(|e| {
            Error::config_field_invalid(
                "server.base_url",
                format!("Invalid server base URL '{}': {}", self.server.base_url, e),
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::config_field_invalid(
                "server.base_url",
                "Server base URL must start with http:// or https://",
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "server.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }

        if self.polling.active_interval_ms == 0 || self.polling.idle_interval_ms == 0 {
            return Err(Error::config_validation("Polling intervals must be greater than 0"));
        }
        if self.polling.active_interval_ms > self.polling.idle_interval_ms {
            return Err(Error::config_validation(
                "active_interval_ms must not exceed idle_interval_ms",
            ));
        }

        if self.simulation.duration_weeks == 0 {
            return Err(Error::config_field_invalid(
                "simulation.duration_weeks",
                "duration_weeks must be at least 1",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".vdos")
                .join("dashboard.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# VDOS Dashboard Configuration

[server]
# Base URL of the simulation manager
base_url = "http://127.0.0.1:8015"

# REST API prefix
api_prefix = "/api/v1"

# Per-request timeout in seconds
request_timeout_secs = 30

[polling]
# Refresh period while the simulation is running or auto-ticking
active_interval_ms = 5000

# Refresh period while the simulation is idle
idle_interval_ms = 60000

# Planner metrics pulled per refresh
planner_metrics_limit = 50

# Most recent events shown
events_shown = 10

[simulation]
# Used when no draft projects have been composed
project_name = "Dashboard Project"
project_summary = "Generated from web dashboard"
duration_weeks = 1

# model_hint = "gpt-4o-mini"
# random_seed = 42

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.vdos/logs/dashboard.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
