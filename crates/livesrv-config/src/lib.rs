//! Configuration management for livesrv.
//!
//! Parses `livesrv.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Without a config
//! file every value falls back to its default, so livesrv runs with zero
//! configuration.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `server.root`
//! - `live_reload.inject_file`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the served root directory.
    pub root_dir: Option<PathBuf>,
    /// Override browser launch.
    pub open_browser: Option<bool>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
    /// Override the injected payload file.
    pub inject_file: Option<PathBuf>,
    /// Override polling watcher selection.
    pub poll: Option<bool>,
    /// Override polling interval.
    pub interval_ms: Option<u64>,
    /// Extra ignore patterns, appended to the configured ones.
    pub ignore: Vec<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "livesrv.toml";

/// Default polling interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1407;

/// Upper bound for the polling interval.
const MAX_INTERVAL_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,
    /// File watcher configuration.
    pub watch: WatchConfig,

    /// Resolved root directory (set after loading).
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Resolved custom payload file (set after loading).
    #[serde(skip)]
    pub inject_file: Option<PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Open the served URL in a browser after startup.
    pub open_browser: bool,
    /// Root directory as written in the config file.
    root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8080,
            open_browser: true,
            root: None,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether the reload client is injected and upgrades are accepted.
    pub enabled: bool,
    /// Custom payload file as written in the config file.
    inject_file: Option<String>,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inject_file: None,
        }
    }
}

/// File watcher configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Use the polling watcher instead of native file system events.
    pub poll: bool,
    /// Polling interval in milliseconds.
    pub interval_ms: u64,
    /// Extra glob patterns to ignore, relative to the root directory.
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            interval_ms: DEFAULT_INTERVAL_MS,
            ignore: Vec::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`LIVESRV_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `livesrv.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.root_dir.clone_from(root_dir);
        }
        if let Some(open_browser) = settings.open_browser {
            self.server.open_browser = open_browser;
        }
        if let Some(enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = enabled;
        }
        if let Some(inject_file) = &settings.inject_file {
            self.inject_file = Some(inject_file.clone());
        }
        if let Some(poll) = settings.poll {
            self.watch.poll = poll;
        }
        if let Some(interval_ms) = settings.interval_ms {
            self.watch.interval_ms = interval_ms;
        }
        self.watch.ignore.extend(settings.ignore.iter().cloned());
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config serving the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config serving the given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            live_reload: LiveReloadConfig::default(),
            watch: WatchConfig::default(),
            root_dir: base.to_path_buf(),
            inject_file: None,
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_watch()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 lets the OS pick a port, which a browser tab cannot follow
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate watcher configuration.
    fn validate_watch(&self) -> Result<(), ConfigError> {
        let interval = self.watch.interval_ms;
        if interval == 0 {
            return Err(ConfigError::Validation(
                "watch.interval_ms must be greater than 0".to_owned(),
            ));
        }
        if interval > MAX_INTERVAL_MS {
            return Err(ConfigError::Validation(format!(
                "watch.interval_ms cannot exceed {MAX_INTERVAL_MS}"
            )));
        }

        if let Some(pattern) = self.watch.ignore.iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "watch.ignore contains an empty pattern: {pattern:?}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref root) = self.server.root {
            self.server.root = Some(expand::expand_env(root, "server.root")?);
        }

        if let Some(ref inject_file) = self.live_reload.inject_file {
            self.live_reload.inject_file =
                Some(expand::expand_env(inject_file, "live_reload.inject_file")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.root_dir = config_dir.join(self.server.root.as_deref().unwrap_or("."));
        self.inject_file = self
            .live_reload
            .inject_file
            .as_deref()
            .map(|f| config_dir.join(f));
    }
}
