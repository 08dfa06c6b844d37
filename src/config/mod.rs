//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable overriding the retention period in days.
pub const RETENTION_DAYS_ENV: &str = "REPOVAULT_RETENTION_DAYS";

/// Default retention period in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Default upper bound on repositories requested from the provider.
pub const DEFAULT_REPO_LIMIT: usize = 100;

/// Main configuration for repovault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Organization whose repository fleet is backed up.
    pub organization: String,
    /// Local backup store root (created if absent).
    pub backup_dir: PathBuf,
    /// Repository name reserved for the durable sink.
    ///
    /// Filtered out of enumeration so the backup store is never backed
    /// up into itself.
    pub sink_repo: String,
    /// Local working copy of the durable sink repository.
    pub sink_path: PathBuf,
    /// Age threshold for retention pruning, in days.
    pub retention_days: u32,
    /// Upper bound on repositories requested from the provider.
    pub repo_limit: usize,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Organization name.
    pub organization: Option<String>,
    /// Backup store directory.
    pub backup_dir: Option<String>,
    /// Sink repository name.
    pub sink_repo: Option<String>,
    /// Sink working copy path.
    pub sink_path: Option<String>,
    /// Retention period in days.
    pub retention_days: Option<u32>,
    /// Repository listing limit.
    pub repo_limit: Option<usize>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            backup_dir: PathBuf::from("backups"),
            sink_repo: "backup".to_string(),
            sink_path: PathBuf::from("backup"),
            retention_days: retention_days_from_env(),
            repo_limit: DEFAULT_REPO_LIMIT,
        }
    }
}

/// Returns the retention period in days, honoring the environment override.
#[must_use]
pub fn retention_days_from_env() -> u32 {
    std::env::var(RETENTION_DAYS_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_DAYS)
}

impl VaultConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/repovault/` on macOS)
    /// 2. XDG config dir (`~/.config/repovault/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        // Check platform-specific config dir first
        let platform_config = base_dirs.config_dir().join("repovault").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        // Fall back to XDG-style ~/.config/repovault/ for Unix compatibility
        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("repovault")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `VaultConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(organization) = file.organization {
            config.organization = organization;
        }
        if let Some(backup_dir) = file.backup_dir {
            config.backup_dir = PathBuf::from(backup_dir);
        }
        if let Some(sink_repo) = file.sink_repo {
            config.sink_repo = sink_repo;
        }
        if let Some(sink_path) = file.sink_path {
            config.sink_path = PathBuf::from(sink_path);
        }
        if let Some(retention_days) = file.retention_days {
            config.retention_days = retention_days;
        }
        if let Some(repo_limit) = file.repo_limit {
            config.repo_limit = repo_limit;
        }

        config
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    /// Sets the backup store directory.
    #[must_use]
    pub fn with_backup_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_dir = path.into();
        self
    }

    /// Sets the sink repository name.
    #[must_use]
    pub fn with_sink_repo(mut self, name: impl Into<String>) -> Self {
        self.sink_repo = name.into();
        self
    }

    /// Sets the sink working copy path.
    #[must_use]
    pub fn with_sink_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sink_path = path.into();
        self
    }

    /// Sets the retention period in days.
    #[must_use]
    pub const fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}
