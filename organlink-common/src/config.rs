//! Configuration loading and root folder resolution
//!
//! The root folder holds organlink.db and everything else the services
//! write. It resolves through four tiers: command-line argument (handled by
//! the binary before calling in here), environment variable, TOML config
//! file, then an OS-dependent compiled default. Missing config files are
//! never fatal; resolution always produces a usable path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable checked first during resolution.
pub const ENV_ROOT_FOLDER: &str = "ORGANLINK_ROOT_FOLDER";
/// Shorter alternative, checked second.
pub const ENV_ROOT: &str = "ORGANLINK_ROOT";

/// Database file name inside the root folder.
pub const DATABASE_FILE_NAME: &str = "organlink.db";

/// Logging section of the TOML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. "info" or "organlink_cs=debug".
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path. None logs to stderr only.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

/// On-disk TOML configuration. Every field is optional so a partial or
/// empty file still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder override, tier 3 of resolution.
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parses a TOML config file. Missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(TomlConfig::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Compiled fallback configuration, tier 4 of resolution.
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Platform defaults: the per-user data directory plus "organlink".
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            dirs::data_local_dir()
                .map(|d| d.join("organlink"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/organlink"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("organlink"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/organlink"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("organlink"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\organlink"))
        } else {
            PathBuf::from("./organlink_data")
        };

        CompiledDefaults {
            root_folder,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Resolves the root folder through the tiered priority order.
///
/// The binary applies its command-line override before consulting the
/// resolver, so tiers here are: `ORGANLINK_ROOT_FOLDER`, `ORGANLINK_ROOT`,
/// the TOML config file, then the compiled default.
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        RootFolderResolver {
            module_name: module_name.into(),
        }
    }

    /// Resolves the root folder. Never fails: missing environment
    /// variables and config files fall through to the next tier.
    pub fn resolve(&self) -> PathBuf {
        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var(ENV_ROOT) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(config) = self.load_toml_config() {
            if let Some(root_folder) = config.root_folder {
                return root_folder;
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }

    /// Loads the first config file that exists and parses, checking the
    /// module-specific file before the shared one.
    pub fn load_toml_config(&self) -> Option<TomlConfig> {
        for path in self.config_file_paths() {
            if !path.exists() {
                continue;
            }
            match TomlConfig::load(&path) {
                Ok(config) => return Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config file {}: {}", path.display(), e);
                }
            }
        }
        None
    }

    /// Candidate config file locations in priority order.
    fn config_file_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            let base = config_dir.join("organlink");
            paths.push(base.join(format!("{}.toml", self.module_name)));
            paths.push(base.join("config.toml"));
        }
        if cfg!(target_os = "linux") {
            paths.push(PathBuf::from("/etc/organlink/config.toml"));
        }
        paths
    }
}

/// Prepares a resolved root folder for use.
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        RootFolderInitializer { root_folder }
    }

    /// Creates the root folder (and parents) if missing. Idempotent.
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    /// Full path of the database file inside the root folder.
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
