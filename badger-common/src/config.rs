//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a single TOML file. The file itself is
//! located in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `BADGER_CONFIG` environment variable
//! 3. User config file (`~/.config/badger/config.toml` on Linux)
//! 4. Compiled defaults (fallback, no file)
//!
//! The root folder that relative store paths resolve against follows the same
//! pattern: command line, then `BADGER_ROOT_FOLDER`, then the TOML
//! `root_folder` key, then the current working directory.

use crate::file_utils::write_atomic_create_dirs;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BADGER_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "BADGER_ROOT_FOLDER";

/// Rule profile used when the config does not name one
pub const DEFAULT_PROFILE: &str = "standard";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder that relative store paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Badge rule profile and threshold overrides (optional)
    #[serde(default)]
    pub rules: RulesConfig,

    /// Store registry, processed in the order listed
    #[serde(default = "default_stores")]
    pub stores: Vec<StoreConfig>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            rules: RulesConfig::default(),
            stores: default_stores(),
        }
    }
}

impl TomlConfig {
    /// Check registry keys: non-empty, unique, and usable as a folder name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for store in &self.stores {
            let key = store.key.trim();
            if key.is_empty() {
                return Err(Error::Config("store key must not be empty".to_string()));
            }
            if key.contains('/') || key.contains('\\') || key == "." || key == ".." {
                return Err(Error::Config(format!(
                    "store key '{}' must be a plain folder name",
                    store.key
                )));
            }
            if !seen.insert(key) {
                return Err(Error::Config(format!("duplicate store key '{}'", store.key)));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Rule profile selection and optional threshold overrides
///
/// Every override is optional; unset values keep the profile's built-in
/// threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Named profile (`standard` or `stock-aware`)
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Minimum discount (percent, exclusive) for the sale badge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,

    /// Orders above which an item is a best seller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_seller_orders: Option<i64>,

    /// Likes above which an item is most liked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_liked_likes: Option<i64>,

    /// Orders above which an item is popular
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular_orders: Option<i64>,

    /// Views above which an item is trending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_views: Option<i64>,

    /// Quantity below which in-stock items are low stock (stock-aware only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i64>,

    /// Item keys that must be present for an item to be classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Vec<String>>,

    /// Force `badgeColor` assignment on or off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_color: Option<bool>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            discount_percent: None,
            best_seller_orders: None,
            most_liked_likes: None,
            popular_orders: None,
            trending_views: None,
            low_stock_threshold: None,
            eligibility: None,
            assign_color: None,
        }
    }
}

/// One registry entry as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Stable folder name of the store
    pub key: String,

    /// Human-facing store name (defaults to the key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Authoritative catalog path (default `public/assets/<key>/store.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoritative: Option<PathBuf>,

    /// Mirror catalog path (default `dist/assets/<key>/store.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<PathBuf>,
}

impl StoreConfig {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: Some(name.into()),
            authoritative: None,
            mirror: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Authoritative path, resolved against `root` when relative
    pub fn authoritative_path(&self, root: &Path) -> PathBuf {
        match &self.authoritative {
            Some(path) => resolve_against(root, path),
            None => root.join(default_authoritative_path(&self.key)),
        }
    }

    /// Mirror path, resolved against `root` when relative
    pub fn mirror_path(&self, root: &Path) -> PathBuf {
        match &self.mirror {
            Some(path) => resolve_against(root, path),
            None => root.join(default_mirror_path(&self.key)),
        }
    }
}

/// `public/assets/<key>/store.json`
pub fn default_authoritative_path(key: &str) -> PathBuf {
    PathBuf::from("public").join("assets").join(key).join("store.json")
}

/// `dist/assets/<key>/store.json`
pub fn default_mirror_path(key: &str) -> PathBuf {
    PathBuf::from("dist").join("assets").join(key).join("store.json")
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Compiled-default store registry
pub fn default_stores() -> Vec<StoreConfig> {
    vec![
        StoreConfig::new("nawaem", "نواعم"),
        StoreConfig::new("sheirine", "شيرين"),
        StoreConfig::new("delta-store", "دالتا ستور"),
        StoreConfig::new("pretty", "بريتي"),
        StoreConfig::new("magna-beauty", "ماغنا بيوتي"),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    CompiledDefaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p) | ConfigSource::Environment(p) | ConfigSource::UserFile(p) => {
                Some(p)
            }
            ConfigSource::CompiledDefaults => None,
        }
    }

    /// True when no config file was found and compiled defaults apply
    pub fn is_fallback(&self) -> bool {
        matches!(self, ConfigSource::CompiledDefaults)
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(p) => write!(f, "{} (command line)", p.display()),
            ConfigSource::Environment(p) => write!(f, "{} ({})", p.display(), CONFIG_ENV_VAR),
            ConfigSource::UserFile(p) => write!(f, "{} (user config)", p.display()),
            ConfigSource::CompiledDefaults => write!(f, "compiled defaults"),
        }
    }
}

/// Effective configuration plus its origin
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

/// Locates and loads the bootstrap config file
///
/// A path given explicitly (command line or environment) must exist. A
/// missing user config file is not an error: compiled defaults are used.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    user_config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self {
            cli_path,
            user_config_path: default_user_config_path(),
        }
    }

    /// Override the per-user config location
    pub fn with_user_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.user_config_path = path;
        self
    }

    /// Determine which config source wins, without reading it
    pub fn locate(&self) -> Result<ConfigSource> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return require_exists(path).map(|_| ConfigSource::CommandLine(path.clone()));
        }

        // Priority 2: Environment variable
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
            if !value.trim().is_empty() {
                let path = PathBuf::from(value);
                return require_exists(&path).map(|_| ConfigSource::Environment(path));
            }
        }

        // Priority 3: User config file
        if let Some(path) = &self.user_config_path {
            if path.is_file() {
                return Ok(ConfigSource::UserFile(path.clone()));
            }
        }

        // Priority 4: Compiled defaults
        Ok(ConfigSource::CompiledDefaults)
    }

    /// Locate, read, and validate the configuration
    pub fn load(&self) -> Result<LoadedConfig> {
        let source = self.locate()?;
        let config = match source.path() {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };
        config.validate()?;
        Ok(LoadedConfig { config, source })
    }
}

fn require_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::NotFound(format!("config file {}", path.display())))
    }
}

/// Per-user config file location for the platform
pub fn default_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("badger").join("config.toml"))
}

/// Root folder resolution: command line, environment, TOML, current directory
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(value) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !value.trim().is_empty() {
            return PathBuf::from(value);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    write_atomic_create_dirs(path, content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_default_paths_follow_asset_layout() {
        let store = StoreConfig::new("pretty", "بريتي");
        let root = Path::new("/srv/shop");

        assert_eq!(
            store.authoritative_path(root),
            PathBuf::from("/srv/shop/public/assets/pretty/store.json")
        );
        assert_eq!(
            store.mirror_path(root),
            PathBuf::from("/srv/shop/dist/assets/pretty/store.json")
        );
    }

    #[test]
    fn test_store_absolute_override_ignores_root() {
        let store = StoreConfig {
            key: "nawaem".to_string(),
            name: None,
            authoritative: Some(PathBuf::from("/data/nawaem.json")),
            mirror: Some(PathBuf::from("mirror/nawaem.json")),
        };
        let root = Path::new("/srv/shop");

        assert_eq!(store.authoritative_path(root), PathBuf::from("/data/nawaem.json"));
        assert_eq!(store.mirror_path(root), PathBuf::from("/srv/shop/mirror/nawaem.json"));
        assert_eq!(store.display_name(), "nawaem");
    }

    #[test]
    fn test_validate_rejects_duplicate_keys() {
        let mut config = TomlConfig::default();
        config.stores.push(StoreConfig::new("pretty", "again"));

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_path_like_keys() {
        let config = TomlConfig {
            stores: vec![StoreConfig::new("../escape", "x")],
            ..TomlConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_only_compiled_defaults_is_fallback() {
        assert!(ConfigSource::CompiledDefaults.is_fallback());
        assert!(!ConfigSource::UserFile(PathBuf::from("config.toml")).is_fallback());
        assert!(!ConfigSource::CommandLine(PathBuf::from("config.toml")).is_fallback());
    }

    #[test]
    fn test_missing_user_file_falls_back_without_error() {
        let resolver = ConfigResolver::new(None)
            .with_user_config_path(Some(PathBuf::from("/nonexistent/badger/config.toml")));
        if std::env::var(CONFIG_ENV_VAR).is_err() {
            let loaded = resolver.load().unwrap();
            assert!(loaded.source.is_fallback());
            assert_eq!(loaded.config, TomlConfig::default());
        }
    }

    #[test]
    fn test_compiled_defaults_registry_order() {
        let keys: Vec<_> = default_stores().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["nawaem", "sheirine", "delta-store", "pretty", "magna-beauty"]);
    }
}
