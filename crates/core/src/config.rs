//! Configuration management
//!
//! This module handles loading, saving, and migrating the azbutils configuration file.
//! The configuration file is stored in TOML format at ~/.config/azbutils/config.toml,
//! or under `$AZBUTILS_CONFIG_DIR` when that variable is set.
//!
//! Secrets are never written here. Account records carry only the auth method and
//! endpoint details; keys, connection strings and SAS URLs are read from the
//! environment when a client is built.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::account::{AccountRecord, AuthMethod};
use crate::error::{Error, Result};

/// Current configuration schema version
///
/// Bumping this version requires a migration step in [`ConfigManager::load`].
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "AZBUTILS_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// In-memory account catalog and CLI defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Account used when a command names none; empty when unset
    pub default_account: String,

    /// Default settings
    pub defaults: Defaults,

    /// Network call bounds
    pub timeouts: TimeoutConfig,

    /// Configured accounts keyed by name
    pub accounts: BTreeMap<String, AccountRecord>,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

/// Upper bounds for network calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Probe and listing calls, in seconds
    #[serde(default = "default_metadata_secs")]
    pub metadata_secs: u64,

    /// Upload and download calls, in seconds
    #[serde(default = "default_transfer_secs")]
    pub transfer_secs: u64,
}

fn default_metadata_secs() -> u64 {
    30
}

fn default_transfer_secs() -> u64 {
    300
}

impl TimeoutConfig {
    /// Bound for metadata and listing operations
    pub fn metadata(&self) -> Duration {
        Duration::from_secs(self.metadata_secs)
    }

    /// Bound for data transfer operations
    pub fn transfer(&self) -> Duration {
        Duration::from_secs(self.transfer_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            metadata_secs: default_metadata_secs(),
            transfer_secs: default_transfer_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            default_account: String::new(),
            defaults: Defaults::default(),
            timeouts: TimeoutConfig::default(),
            accounts: BTreeMap::new(),
        }
    }
}

/// On-disk shape of the configuration file
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    schema_version: u32,

    #[serde(default)]
    default_account: String,

    #[serde(default)]
    defaults: Defaults,

    #[serde(default)]
    timeouts: TimeoutConfig,

    #[serde(default)]
    accounts: BTreeMap<String, StoredAccount>,
}

/// On-disk shape of one account record
#[derive(Debug, Serialize, Deserialize)]
struct StoredAccount {
    auth_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    service_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_name: Option<String>,
}

impl From<&Config> for ConfigFile {
    fn from(config: &Config) -> Self {
        Self {
            schema_version: config.schema_version,
            default_account: config.default_account.clone(),
            defaults: config.defaults.clone(),
            timeouts: config.timeouts.clone(),
            accounts: config
                .accounts
                .iter()
                .map(|(name, record)| {
                    let stored = StoredAccount {
                        auth_method: record.auth_method.as_str().to_string(),
                        service_url: record.service_url.clone(),
                        account_name: record.account_name.clone(),
                    };
                    (name.clone(), stored)
                })
                .collect(),
        }
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = Error;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let mut accounts = BTreeMap::new();
        for (name, stored) in file.accounts {
            let auth_method: AuthMethod = stored.auth_method.parse().map_err(|_| {
                Error::UnsupportedAuthMethod(format!(
                    "'{}' (account '{name}')",
                    stored.auth_method
                ))
            })?;
            let record = AccountRecord {
                auth_method,
                service_url: stored.service_url,
                account_name: stored.account_name,
            };
            accounts.insert(name, record);
        }

        let mut default_account = file.default_account;
        if !default_account.is_empty() && !accounts.contains_key(&default_account) {
            tracing::warn!(
                "Default account '{default_account}' is not configured; ignoring it"
            );
            default_account.clear();
        }

        Ok(Self {
            schema_version: file.schema_version,
            default_account,
            defaults: file.defaults,
            timeouts: file.timeouts,
            accounts,
        })
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// `$AZBUTILS_CONFIG_DIR` takes precedence over the platform config directory.
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::with_path(PathBuf::from(dir).join(CONFIG_FILE_NAME)));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("azbutils").join(CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// A missing file yields [`Error::ConfigNotFound`]; a file that cannot be
    /// deserialized yields [`Error::ConfigCorrupt`].
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(self.config_path.clone()));
            }
            Err(source) => {
                return Err(Error::ConfigIo {
                    path: self.config_path.clone(),
                    source,
                });
            }
        };

        tracing::debug!("Loading configuration from {}", self.config_path.display());

        let mut file: ConfigFile = toml::from_str(&content).map_err(|e| Error::ConfigCorrupt {
            path: self.config_path.clone(),
            message: e.to_string(),
        })?;

        // Check schema version and migrate if necessary
        if file.schema_version < SCHEMA_VERSION {
            file = self.migrate(file);
        } else if file.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade azbutils.",
                file.schema_version, SCHEMA_VERSION
            )));
        }

        Config::try_from(file)
    }

    /// Load configuration, treating a missing file as an empty catalog
    pub fn load_or_default(&self) -> Result<Config> {
        match self.load() {
            Err(Error::ConfigNotFound(path)) => {
                tracing::debug!("No configuration at {}, using defaults", path.display());
                Ok(Config::default())
            }
            other => other,
        }
    }

    /// Save configuration to disk
    ///
    /// Creates the parent directory (mode 700) if needed, writes a temporary file
    /// next to the target with mode 600 and renames it into place.
    pub fn save(&self, config: &Config) -> Result<()> {
        let parent = self
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.ensure_dir(parent)?;

        let content = toml::to_string_pretty(&ConfigFile::from(config))?;

        let io_err = |source: std::io::Error| Error::ConfigIo {
            path: self.config_path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        // Set restrictive permissions on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tmp.as_file().set_permissions(permissions).map_err(io_err)?;
        }

        tmp.persist(&self.config_path).map_err(|e| io_err(e.error))?;

        tracing::debug!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if dir.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(dir).map_err(|source| Error::ConfigIo {
            path: dir.to_path_buf(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(dir, permissions).map_err(|source| Error::ConfigIo {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, mut file: ConfigFile) -> ConfigFile {
        tracing::debug!(
            "Migrating configuration from schema {} to {}",
            file.schema_version,
            SCHEMA_VERSION
        );
        file.schema_version = SCHEMA_VERSION;
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("azbutils").join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    fn write_raw(manager: &ConfigManager, content: &str) {
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(manager.config_path(), content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.timeouts.metadata(), Duration::from_secs(30));
        assert_eq!(config.timeouts.transfer(), Duration::from_secs(300));
        assert!(config.default_account.is_empty());
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_load_nonexistent_is_not_found() {
        let (manager, _temp_dir) = temp_config_manager();
        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));

        let config = manager.load_or_default().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_is_corrupt() {
        let (manager, _temp_dir) = temp_config_manager();
        write_raw(&manager, "schema_version = \n[[[");

        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::ConfigCorrupt { .. }));

        // A corrupt file is never silently replaced by defaults
        assert!(manager.load_or_default().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.accounts.insert(
            "prod".to_string(),
            AccountRecord::new(AuthMethod::SharedKey)
                .with_service_url("https://prod.blob.core.windows.net")
                .with_account_name("prod"),
        );
        config.accounts.insert(
            "ci".to_string(),
            AccountRecord::new(AuthMethod::ConnectionString),
        );
        config.default_account = "prod".to_string();
        config.timeouts.metadata_secs = 10;

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_and_load_empty_catalog() {
        let (manager, _temp_dir) = temp_config_manager();

        let config = Config::default();
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert!(loaded.accounts.is_empty());
        assert_eq!(loaded.default_account, "");
        assert_eq!(loaded, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (manager, _temp_dir) = temp_config_manager();
        manager.save(&Config::default()).unwrap();

        let file_mode = std::fs::metadata(manager.config_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);

        let dir_mode = std::fs::metadata(manager.config_path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_secrets_are_never_written() {
        let (manager, _temp_dir) = temp_config_manager();
        write_raw(
            &manager,
            r#"
            schema_version = 1
            default_account = "legacy"

            [accounts.legacy]
            auth_method = "shared-key"
            service_url = "https://legacy.blob.core.windows.net"
            account_name = "legacy"
            account_key = "c2VjcmV0"
            connection = "DefaultEndpointsProtocol=https;AccountKey=c2VjcmV0"
            "#,
        );

        let config = manager.load().unwrap();
        assert_eq!(config.accounts["legacy"].auth_method, AuthMethod::SharedKey);

        manager.save(&config).unwrap();
        let content = std::fs::read_to_string(manager.config_path()).unwrap();
        assert!(!content.contains("c2VjcmV0"));
        assert!(!content.contains("account_key"));
    }

    #[test]
    fn test_unknown_auth_method_rejected_at_load() {
        let (manager, _temp_dir) = temp_config_manager();
        write_raw(
            &manager,
            r#"
            schema_version = 1

            [accounts.weird]
            auth_method = "bogus"
            "#,
        );

        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::UnsupportedAuthMethod(_)));
        assert!(err.to_string().contains("bogus"));
        assert!(err.to_string().contains("weird"));
    }

    #[test]
    fn test_dangling_default_is_cleared() {
        let (manager, _temp_dir) = temp_config_manager();
        write_raw(
            &manager,
            r#"
            schema_version = 1
            default_account = "gone"
            "#,
        );

        let config = manager.load().unwrap();
        assert_eq!(config.default_account, "");
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();
        write_raw(
            &manager,
            &format!("schema_version = {}\n", SCHEMA_VERSION + 1),
        );

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }
}
