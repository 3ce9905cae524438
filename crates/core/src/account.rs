//! Account management
//!
//! Accounts are named references to Azure Blob Storage endpoints together with
//! the authentication method used to reach them. Secrets are not part of a
//! record; see [`crate::credential`] for how they are resolved.

use crate::config::{Config, ConfigManager};
use crate::credential::required_variables;
use crate::error::{Error, Result};
use crate::locator::SERVICE_DOMAIN;
use crate::prompt::Prompter;

/// How a client authenticates against the blob service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// Ambient credentials: a logged-in Azure CLI session or the default chain
    CliLogin,
    /// A full connection string
    ConnectionString,
    /// Storage account name plus account key
    SharedKey,
    /// A service URL carrying a shared access signature
    SasUrl,
}

impl AuthMethod {
    /// Every supported method, in prompt order
    pub const ALL: [AuthMethod; 4] = [
        AuthMethod::CliLogin,
        AuthMethod::ConnectionString,
        AuthMethod::SharedKey,
        AuthMethod::SasUrl,
    ];

    /// Canonical spelling used in the configuration file
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CliLogin => "az-login",
            Self::ConnectionString => "connection-string",
            Self::SharedKey => "shared-key",
            Self::SasUrl => "sas",
        }
    }

    /// Short human description
    pub const fn description(self) -> &'static str {
        match self {
            Self::CliLogin => "Azure CLI login / default credential chain",
            Self::ConnectionString => "Connection string",
            Self::SharedKey => "Account name and shared key",
            Self::SasUrl => "SAS URL",
        }
    }

    /// Whether the record must declare the endpoint to bind the credential to
    pub const fn needs_service_url(self) -> bool {
        matches!(self, Self::CliLogin | Self::SharedKey)
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "az-login" | "cli-login" | "default" => Ok(Self::CliLogin),
            "connection-string" => Ok(Self::ConnectionString),
            "shared-key" => Ok(Self::SharedKey),
            "sas" | "sas-url" => Ok(Self::SasUrl),
            _ => Err(Error::UnsupportedAuthMethod(s.to_string())),
        }
    }
}

/// A named bundle of auth method and connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Declared authentication method
    pub auth_method: AuthMethod,

    /// Blob service endpoint, e.g. `https://acct.blob.core.windows.net`
    pub service_url: Option<String>,

    /// Storage account name
    pub account_name: Option<String>,
}

impl AccountRecord {
    /// Create a record with only the auth method set
    pub fn new(auth_method: AuthMethod) -> Self {
        Self {
            auth_method,
            service_url: None,
            account_name: None,
        }
    }

    /// Set the service URL
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Set the storage account name
    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }

    /// Record using ambient credentials against the public endpoint for `name`
    pub fn cli_login(name: &str) -> Self {
        Self::new(AuthMethod::CliLogin)
            .with_service_url(default_service_url(name))
            .with_account_name(name)
    }

    /// Check that the populated fields fit the declared auth method
    pub fn validate(&self) -> Result<()> {
        match &self.service_url {
            Some(url) => {
                let parsed = url::Url::parse(url)?;
                let allowed = match parsed.scheme() {
                    "https" => true,
                    "http" => is_loopback(&parsed),
                    _ => false,
                };
                if !allowed {
                    return Err(Error::Config(format!(
                        "Service URL must use https (http only for a local emulator): {url}"
                    )));
                }
            }
            None if self.auth_method.needs_service_url() => {
                return Err(Error::Config(format!(
                    "Auth method '{}' requires a service URL",
                    self.auth_method
                )));
            }
            None => {}
        }
        Ok(())
    }
}

/// Public blob endpoint for a storage account
pub fn default_service_url(account: &str) -> String {
    format!("https://{account}.{SERVICE_DOMAIN}")
}

fn is_loopback(url: &url::Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        Some(url::Host::Domain(domain)) => domain == "localhost",
        None => false,
    }
}

/// Check if a string is a valid account name
///
/// The upper-cased name prefixes environment variable names, so it must be a
/// valid shell identifier: ASCII letters, digits and `_`, not starting with a
/// digit.
pub fn is_valid_account_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_account_name(name: &str) -> Result<()> {
    if is_valid_account_name(name) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid account name '{name}'. Use letters, digits or '_', starting with a letter"
        )))
    }
}

/// Manager for account operations
#[derive(Debug, Clone)]
pub struct AccountManager {
    config_manager: ConfigManager,
}

impl AccountManager {
    /// Create a new AccountManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new AccountManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// The underlying config manager
    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// Load the catalog, treating a missing file as empty
    pub fn catalog(&self) -> Result<Config> {
        self.config_manager.load_or_default()
    }

    /// List all configured accounts, sorted by name
    pub fn list(&self) -> Result<Vec<(String, AccountRecord)>> {
        let config = self.catalog()?;
        Ok(config.accounts.into_iter().collect())
    }

    /// Get an account by name
    pub fn get(&self, name: &str) -> Result<AccountRecord> {
        let mut config = self.catalog()?;
        config
            .accounts
            .remove(name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }

    /// Add or replace an account
    ///
    /// The first account added becomes the default. Returns the default
    /// account name after the change.
    pub fn add(&self, name: &str, record: AccountRecord) -> Result<String> {
        check_account_name(name)?;
        record.validate()?;

        let mut config = self.catalog()?;
        config.accounts.insert(name.to_string(), record);
        if config.default_account.is_empty() {
            config.default_account = name.to_string();
        }

        self.config_manager.save(&config)?;
        Ok(config.default_account)
    }

    /// Make `name` the default account
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut config = self.catalog()?;
        if !config.accounts.contains_key(name) {
            return Err(Error::AccountNotFound(name.to_string()));
        }

        config.default_account = name.to_string();
        self.config_manager.save(&config)
    }

    /// Remove an account
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.catalog()?;
        if config.accounts.remove(name).is_none() {
            return Err(Error::AccountNotFound(name.to_string()));
        }

        if config.default_account == name {
            config.default_account.clear();
        }

        self.config_manager.save(&config)
    }

    /// Name of the default account, if any
    pub fn default_account(&self) -> Result<Option<String>> {
        let config = self.catalog()?;
        Ok(Some(config.default_account).filter(|name| !name.is_empty()))
    }

    /// Pick the explicitly named account or fall back to the default
    pub fn resolve_name(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit.filter(|n| !n.is_empty()) {
            return Ok(name.to_string());
        }

        self.default_account()?.ok_or_else(|| {
            Error::Config(
                "No account specified and no default account configured \
                 (e.g. azbutils connect myaccount)"
                    .into(),
            )
        })
    }
}

/// Values supplied up front to skip the matching prompts
#[derive(Debug, Clone, Default)]
pub struct SetupPreset {
    pub auth_method: Option<AuthMethod>,
    pub service_url: Option<String>,
}

/// Outcome of an interactive account setup
#[derive(Debug, Clone)]
pub struct AccountSetup {
    /// The record to store
    pub record: AccountRecord,
    /// Environment variables the user must export before connecting
    pub required_variables: Vec<String>,
}

impl AccountSetup {
    /// Ask for whatever `preset` leaves open and build a record for `name`
    pub fn run(name: &str, prompter: &dyn Prompter, preset: SetupPreset) -> Result<Self> {
        check_account_name(name)?;

        let auth_method = match preset.auth_method {
            Some(method) => method,
            None => {
                let options: Vec<String> = AuthMethod::ALL
                    .iter()
                    .map(|m| format!("{:<18} {}", m.as_str(), m.description()))
                    .collect();
                let options: Vec<&str> = options.iter().map(String::as_str).collect();
                let index = prompter.select("Choose auth method", &options, 0)?;
                *AuthMethod::ALL
                    .get(index)
                    .ok_or_else(|| Error::Prompt(format!("No auth method at index {index}")))?
            }
        };

        let mut record = AccountRecord::new(auth_method).with_account_name(name);

        if auth_method.needs_service_url() {
            let url = match preset.service_url {
                Some(url) => url,
                None => {
                    let default_url = default_service_url(name);
                    prompter.input("Service URL", Some(&default_url))?
                }
            };
            record = record.with_service_url(url.trim());
        } else if let Some(url) = preset.service_url {
            record = record.with_service_url(url.trim());
        }

        record.validate()?;

        Ok(Self {
            required_variables: required_variables(name, auth_method),
            record,
        })
    }
}
