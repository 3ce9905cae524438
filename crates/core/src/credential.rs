//! Credential resolution
//!
//! Turns an account record into concrete secrets. Every secret is read at use
//! time from a per-account environment variable named after the account:
//!
//! | auth method         | variables                                  |
//! |---------------------|--------------------------------------------|
//! | `connection-string` | `NAME_CONNECTION_STRING`                   |
//! | `shared-key`        | `NAME_ACCOUNT_NAME`, `NAME_ACCOUNT_KEY`    |
//! | `sas`               | `NAME_SAS_URL`                             |
//! | `az-login`          | none, ambient credentials are used         |
//!
//! A missing secret is reported by variable name. The resolver never falls
//! back to a different auth method.

use std::collections::HashMap;

use crate::account::{AccountRecord, AuthMethod};
use crate::error::{Error, Result};

/// Suffix of the connection string variable
pub const CONNECTION_STRING_SUFFIX: &str = "_CONNECTION_STRING";

/// Suffix of the storage account name variable
pub const ACCOUNT_NAME_SUFFIX: &str = "_ACCOUNT_NAME";

/// Suffix of the account key variable
pub const ACCOUNT_KEY_SUFFIX: &str = "_ACCOUNT_KEY";

/// Suffix of the SAS URL variable
pub const SAS_URL_SUFFIX: &str = "_SAS_URL";

/// A secret string that never shows up in debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Where secrets are looked up
pub trait SecretSource {
    /// Value of `variable`, if set
    fn lookup(&self, variable: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl SecretSource for ProcessEnv {
    fn lookup(&self, variable: &str) -> Option<String> {
        std::env::var(variable).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn lookup(&self, variable: &str) -> Option<String> {
        self.get(variable).cloned()
    }
}

/// Secrets resolved for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    /// Raw connection string
    ConnectionString(Secret),
    /// Storage account name and key
    SharedKey {
        account_name: String,
        account_key: Secret,
    },
    /// Service URL carrying a shared access signature
    SasUrl(Secret),
    /// Use ambient credentials when building the client
    Ambient,
}

impl ResolvedCredential {
    /// Auth method this credential satisfies
    pub const fn auth_method(&self) -> AuthMethod {
        match self {
            Self::ConnectionString(_) => AuthMethod::ConnectionString,
            Self::SharedKey { .. } => AuthMethod::SharedKey,
            Self::SasUrl(_) => AuthMethod::SasUrl,
            Self::Ambient => AuthMethod::CliLogin,
        }
    }
}

/// Name of the environment variable holding `suffix` for `account`
pub fn env_var_name(account: &str, suffix: &str) -> String {
    format!("{}{suffix}", account.to_uppercase())
}

/// Environment variables that must be set to use `method` with `account`
pub fn required_variables(account: &str, method: AuthMethod) -> Vec<String> {
    let suffixes: &[&str] = match method {
        AuthMethod::ConnectionString => &[CONNECTION_STRING_SUFFIX],
        AuthMethod::SharedKey => &[ACCOUNT_NAME_SUFFIX, ACCOUNT_KEY_SUFFIX],
        AuthMethod::SasUrl => &[SAS_URL_SUFFIX],
        AuthMethod::CliLogin => &[],
    };
    suffixes
        .iter()
        .map(|suffix| env_var_name(account, suffix))
        .collect()
}

/// Resolves secrets for account records
pub struct CredentialResolver<'a> {
    source: &'a dyn SecretSource,
}

impl<'a> CredentialResolver<'a> {
    /// Create a resolver reading from `source`
    pub fn new(source: &'a dyn SecretSource) -> Self {
        Self { source }
    }

    /// Resolve the secrets `record` declares for the account named `account`
    pub fn resolve(&self, account: &str, record: &AccountRecord) -> Result<ResolvedCredential> {
        tracing::debug!(
            "Resolving credentials for account '{account}' using {}",
            record.auth_method
        );

        match record.auth_method {
            AuthMethod::ConnectionString => {
                let conn = self.require(&env_var_name(account, CONNECTION_STRING_SUFFIX))?;
                Ok(ResolvedCredential::ConnectionString(conn))
            }
            AuthMethod::SharedKey => {
                let name = self.require(&env_var_name(account, ACCOUNT_NAME_SUFFIX))?;
                let key = self.require(&env_var_name(account, ACCOUNT_KEY_SUFFIX))?;
                Ok(ResolvedCredential::SharedKey {
                    account_name: name.expose().to_string(),
                    account_key: key,
                })
            }
            AuthMethod::SasUrl => {
                let url = self.require(&env_var_name(account, SAS_URL_SUFFIX))?;
                Ok(ResolvedCredential::SasUrl(url))
            }
            AuthMethod::CliLogin => Ok(ResolvedCredential::Ambient),
        }
    }

    fn require(&self, variable: &str) -> Result<Secret> {
        match self.source.lookup(variable) {
            Some(value) if !value.trim().is_empty() => {
                tracing::debug!("Found {variable}");
                Ok(Secret::new(value.trim()))
            }
            _ => Err(Error::MissingSecret {
                variable: variable.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(
            env_var_name("prod", CONNECTION_STRING_SUFFIX),
            "PROD_CONNECTION_STRING"
        );
        assert_eq!(env_var_name("MixedCase", SAS_URL_SUFFIX), "MIXEDCASE_SAS_URL");
    }

    #[test]
    fn test_connection_string() {
        let source = env(&[("ACCT_CONNECTION_STRING", "AccountName=acct;AccountKey=k")]);
        let resolver = CredentialResolver::new(&source);
        let record = AccountRecord::new(AuthMethod::ConnectionString);

        let cred = resolver.resolve("acct", &record).unwrap();
        assert_eq!(
            cred,
            ResolvedCredential::ConnectionString(Secret::new("AccountName=acct;AccountKey=k"))
        );
    }

    #[test]
    fn test_connection_string_missing() {
        let source = env(&[]);
        let resolver = CredentialResolver::new(&source);
        let record = AccountRecord::new(AuthMethod::ConnectionString);

        let err = resolver.resolve("acct", &record).unwrap_err();
        assert!(
            matches!(err, Error::MissingSecret { ref variable } if variable == "ACCT_CONNECTION_STRING")
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let source = env(&[("ACCT_SAS_URL", "   ")]);
        let resolver = CredentialResolver::new(&source);
        let record = AccountRecord::new(AuthMethod::SasUrl);

        let err = resolver.resolve("acct", &record).unwrap_err();
        assert!(matches!(err, Error::MissingSecret { ref variable } if variable == "ACCT_SAS_URL"));
    }

    #[test]
    fn test_shared_key_requires_both() {
        let record = AccountRecord::cli_login("acct");
        let record = AccountRecord {
            auth_method: AuthMethod::SharedKey,
            ..record
        };

        let source = env(&[("ACCT_ACCOUNT_KEY", "a2V5")]);
        let err = CredentialResolver::new(&source)
            .resolve("acct", &record)
            .unwrap_err();
        assert!(
            matches!(err, Error::MissingSecret { ref variable } if variable == "ACCT_ACCOUNT_NAME")
        );

        let source = env(&[("ACCT_ACCOUNT_NAME", "storageacct")]);
        let err = CredentialResolver::new(&source)
            .resolve("acct", &record)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing environment variable: ACCT_ACCOUNT_KEY");

        let source = env(&[
            ("ACCT_ACCOUNT_NAME", "storageacct"),
            ("ACCT_ACCOUNT_KEY", "a2V5"),
        ]);
        let cred = CredentialResolver::new(&source)
            .resolve("acct", &record)
            .unwrap();
        assert_eq!(
            cred,
            ResolvedCredential::SharedKey {
                account_name: "storageacct".into(),
                account_key: Secret::new("a2V5"),
            }
        );
    }

    #[test]
    fn test_no_fallback_across_methods() {
        // A connection string is available, but the declared method is SAS
        let source = env(&[("ACCT_CONNECTION_STRING", "AccountName=acct;AccountKey=k")]);
        let record = AccountRecord::new(AuthMethod::SasUrl);

        let err = CredentialResolver::new(&source)
            .resolve("acct", &record)
            .unwrap_err();
        assert!(matches!(err, Error::MissingSecret { ref variable } if variable == "ACCT_SAS_URL"));
    }

    #[test]
    fn test_cli_login_needs_no_secret() {
        let source = env(&[]);
        let cred = CredentialResolver::new(&source)
            .resolve("acct", &AccountRecord::cli_login("acct"))
            .unwrap();
        assert_eq!(cred, ResolvedCredential::Ambient);
        assert_eq!(cred.auth_method(), AuthMethod::CliLogin);
    }

    #[test]
    fn test_bogus_method_never_reaches_resolver() {
        let err = "bogus".parse::<AuthMethod>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedAuthMethod(ref v) if v == "bogus"));
    }

    #[test]
    fn test_required_variables() {
        assert_eq!(
            required_variables("prod", AuthMethod::SharedKey),
            vec!["PROD_ACCOUNT_NAME", "PROD_ACCOUNT_KEY"]
        );
        assert_eq!(
            required_variables("prod", AuthMethod::ConnectionString),
            vec!["PROD_CONNECTION_STRING"]
        );
        assert!(required_variables("prod", AuthMethod::CliLogin).is_empty());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.expose(), "hunter2");
    }
}
