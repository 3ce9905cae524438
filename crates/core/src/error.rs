//! Error types for azb-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for azb-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for azb-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Locator has a recognised prefix but a malformed body
    #[error("Invalid locator: {0}")]
    InvalidLocatorSyntax(String),

    /// Locator prefix is neither `az://` nor `https://`
    #[error("Unsupported locator format: {0}")]
    UnsupportedLocatorFormat(String),

    /// Account not present in the catalog
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// A secret required by the declared auth method is unset or empty
    #[error("Missing environment variable: {variable}")]
    MissingSecret { variable: String },

    /// Auth method value outside the supported set
    #[error("Unsupported auth method: {0}")]
    UnsupportedAuthMethod(String),

    /// The storage SDK refused to build a client
    #[error("Failed to create client: {0}")]
    Construction(String),

    /// The connectivity probe failed
    #[error("Connection test failed: {0}")]
    Connectivity(String),

    /// A network call exceeded its bound
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    /// Configuration file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Configuration file exists but cannot be deserialized
    #[error("Invalid configuration file {}: {message}", .path.display())]
    ConfigCorrupt { path: PathBuf, message: String },

    /// Configuration file could not be read or written
    #[error("Failed to access configuration file {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Interactive prompt unavailable or aborted
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error reported by the service
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Container or blob not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidLocatorSyntax(_)
            | Error::UnsupportedLocatorFormat(_)
            | Error::UnsupportedAuthMethod(_)
            | Error::InvalidUrl(_)
            | Error::ConfigNotFound(_)
            | Error::ConfigCorrupt { .. }
            | Error::Config(_)
            | Error::Prompt(_) => 2, // UsageError
            Error::Connectivity(_) | Error::Timeout { .. } | Error::Network(_) => 3, // NetworkError
            Error::MissingSecret { .. } | Error::Construction(_) | Error::Auth(_) => 4, // AuthError
            Error::AccountNotFound(_) | Error::NotFound(_) => 5, // NotFound
            _ => 1, // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidLocatorSyntax("x".into()).exit_code(), 2);
        assert_eq!(Error::UnsupportedLocatorFormat("x".into()).exit_code(), 2);
        assert_eq!(Error::UnsupportedAuthMethod("bogus".into()).exit_code(), 2);
        assert_eq!(Error::ConfigNotFound(PathBuf::from("/tmp/x")).exit_code(), 2);
        assert_eq!(Error::Connectivity("x".into()).exit_code(), 3);
        assert_eq!(
            Error::Timeout {
                operation: "probe".into(),
                after: Duration::from_secs(30)
            }
            .exit_code(),
            3
        );
        assert_eq!(
            Error::MissingSecret {
                variable: "X_SAS_URL".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(Error::Construction("x".into()).exit_code(), 4);
        assert_eq!(Error::AccountNotFound("x".into()).exit_code(), 5);
        assert_eq!(Error::NotFound("x".into()).exit_code(), 5);
        assert_eq!(Error::General("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::AccountNotFound("prod".into());
        assert_eq!(err.to_string(), "Account not found: prod");

        let err = Error::MissingSecret {
            variable: "PROD_ACCOUNT_KEY".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing environment variable: PROD_ACCOUNT_KEY"
        );

        let err = Error::Timeout {
            operation: "list containers".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "list containers timed out after 30s");
    }

    #[test]
    fn test_not_found_differs_from_corrupt() {
        let missing = Error::ConfigNotFound(PathBuf::from("/tmp/config.toml"));
        let corrupt = Error::ConfigCorrupt {
            path: PathBuf::from("/tmp/config.toml"),
            message: "expected `=`".into(),
        };
        assert!(matches!(missing, Error::ConfigNotFound(_)));
        assert!(matches!(corrupt, Error::ConfigCorrupt { .. }));
        assert_ne!(missing.to_string(), corrupt.to_string());
    }
}
