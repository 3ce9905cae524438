//! Client factory
//!
//! Builds an [`AzureBlobClient`] from an account record and the credential
//! resolved for it. There is one construction path per auth method and none
//! of them touch the network; SDK failures are wrapped as
//! [`Error::Construction`]. SDK retries are disabled so a failed request
//! surfaces at once and the caller's timeout bounds the whole call.

use azure_core::RetryOptions;
use azure_storage::{CloudLocation, ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::ClientBuilder;
use url::Url;

use azb_core::account::default_service_url;
use azb_core::{
    AccountManager, AccountRecord, CredentialResolver, Error, ResolvedCredential, Result,
    SecretSource,
};

use crate::client::AzureBlobClient;

/// Endpoint and token carried by a SAS URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasEndpoint {
    /// Storage account the URL points at
    pub account: String,
    /// Service endpoint without the query string
    pub endpoint: String,
    /// The shared access signature (the query string)
    pub token: String,
}

/// Build a client for `record` using `credential`
pub fn build_client(record: &AccountRecord, credential: ResolvedCredential) -> Result<AzureBlobClient> {
    if credential.auth_method() != record.auth_method {
        return Err(Error::Construction(format!(
            "Credential for '{}' does not match the declared auth method '{}'",
            credential.auth_method(),
            record.auth_method
        )));
    }

    match credential {
        ResolvedCredential::ConnectionString(conn) => from_connection_string(conn.expose()),
        ResolvedCredential::SharedKey {
            account_name,
            account_key,
        } => {
            let service_url = require_service_url(record)?;
            let credentials =
                StorageCredentials::access_key(account_name.clone(), account_key.expose().to_string());
            bind(account_name, service_url, credentials)
        }
        ResolvedCredential::SasUrl(sas_url) => {
            let sas = split_sas_url(sas_url.expose())?;
            let credentials = StorageCredentials::sas_token(sas.token).map_err(construction)?;
            bind(sas.account, &sas.endpoint, credentials)
        }
        ResolvedCredential::Ambient => {
            let service_url = require_service_url(record)?;
            let account = match &record.account_name {
                Some(name) => name.clone(),
                None => account_from_endpoint(&Url::parse(service_url)?)?,
            };
            let token = azure_identity::create_default_credential().map_err(construction)?;
            bind(account, service_url, StorageCredentials::token_credential(token))
        }
    }
}

/// Load the catalog, resolve secrets for `name` and build its client
///
/// Unlike account management commands, this requires an existing
/// configuration file.
pub fn open_account(
    name: &str,
    accounts: &AccountManager,
    secrets: &dyn SecretSource,
) -> Result<AzureBlobClient> {
    let config = match accounts.config_manager().load() {
        Ok(config) => config,
        Err(Error::ConfigNotFound(path)) => {
            tracing::debug!("No configuration at {}", path.display());
            return Err(Error::AccountNotFound(format!(
                "{name} (no accounts configured; run: azbutils account add {name})"
            )));
        }
        Err(e) => return Err(e),
    };

    let record = config
        .accounts
        .get(name)
        .ok_or_else(|| Error::AccountNotFound(name.to_string()))?;

    let credential = CredentialResolver::new(secrets).resolve(name, record)?;
    let client = build_client(record, credential)?;

    tracing::debug!("Opened account '{name}' at {}", client.endpoint());
    Ok(client.with_timeouts(config.timeouts))
}

/// Split a SAS URL into endpoint, account and token
///
/// The query string is the token. For the public service the endpoint is
/// scheme and host; for a local emulator the account path segment is kept.
pub fn split_sas_url(raw: &str) -> Result<SasEndpoint> {
    // The URL carries a secret, keep it out of error messages
    let url = Url::parse(raw).map_err(|e| Error::Construction(format!("Invalid SAS URL: {e}")))?;

    let token = url
        .query()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::Construction("SAS URL has no signature (empty query string)".into()))?
        .to_string();

    let account = account_from_endpoint(&url)?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::Construction("SAS URL has no host".into()))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let endpoint = if is_local_host(&url) {
        format!("{}://{authority}/{account}", url.scheme())
    } else {
        format!("{}://{authority}", url.scheme())
    };

    Ok(SasEndpoint {
        account,
        endpoint,
        token,
    })
}

/// Storage account name implied by a service endpoint
///
/// The first host label for the public service, the first path segment for an
/// emulator on a local address.
pub fn account_from_endpoint(url: &Url) -> Result<String> {
    let account = if is_local_host(url) {
        url.path_segments()
            .and_then(|mut segments| segments.next())
            .unwrap_or_default()
    } else {
        url.host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or_default()
    };

    if account.is_empty() {
        return Err(Error::Construction(format!(
            "Cannot determine the storage account from endpoint {}://{}",
            url.scheme(),
            url.host_str().unwrap_or_default()
        )));
    }
    Ok(account.to_string())
}

fn is_local_host(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => true,
        Some(url::Host::Domain(domain)) => domain == "localhost",
        None => false,
    }
}

fn from_connection_string(raw: &str) -> Result<AzureBlobClient> {
    let parsed = ConnectionString::new(raw).map_err(construction)?;
    let credentials = parsed.storage_credentials().map_err(construction)?;

    match parsed.blob_endpoint {
        Some(endpoint) => {
            let url = Url::parse(endpoint)
                .map_err(|e| Error::Construction(format!("Invalid BlobEndpoint: {e}")))?;
            let account = match parsed.account_name {
                Some(name) => name.to_string(),
                None => account_from_endpoint(&url)?,
            };
            tracing::debug!("Using custom blob endpoint: {endpoint}");
            bind(account, endpoint, credentials)
        }
        None => {
            let account = parsed.account_name.ok_or_else(|| {
                Error::Construction("Connection string has neither AccountName nor BlobEndpoint".into())
            })?;
            let service = ClientBuilder::new(account, credentials)
                .retry(RetryOptions::none())
                .blob_service_client();
            Ok(AzureBlobClient::new(
                service,
                account,
                default_service_url(account),
            ))
        }
    }
}

fn require_service_url(record: &AccountRecord) -> Result<&str> {
    record.service_url.as_deref().ok_or_else(|| {
        Error::Construction(format!(
            "Auth method '{}' requires a service URL in the account record",
            record.auth_method
        ))
    })
}

fn bind(account: String, endpoint: &str, credentials: StorageCredentials) -> Result<AzureBlobClient> {
    let uri = endpoint.trim_end_matches('/').to_string();
    let location = CloudLocation::Custom {
        account: account.clone(),
        uri: uri.clone(),
    };
    let service = ClientBuilder::with_location(location, credentials)
        .retry(RetryOptions::none())
        .blob_service_client();
    Ok(AzureBlobClient::new(service, account, uri))
}

fn construction(e: azure_core::Error) -> Error {
    Error::Construction(e.to_string())
}
