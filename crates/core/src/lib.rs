//! azb-core: Core library for the azbutils Azure Blob Storage CLI
//!
//! This crate provides the core functionality for azbutils, including:
//! - Locator parsing and rendering
//! - Account catalog persistence and interactive account setup
//! - Credential resolution from the environment
//! - BlobStore trait and the connectivity prober
//!
//! This crate is designed to be independent of the Azure SDK, so everything
//! here can be tested without a network or a terminal.

pub mod account;
pub mod config;
pub mod credential;
pub mod error;
pub mod locator;
pub mod probe;
pub mod prompt;
pub mod timeout;
pub mod traits;

pub use account::{AccountManager, AccountRecord, AccountSetup, AuthMethod, SetupPreset};
pub use config::{Config, ConfigManager, TimeoutConfig};
pub use credential::{
    CredentialResolver, ProcessEnv, ResolvedCredential, Secret, SecretSource, required_variables,
};
pub use error::{Error, Result};
pub use locator::{Location, OriginForm, is_remote, parse};
pub use probe::probe;
pub use prompt::{Prompter, ScriptedPrompter};
pub use timeout::with_timeout;
pub use traits::{BlobInfo, BlobStore, ContainerPage};
