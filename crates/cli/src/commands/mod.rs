//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations. Every
//! command receives its own parsed arguments plus the shared output settings;
//! there is no global flag state.

use clap::{Parser, Subcommand};

use azb_blob::AzureBlobClient;
use azb_core::{AccountManager, ProcessEnv};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod account;
mod cat;
mod completions;
mod connect;
mod cp;
mod ls;
mod version;

/// azbutils - gsutil-like CLI for Azure Blob Storage
///
/// Lists, copies and reads blobs across several named storage accounts.
/// Locators use az://ACCOUNT//CONTAINER[/PATH] or
/// https://ACCOUNT.blob.core.windows.net/CONTAINER[/PATH].
#[derive(Parser, Debug)]
#[command(name = "azbutils")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List blobs in a container or virtual directory
    Ls(ls::LsArgs),

    /// Copy files or directories to blob storage, or a blob to a local file
    Cp(cp::CpArgs),

    /// Print the contents of a blob or save it to a local file
    Cat(cat::CatArgs),

    /// Connect to a storage account and verify the connection
    Connect(connect::ConnectArgs),

    /// Manage storage accounts
    #[command(subcommand)]
    Account(account::AccountCommands),

    /// Print the version of azbutils
    Version,

    /// Generate a shell completion script
    Completion(completions::CompletionArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Cp(args) => cp::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
        Commands::Connect(args) => connect::execute(args, output_config).await,
        Commands::Account(cmd) => account::execute(cmd, output_config),
        Commands::Version => version::execute(output_config),
        Commands::Completion(args) => completions::execute(args),
    }
}

/// Load the account catalog from its default location
fn account_manager(formatter: &Formatter) -> Result<AccountManager, ExitCode> {
    AccountManager::new().map_err(|e| formatter.fail("Failed to load accounts", &e))
}

/// Build an authenticated client for `account`, reporting failures
fn open_client(account: &str, formatter: &Formatter) -> Result<AzureBlobClient, ExitCode> {
    let manager = account_manager(formatter)?;
    azb_blob::open_account(account, &manager, &ProcessEnv)
        .map_err(|e| formatter.fail(&format!("Cannot open account '{account}'"), &e))
}
