//! connect command - Verify access to a storage account
//!
//! Sets the account up first when it is not configured yet (or when `--reset`
//! is given), then builds a client from the environment and lists the first
//! page of containers.

use clap::Args;
use serde::Serialize;

use azb_core::{
    AccountManager, AccountRecord, AccountSetup, AuthMethod, Error, ProcessEnv, SetupPreset,
    probe, required_variables,
};

use super::account::{export_hint, parse_auth_method};
use super::account_manager;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};
use crate::prompt::TerminalPrompter;

/// Connect to a storage account and verify the connection
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Account name (defaults to the default account)
    pub name: Option<String>,

    /// Run the account setup again even if the account exists
    #[arg(long)]
    pub reset: bool,

    /// Set the account up for the ambient Azure login (az login)
    #[arg(long, conflicts_with = "auth_method")]
    pub use_az_login: bool,

    /// Auth method used when the account is set up
    #[arg(long, value_parser = parse_auth_method)]
    pub auth_method: Option<AuthMethod>,

    /// Service URL used when the account is set up
    #[arg(long)]
    pub service_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConnectOutput {
    success: bool,
    account: String,
    endpoint: String,
    containers: Vec<String>,
    more_containers: bool,
}

/// Execute the connect command
pub async fn execute(args: ConnectArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let manager = match account_manager(&formatter) {
        Ok(manager) => manager,
        Err(code) => return code,
    };

    let name = match manager.resolve_name(args.name.as_deref()) {
        Ok(name) => name,
        Err(e) => return formatter.fail("", &e),
    };

    let configured = match manager.get(&name) {
        Ok(_) => true,
        Err(Error::AccountNotFound(_)) => false,
        Err(e) => return formatter.fail("Failed to load accounts", &e),
    };

    if !configured || args.reset {
        if let Err(e) = set_up(&name, &args, &manager, &formatter) {
            return formatter.fail(&format!("Account setup for '{name}' failed"), &e);
        }
    }

    let client = match azb_blob::open_account(&name, &manager, &ProcessEnv) {
        Ok(client) => client,
        Err(e) => return formatter.fail(&format!("Cannot open account '{name}'"), &e),
    };

    let spinner = ProgressBar::spinner(&output_config, "Testing connection...");
    let result = probe(&client, client.timeouts().metadata()).await;
    spinner.finish_and_clear();

    let page = match result {
        Ok(page) => page,
        Err(e) => return formatter.fail(&format!("Cannot connect to '{name}'"), &e),
    };

    if formatter.is_json() {
        formatter.json(&ConnectOutput {
            success: true,
            account: name,
            endpoint: client.endpoint().to_string(),
            containers: page.containers.into_iter().map(|c| c.name).collect(),
            more_containers: page.more,
        });
    } else {
        formatter.success(&format!("Successfully connected to account '{name}'"));
    }
    ExitCode::Success
}

/// Create or replace the record for `name` and tell the user what to export
fn set_up(
    name: &str,
    args: &ConnectArgs,
    manager: &AccountManager,
    formatter: &Formatter,
) -> azb_core::Result<()> {
    let (record, variables) = if args.use_az_login {
        let mut record = AccountRecord::cli_login(name);
        if let Some(url) = &args.service_url {
            record = record.with_service_url(url.trim());
        }
        (record, required_variables(name, AuthMethod::CliLogin))
    } else {
        let preset = SetupPreset {
            auth_method: args.auth_method,
            service_url: args.service_url.clone(),
        };
        let setup = AccountSetup::run(name, &TerminalPrompter::new(), preset)?;
        (setup.record, setup.required_variables)
    };

    tracing::debug!("Saving {} record for '{name}'", record.auth_method);
    manager.add(name, record)?;

    if !formatter.is_json() {
        formatter.success(&format!("Configured account '{name}'"));
        if let Some(hint) = export_hint(&variables) {
            formatter.println(&hint);
        }
    }
    Ok(())
}
