//! Account management commands
//!
//! Accounts are named references to storage endpoints together with the
//! authentication method used to reach them. Secrets are never stored; the
//! commands tell the user which environment variables to export instead.

use clap::Subcommand;
use comfy_table::{ContentArrangement, Table, presets};
use serde::Serialize;

use azb_core::{AccountManager, AccountRecord, AccountSetup, AuthMethod, Error, SetupPreset};

use super::account_manager;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::prompt::TerminalPrompter;

/// Account subcommands for managing storage accounts
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Add or replace a storage account
    Add(AddArgs),

    /// List all configured accounts
    List(ListArgs),

    /// Set the default account
    Default(NameArgs),

    /// Remove an account
    Remove(NameArgs),
}

/// Arguments for the `account add` command
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Account name (also the prefix of its environment variables)
    pub name: String,

    /// Auth method: az-login, connection-string, shared-key or sas (prompted when omitted)
    #[arg(long, value_parser = parse_auth_method)]
    pub auth_method: Option<AuthMethod>,

    /// Service URL, e.g. https://myaccount.blob.core.windows.net (prompted when needed)
    #[arg(long)]
    pub service_url: Option<String>,
}

/// Arguments for the `account list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including endpoints
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments naming a single account
#[derive(clap::Args, Debug)]
pub struct NameArgs {
    /// Account name
    pub name: String,
}

/// Parse an auth method flag value
pub(crate) fn parse_auth_method(value: &str) -> Result<AuthMethod, String> {
    value.parse().map_err(|e: Error| e.to_string())
}

/// JSON output for account list
#[derive(Serialize)]
struct AccountListOutput {
    accounts: Vec<AccountInfo>,
}

/// Account information for output
#[derive(Debug, Serialize)]
struct AccountInfo {
    name: String,
    auth_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_name: Option<String>,
    default: bool,
}

impl AccountInfo {
    fn new(name: &str, record: &AccountRecord, default: bool) -> Self {
        Self {
            name: name.to_string(),
            auth_method: record.auth_method.to_string(),
            service_url: record.service_url.clone(),
            account_name: record.account_name.clone(),
            default,
        }
    }
}

/// JSON output for account add/default/remove operations
#[derive(Serialize)]
struct AccountOperationOutput {
    success: bool,
    account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    required_variables: Vec<String>,
    message: String,
}

/// Execute an account subcommand
pub fn execute(cmd: AccountCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match account_manager(&formatter) {
        Ok(manager) => manager,
        Err(code) => return code,
    };

    match cmd {
        AccountCommands::Add(args) => execute_add(args, &manager, &formatter),
        AccountCommands::List(args) => execute_list(args, &manager, &formatter),
        AccountCommands::Default(args) => execute_default(args, &manager, &formatter),
        AccountCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_add(args: AddArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    let preset = SetupPreset {
        auth_method: args.auth_method,
        service_url: args.service_url,
    };

    let setup = match AccountSetup::run(&args.name, &TerminalPrompter::new(), preset) {
        Ok(setup) => setup,
        Err(e) => return formatter.fail("Account setup failed", &e),
    };

    let default = match manager.add(&args.name, setup.record) {
        Ok(default) => default,
        Err(e) => return formatter.fail("Failed to save account", &e),
    };

    let message = format!("Added account '{}' (default: {default})", args.name);
    if formatter.is_json() {
        formatter.json(&AccountOperationOutput {
            success: true,
            account: args.name,
            default: Some(default),
            required_variables: setup.required_variables,
            message,
        });
    } else {
        formatter.success(&message);
        if let Some(hint) = export_hint(&setup.required_variables) {
            formatter.println(&hint);
        }
    }
    ExitCode::Success
}

fn execute_list(args: ListArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    let (accounts, default) = match manager
        .list()
        .and_then(|accounts| Ok((accounts, manager.default_account()?)))
    {
        Ok(listing) => listing,
        Err(e) => return formatter.fail("Failed to load accounts", &e),
    };

    let infos: Vec<AccountInfo> = accounts
        .iter()
        .map(|(name, record)| AccountInfo::new(name, record, default.as_deref() == Some(name)))
        .collect();

    if formatter.is_json() {
        formatter.json(&AccountListOutput { accounts: infos });
    } else if infos.is_empty() {
        formatter.println("No accounts configured.");
    } else if args.long {
        formatter.println(&render_table(&infos).to_string());
    } else {
        formatter.println("Accounts:");
        for info in &infos {
            formatter.println(&short_line(info));
        }
    }
    ExitCode::Success
}

fn execute_default(args: NameArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    if let Err(e) = manager.set_default(&args.name) {
        return formatter.fail("Cannot set default account", &e);
    }

    let message = format!("Set '{}' as default account", args.name);
    if formatter.is_json() {
        formatter.json(&AccountOperationOutput {
            success: true,
            default: Some(args.name.clone()),
            account: args.name,
            required_variables: Vec::new(),
            message,
        });
    } else {
        formatter.success(&message);
    }
    ExitCode::Success
}

fn execute_remove(args: NameArgs, manager: &AccountManager, formatter: &Formatter) -> ExitCode {
    if let Err(e) = manager.remove(&args.name) {
        return formatter.fail("Cannot remove account", &e);
    }

    let message = format!("Removed account '{}'", args.name);
    if formatter.is_json() {
        formatter.json(&AccountOperationOutput {
            success: true,
            account: args.name,
            default: None,
            required_variables: Vec::new(),
            message,
        });
    } else {
        formatter.success(&message);
    }
    ExitCode::Success
}

/// Line telling the user which variables to export, if any
pub(crate) fn export_hint(variables: &[String]) -> Option<String> {
    if variables.is_empty() {
        None
    } else {
        Some(format!(
            "Export before connecting: {}",
            variables.join(", ")
        ))
    }
}

fn short_line(info: &AccountInfo) -> String {
    if info.default {
        format!(" - {} (default)", info.name)
    } else {
        format!(" - {}", info.name)
    }
}

fn render_table(infos: &[AccountInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Auth method", "Service URL", "Default"]);

    for info in infos {
        table.add_row(vec![
            info.name.clone(),
            info.auth_method.clone(),
            info.service_url.clone().unwrap_or_else(|| "-".into()),
            if info.default { "*".into() } else { String::new() },
        ]);
    }
    table
}
