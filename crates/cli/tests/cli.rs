//! Offline tests for the azbutils binary
//!
//! Each test runs the built binary with `AZBUTILS_CONFIG_DIR` pointing at its
//! own temporary directory. Nothing here reaches the network.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn run(args: &[&str], config_dir: &Path) -> Output {
    run_with_env(args, config_dir, &[])
}

fn run_with_env(args: &[&str], config_dir: &Path, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_azbutils"));
    cmd.args(args)
        .env("AZBUTILS_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute azbutils")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = run(&["version"], dir.path());

    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        format!("azbutils version: {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_completion_bash() {
    let dir = TempDir::new().unwrap();
    let output = run(&["completion", "bash"], dir.path());

    assert!(output.status.success());
    assert!(stdout(&output).contains("azbutils"));
}

#[test]
fn test_account_add_and_list() {
    let dir = TempDir::new().unwrap();

    let output = run(
        &[
            "account",
            "add",
            "prod",
            "--auth-method",
            "shared-key",
            "--service-url",
            "https://prod.blob.core.windows.net",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(
        stdout(&output).contains("Export before connecting: PROD_ACCOUNT_NAME, PROD_ACCOUNT_KEY")
    );

    let output = run(
        &["account", "add", "edge", "--auth-method", "sas"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run(&["account", "list", "--json"], dir.path());
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let accounts = json["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["name"], "edge");
    assert_eq!(accounts[0]["default"], false);
    assert_eq!(accounts[1]["name"], "prod");
    assert_eq!(accounts[1]["auth_method"], "shared-key");
    assert_eq!(accounts[1]["default"], true);

    let output = run(&["account", "list"], dir.path());
    assert_eq!(stdout(&output), "Accounts:\n - edge\n - prod (default)\n");

    // No secrets reach the file, only references to where they come from
    let config = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(config.contains("auth_method = \"shared-key\""));
    assert!(!config.to_lowercase().contains("account_key"));
}

#[test]
fn test_account_default_and_remove() {
    let dir = TempDir::new().unwrap();
    for name in ["one", "two"] {
        let output = run(
            &["account", "add", name, "--auth-method", "connection-string"],
            dir.path(),
        );
        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    let output = run(&["account", "default", "two"], dir.path());
    assert!(output.status.success());

    let output = run(&["account", "remove", "two"], dir.path());
    assert!(output.status.success());

    let output = run(&["account", "list", "--json"], dir.path());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["accounts"][0]["name"], "one");
    assert_eq!(json["accounts"][0]["default"], false);
}

#[test]
fn test_account_default_missing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let output = run(&["account", "default", "ghost"], dir.path());

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("Account not found: ghost"));
}

#[test]
fn test_account_add_without_terminal_needs_flags() {
    let dir = TempDir::new().unwrap();
    let output = run(&["account", "add", "prod"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("interactive terminal"));
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_account_add_rejects_unknown_method_flag() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &["account", "add", "prod", "--auth-method", "bogus"],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("bogus"));
}

#[test]
fn test_unknown_auth_method_in_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "schema_version = 1\n\n[accounts.prod]\nauth_method = \"bogus\"\n",
    )
    .unwrap();

    let output = run(&["account", "list"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("bogus"));
}

#[test]
fn test_ls_unsupported_scheme() {
    let dir = TempDir::new().unwrap();
    let output = run(&["ls", "ftp://x/y"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Unsupported locator format"));
}

#[test]
fn test_ls_missing_container() {
    let dir = TempDir::new().unwrap();
    let output = run(&["ls", "az://onlyaccount"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Invalid locator"));
}

#[test]
fn test_ls_without_configuration() {
    let dir = TempDir::new().unwrap();
    let output = run(&["ls", "az://ghost//data"], dir.path());

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("azbutils account add ghost"));
}

#[test]
fn test_connect_reports_missing_variable() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &["account", "add", "prod", "--auth-method", "connection-string"],
        dir.path(),
    );
    assert!(output.status.success());

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_azbutils"));
    let output = cmd
        .args(["connect", "prod"])
        .env("AZBUTILS_CONFIG_DIR", dir.path())
        .env_remove("PROD_CONNECTION_STRING")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Missing environment variable: PROD_CONNECTION_STRING"));
}

#[test]
fn test_connect_without_default_account() {
    let dir = TempDir::new().unwrap();
    let output = run(&["connect"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("no default account"));
}

#[test]
fn test_cp_dry_run_echoes_locator_form() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let file = data.path().join("a.txt");
    std::fs::write(&file, "hello").unwrap();
    let file_arg = file.to_str().unwrap();

    let output = run(
        &["cp", "-n", file_arg, "az://acct//cont/dir/"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        format!("[dry-run] Would upload {file_arg} -> az://acct//cont/dir/a.txt")
    );

    let output = run(
        &[
            "cp",
            "--dry-run",
            file_arg,
            "https://acct.blob.core.windows.net/cont/dir/",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(
        stdout(&output).ends_with("-> https://acct.blob.core.windows.net/cont/dir/a.txt\n")
    );
}

#[test]
fn test_cp_directory_needs_recursive() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    let output = run(
        &["cp", "-n", data.path().to_str().unwrap(), "az://acct//cont"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("use -r"));
}

#[test]
fn test_cp_directory_dry_run_json() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    std::fs::create_dir(data.path().join("sub")).unwrap();
    std::fs::write(data.path().join("sub/b.txt"), "b").unwrap();
    std::fs::write(data.path().join("a.txt"), "a").unwrap();

    let output = run(
        &[
            "--json",
            "cp",
            "-r",
            "-n",
            data.path().to_str().unwrap(),
            "az://acct//cont/backup",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "dry-run");
    let targets: Vec<&str> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["target"].as_str().unwrap())
        .collect();
    assert_eq!(
        targets,
        vec!["az://acct//cont/backup/a.txt", "az://acct//cont/backup/sub/b.txt"]
    );
}

#[test]
fn test_cp_local_to_local_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = run(&["cp", "a.txt", "b.txt"], dir.path());

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cat_rejects_directory_locator() {
    let dir = TempDir::new().unwrap();
    let output = run(&["cat", "az://acct//cont/dir/"], dir.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("does not name a blob"));
}

#[test]
fn test_account_add_rejects_name_unusable_in_env_var() {
    let dir = TempDir::new().unwrap();
    let output = run(
        &["account", "add", "my-acct", "--auth-method", "connection-string"],
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("my-acct"));
    assert!(!dir.path().join("config.toml").exists());
}
