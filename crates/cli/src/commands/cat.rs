//! cat command - Display blob contents
//!
//! Writes the entire content of a blob to stdout, or to a local file with `-o`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use azb_core::{BlobStore, Error, Location, parse};

use super::open_client;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Display blob contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Blob locator: az://ACCOUNT//CONTAINER/BLOB or https://ACCOUNT.blob.core.windows.net/CONTAINER/BLOB
    pub locator: String,

    /// Save the blob to this local file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CatOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let location = match blob_location(&args.locator) {
        Ok(location) => location,
        Err(e) => return formatter.fail("", &e),
    };

    let client = match open_client(&location.account, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    fetch(&client, &location, args.output.as_deref(), &formatter).await
}

/// Parse a locator that must name a single blob
fn blob_location(input: &str) -> azb_core::Result<Location> {
    let location = parse(input)?;
    if location.is_dir() {
        return Err(Error::InvalidLocatorSyntax(format!(
            "{input} does not name a blob"
        )));
    }
    Ok(location)
}

async fn fetch(
    store: &dyn BlobStore,
    location: &Location,
    output: Option<&Path>,
    formatter: &Formatter,
) -> ExitCode {
    let Some(path) = output else {
        let data = match store.get_blob(&location.container, &location.sub_path).await {
            Ok(data) => data,
            Err(e) => return formatter.fail(&format!("Failed to read {location}"), &e),
        };
        // Raw bytes; the formatter would mangle binary content
        if let Err(e) = io::stdout().write_all(&data) {
            return formatter.fail("Failed to write to stdout", &e.into());
        }
        return ExitCode::Success;
    };

    if !formatter.is_json() {
        formatter.println(&format!(
            "Downloading blob '{}' -> {}",
            location.sub_path,
            path.display()
        ));
    }

    let data = match store.get_blob(&location.container, &location.sub_path).await {
        Ok(data) => data,
        Err(e) => return formatter.fail(&format!("Failed to read {location}"), &e),
    };

    if let Err(e) = std::fs::write(path, &data) {
        return formatter.fail(&format!("Failed to write {}", path.display()), &e.into());
    }

    if formatter.is_json() {
        formatter.json(&CatOutput {
            status: "success",
            source: location.to_string(),
            target: path.display().to_string(),
            size_bytes: data.len() as u64,
        });
    } else {
        formatter.success("Blob saved successfully");
    }
    ExitCode::Success
}
