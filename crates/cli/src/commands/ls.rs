//! ls command - List blobs
//!
//! Lists the blobs in a container or virtual directory. Without `-r` only the
//! immediate children are shown, with deeper paths collapsed into directories.

use clap::Args;
use serde::Serialize;

use azb_core::{BlobInfo, BlobStore, Location, parse};

use super::open_client;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List blobs in a container or virtual directory
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Locator: az://ACCOUNT//CONTAINER[/PATH] or https://ACCOUNT.blob.core.windows.net/CONTAINER[/PATH]
    pub locator: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<BlobInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Summary {
    total_blobs: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[BlobInfo]) -> Self {
        let total_size_bytes = items.iter().filter_map(|i| i.size_bytes).sum();
        Self {
            total_blobs: items.iter().filter(|i| !i.is_dir).count(),
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let location = match parse(&args.locator) {
        Ok(location) => location,
        Err(e) => return formatter.fail("", &e),
    };

    let client = match open_client(&location.account, &formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    list(&client, &location, &args, &formatter).await
}

async fn list(
    store: &dyn BlobStore,
    location: &Location,
    args: &LsArgs,
    formatter: &Formatter,
) -> ExitCode {
    let items = match store
        .list_blobs(&location.container, &location.sub_path, args.recursive)
        .await
    {
        Ok(items) => items,
        Err(e) => return formatter.fail(&format!("Failed to list {location}"), &e),
    };

    let summary = args.summarize.then(|| Summary::of(&items));

    if formatter.is_json() {
        formatter.json(&LsOutput { items, summary });
    } else {
        for item in &items {
            formatter.println(&entry_line(location, item));
        }
        if let Some(summary) = summary {
            formatter.println(&format!(
                "\nTotal: {} blobs, {}",
                summary.total_blobs, summary.total_size_human
            ));
        }
    }

    ExitCode::Success
}

/// One human-readable listing line, echoing the locator form the user typed
fn entry_line(location: &Location, item: &BlobInfo) -> String {
    let date = item
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    let size = if item.is_dir {
        "DIR".to_string()
    } else {
        item.size_human.clone().unwrap_or_else(|| "0 B".to_string())
    };

    format!("[{date}] {size:>10} {}", location.render(&item.name))
}
