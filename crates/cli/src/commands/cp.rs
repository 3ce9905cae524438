//! cp command - Copy files to and from blob storage
//!
//! Uploads a local file or directory tree to a container, or downloads a
//! single blob to the local filesystem. Directory uploads run one file at a
//! time in sorted walk order and stop at the first failure.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use azb_core::{BlobStore, Error, Location, is_remote, parse};

use super::open_client;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Copy files to blob storage, or a blob to a local file
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source: local path or blob locator
    pub source: String,

    /// Destination: blob locator or local path
    pub target: String,

    /// Copy a directory recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Only show what would be copied
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Content type for uploaded files (guessed from the extension otherwise)
    #[arg(long)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    files: Vec<CpEntry>,
}

#[derive(Debug, Serialize)]
struct CpEntry {
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
}

/// One planned upload: a local file and the blob it becomes
pub type Upload = (PathBuf, Location);

/// Execute the cp command
pub async fn execute(args: CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    match (is_remote(&args.source), is_remote(&args.target)) {
        (false, true) => upload(&args, &output_config, &formatter).await,
        (true, false) => download(&args, &formatter).await,
        (true, true) => {
            formatter.error("Copying between two remote locations is not supported");
            ExitCode::UsageError
        }
        (false, false) => {
            formatter.error("One of source or target must be a blob locator");
            ExitCode::UsageError
        }
    }
}

async fn upload(args: &CpArgs, output_config: &OutputConfig, formatter: &Formatter) -> ExitCode {
    let target = match parse(&args.target) {
        Ok(location) => location,
        Err(e) => return formatter.fail("Invalid target", &e),
    };

    let src = Path::new(&args.source);
    if !src.exists() {
        return formatter.fail("", &Error::NotFound(src.display().to_string()));
    }
    if src.is_dir() && !args.recursive {
        formatter.error(&format!(
            "{} is a directory (use -r to copy recursively)",
            src.display()
        ));
        return ExitCode::UsageError;
    }

    let plan = match plan_uploads(src, &target) {
        Ok(plan) => plan,
        Err(e) => {
            return formatter.fail(&format!("Failed to read {}", src.display()), &e.into());
        }
    };

    if args.dry_run {
        report_dry_run(&plan, formatter);
        return ExitCode::Success;
    }

    let client = match open_client(&target.account, formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let progress = if plan.len() > 1 {
        Some(ProgressBar::files(output_config, plan.len() as u64))
    } else {
        None
    };

    let mut done = Vec::with_capacity(plan.len());
    for (file, location) in &plan {
        if let Some(bar) = &progress {
            bar.set_message(&location.sub_path);
        }

        match upload_file(&client, file, location, args.content_type.as_deref()).await {
            Ok(entry) => done.push(entry),
            Err(e) => {
                if let Some(bar) = &progress {
                    bar.finish_and_clear();
                }
                return formatter.fail(&format!("Failed to upload {}", file.display()), &e);
            }
        }

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    if formatter.is_json() {
        formatter.json(&CpOutput {
            status: "success",
            files: done,
        });
    } else {
        for entry in &done {
            formatter.println(&format!(
                "{} -> {} ({})",
                entry.source,
                entry.target,
                entry.size_human.as_deref().unwrap_or_default()
            ));
        }
        if done.len() > 1 {
            formatter.success(&format!("Uploaded {} file(s).", done.len()));
        }
    }
    ExitCode::Success
}

async fn upload_file(
    store: &dyn BlobStore,
    file: &Path,
    location: &Location,
    content_type: Option<&str>,
) -> azb_core::Result<CpEntry> {
    let data = tokio::fs::read(file).await?;
    let content_type = content_type.map(str::to_string).or_else(|| {
        mime_guess::from_path(file)
            .first()
            .map(|m| m.essence_str().to_string())
    });

    let info = store
        .put_blob(&location.container, &location.sub_path, data, content_type)
        .await?;

    Ok(CpEntry {
        source: file.display().to_string(),
        target: location.to_string(),
        size_bytes: info.size_bytes,
        size_human: info.size_human,
    })
}

fn report_dry_run(plan: &[Upload], formatter: &Formatter) {
    if formatter.is_json() {
        formatter.json(&CpOutput {
            status: "dry-run",
            files: plan
                .iter()
                .map(|(file, location)| CpEntry {
                    source: file.display().to_string(),
                    target: location.to_string(),
                    size_bytes: None,
                    size_human: None,
                })
                .collect(),
        });
    } else {
        for (file, location) in plan {
            formatter.println(&format!(
                "[dry-run] Would upload {} -> {location}",
                file.display()
            ));
        }
    }
}

/// Work out which blob every local file under `src` is written to
///
/// A single file follows [`Location::blob_name_for`]. A directory is walked
/// in sorted order and each file lands at its path relative to `src`, joined
/// onto the target's sub-path.
pub fn plan_uploads(src: &Path, target: &Location) -> std::io::Result<Vec<Upload>> {
    if src.is_file() {
        let file_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let location = Location {
            sub_path: target.blob_name_for(&file_name),
            ..target.clone()
        };
        return Ok(vec![(src.to_path_buf(), location)]);
    }

    let mut files = Vec::new();
    walk_dir(src, &mut files)?;

    Ok(files
        .into_iter()
        .map(|path| {
            let relative = path
                .strip_prefix(src)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let location = target.join(&relative);
            (path, location)
        })
        .collect())
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk_dir(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

async fn download(args: &CpArgs, formatter: &Formatter) -> ExitCode {
    if args.recursive {
        formatter.error("Recursive download is not supported; copy one blob at a time");
        return ExitCode::UsageError;
    }

    let source = match parse(&args.source) {
        Ok(location) => location,
        Err(e) => return formatter.fail("Invalid source", &e),
    };
    if source.is_dir() {
        return formatter.fail(
            "",
            &Error::InvalidLocatorSyntax(format!("{source} does not name a blob")),
        );
    }

    let dest = local_target(Path::new(&args.target), &source.sub_path);

    if args.dry_run {
        formatter.println(&format!(
            "[dry-run] Would download {source} -> {}",
            dest.display()
        ));
        return ExitCode::Success;
    }

    let client = match open_client(&source.account, formatter) {
        Ok(client) => client,
        Err(code) => return code,
    };

    let data = match client.get_blob(&source.container, &source.sub_path).await {
        Ok(data) => data,
        Err(e) => return formatter.fail(&format!("Failed to download {source}"), &e),
    };
    let size = data.len() as u64;

    if let Err(e) = tokio::fs::write(&dest, data).await {
        return formatter.fail(&format!("Failed to write {}", dest.display()), &e.into());
    }

    let entry = CpEntry {
        source: source.to_string(),
        target: dest.display().to_string(),
        size_bytes: Some(size),
        size_human: Some(humansize::format_size(size, humansize::BINARY)),
    };

    if formatter.is_json() {
        formatter.json(&CpOutput {
            status: "success",
            files: vec![entry],
        });
    } else {
        formatter.println(&format!(
            "{} -> {} ({})",
            entry.source,
            entry.target,
            entry.size_human.as_deref().unwrap_or_default()
        ));
    }
    ExitCode::Success
}

/// Local file a blob is saved to; an existing directory receives the blob's base name
fn local_target(dest: &Path, blob_name: &str) -> PathBuf {
    if dest.is_dir() {
        let base = blob_name.rsplit('/').next().unwrap_or(blob_name);
        dest.join(base)
    } else {
        dest.to_path_buf()
    }
}
