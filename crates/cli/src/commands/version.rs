//! version command

use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Debug, Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
}

const VERSION: VersionOutput = VersionOutput {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

/// Print the version
pub fn execute(output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if formatter.is_json() {
        formatter.json(&VERSION);
    } else {
        formatter.println(&format!("{} version: {}", VERSION.name, VERSION.version));
    }
    ExitCode::Success
}
