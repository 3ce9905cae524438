//! Locator parsing and rendering
//!
//! Two locator forms address the same blob namespace:
//! - custom scheme: `az://ACCOUNT//CONTAINER[/SUBPATH]`
//! - native service URL: `https://ACCOUNT.blob.core.windows.net/CONTAINER[/SUBPATH]`
//!
//! Both parse into a [`Location`] that remembers which form it came from, so
//! messages can echo the user's own spelling back.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Prefix of the custom locator scheme
pub const SCHEME_PREFIX: &str = "az://";

/// Domain suffix of the native blob service endpoint
pub const SERVICE_DOMAIN: &str = "blob.core.windows.net";

const HTTPS_PREFIX: &str = "https://";

static SERVICE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://([^./]+)\.blob\.core\.windows\.net/([^/?#]+)(?:/(.*))?$")
        .expect("valid regex")
});

/// Which syntax a locator was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginForm {
    /// `az://account//container/path`
    CustomScheme,
    /// `https://account.blob.core.windows.net/container/path`
    ServiceUrl,
}

/// A parsed locator pointing at a container or a blob path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Account name (catalog key)
    pub account: String,
    /// Container name, never empty
    pub container: String,
    /// Blob path inside the container, empty for the container root
    pub sub_path: String,
    /// Form the locator was written in
    pub origin: OriginForm,
}

impl Location {
    /// Create a new Location
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        sub_path: impl Into<String>,
        origin: OriginForm,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            sub_path: sub_path.into(),
            origin,
        }
    }

    /// Render a locator for `blob_name` under the same account and container,
    /// in the form this location was parsed from
    ///
    /// The container root renders without a trailing slash: `az://a//c/` and
    /// `az://a//c` parse to the same location and both render as `az://a//c`.
    pub fn render(&self, blob_name: &str) -> String {
        let base = match self.origin {
            OriginForm::CustomScheme => {
                format!("{SCHEME_PREFIX}{}//{}", self.account, self.container)
            }
            OriginForm::ServiceUrl => format!(
                "{HTTPS_PREFIX}{}.{SERVICE_DOMAIN}/{}",
                self.account, self.container
            ),
        };

        if blob_name.is_empty() {
            base
        } else {
            format!("{base}/{blob_name}")
        }
    }

    /// Whether the location names the container root or a virtual directory
    pub fn is_dir(&self) -> bool {
        self.sub_path.is_empty() || self.sub_path.ends_with('/')
    }

    /// Append a relative path to the sub-path, producing a new Location
    pub fn join(&self, relative: &str) -> Self {
        let relative = relative.trim_start_matches('/');
        let base = self.sub_path.trim_end_matches('/');
        let sub_path = if base.is_empty() {
            relative.to_string()
        } else {
            format!("{base}/{relative}")
        };
        Self {
            sub_path,
            ..self.clone()
        }
    }

    /// Blob name to write a local file called `file_name` to
    ///
    /// A directory-like location receives the file name appended; otherwise the
    /// sub-path is used verbatim.
    pub fn blob_name_for(&self, file_name: &str) -> String {
        if self.is_dir() {
            format!("{}{file_name}", self.sub_path)
        } else {
            self.sub_path.clone()
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&self.sub_path))
    }
}

impl std::str::FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

/// Check whether a string looks like a remote locator rather than a local path
pub fn is_remote(input: &str) -> bool {
    input.starts_with(SCHEME_PREFIX) || input.starts_with(HTTPS_PREFIX)
}

/// Parse a locator string into a [`Location`]
pub fn parse(input: &str) -> Result<Location> {
    if let Some(rest) = input.strip_prefix(SCHEME_PREFIX) {
        return parse_custom_scheme(input, rest);
    }

    if input.starts_with(HTTPS_PREFIX) {
        return parse_service_url(input);
    }

    Err(Error::UnsupportedLocatorFormat(format!(
        "'{input}'. Use {SCHEME_PREFIX}<account>//<container>[/path] or \
         {HTTPS_PREFIX}<account>.{SERVICE_DOMAIN}/<container>[/path]"
    )))
}

fn parse_custom_scheme(input: &str, rest: &str) -> Result<Location> {
    let Some((account, container_path)) = rest.split_once("//") else {
        return Err(Error::InvalidLocatorSyntax(format!(
            "'{input}'. Expected {SCHEME_PREFIX}<account>//<container>[/path]"
        )));
    };

    if account.is_empty() {
        return Err(Error::InvalidLocatorSyntax(format!(
            "'{input}' has no account name"
        )));
    }
    if account.contains('/') {
        return Err(Error::InvalidLocatorSyntax(format!(
            "'{input}': account name must not contain '/'"
        )));
    }

    let (container, sub_path) = container_path
        .split_once('/')
        .unwrap_or((container_path, ""));

    if container.is_empty() {
        return Err(Error::InvalidLocatorSyntax(format!(
            "'{input}' has no container name"
        )));
    }

    Ok(Location::new(
        account,
        container,
        sub_path,
        OriginForm::CustomScheme,
    ))
}

fn parse_service_url(input: &str) -> Result<Location> {
    let captures = SERVICE_URL_RE.captures(input).ok_or_else(|| {
        Error::InvalidLocatorSyntax(format!(
            "'{input}'. Expected {HTTPS_PREFIX}<account>.{SERVICE_DOMAIN}/<container>[/path]"
        ))
    })?;

    let account = &captures[1];
    let container = &captures[2];
    let sub_path = captures.get(3).map_or("", |m| m.as_str());

    Ok(Location::new(
        account,
        container,
        sub_path,
        OriginForm::ServiceUrl,
    ))
}
