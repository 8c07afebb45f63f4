//! Output formatting for the installer CLI.
//!
//! User-facing progress and result lines are kept apart from log records:
//! they are written directly to the supplied stream, never through `log`.

use crate::identifier::ExtensionIdentifier;
use std::fmt;
use std::io::Write;

/// Write a single line to `stream`, ignoring write failures.
pub fn write_stderr_line(stream: &mut dyn Write, message: impl fmt::Display) {
    if writeln!(stream, "{message}").is_err() {
        // Best-effort output; a closed stream is not worth failing over.
    }
}

/// Format the message reported after a successful install.
///
/// # Example
///
/// ```
/// use vsix_installer::identifier::ExtensionIdentifier;
/// use vsix_installer::output::installed_message;
///
/// let id = ExtensionIdentifier::parse("vv13.markdown-auto-preview")?;
/// assert_eq!(installed_message(&id), "Installed vv13.markdown-auto-preview");
/// # Ok::<(), vsix_installer::error::InstallerError>(())
/// ```
#[must_use]
pub fn installed_message(id: &ExtensionIdentifier) -> String {
    format!("Installed {id}")
}

/// Format the message reported after a successful uninstall.
#[must_use]
pub fn uninstalled_message(id: &ExtensionIdentifier) -> String {
    format!("Uninstalled {id}")
}

/// Format an error line for the terminal.
#[must_use]
pub fn error_line(message: &str) -> String {
    format!("error: {message}")
}

/// What a dry run would have done.
///
/// # Example
///
/// ```
/// use vsix_installer::output::DryRunPlan;
///
/// let plan = DryRunPlan {
///     operation: "uninstall",
///     identifier: "bierner.markdown-emoji".to_owned(),
///     download_url: None,
///     command_line: "cursor --uninstall-extension bierner.markdown-emoji".to_owned(),
/// };
///
/// let output = plan.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("--uninstall-extension"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunPlan {
    /// The operation requested (`install` or `uninstall`).
    pub operation: &'static str,
    /// Canonical extension identifier.
    pub identifier: String,
    /// Package URL that would be fetched, for installs.
    pub download_url: Option<String>,
    /// Host editor command line that would run.
    pub command_line: String,
}

impl DryRunPlan {
    /// Format the plan for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - nothing will be downloaded or installed".to_owned(),
            String::new(),
            format!("Operation: {}", self.operation),
            format!("Extension: {}", self.identifier),
        ];
        if let Some(url) = &self.download_url {
            lines.push(format!("Download URL: {url}"));
        }
        lines.push(format!("Host command: {}", self.command_line));
        lines.join("\n")
    }
}
