//! Host editor invocation.
//!
//! The host editor (Cursor, VSCodium, or any other VS Code-compatible build)
//! performs the actual installation. This module runs its CLI through the
//! [`CommandExecutor`] seam and turns its exit status into either success or a
//! host-attributed [`InstallerError`].

use crate::error::{HostExit, InstallerError, Result};
use crate::identifier::ExtensionIdentifier;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};

/// Host editor command used when none is configured.
pub const DEFAULT_EDITOR: &str = "cursor";

const INSTALL_FLAG: &str = "--install-extension";
const UNINSTALL_FLAG: &str = "--uninstall-extension";

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vsix_installer::host::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("cursor", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => InstallerError::HostToolMissing {
                    command: cmd.to_owned(),
                },
                _ => InstallerError::from(err),
            })
    }
}

/// What to ask the host editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction<'a> {
    /// Install the package staged at the given path.
    Install(&'a Path),
    /// Uninstall the extension with the given identifier.
    Uninstall(&'a ExtensionIdentifier),
}

/// The host editor CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEditor {
    command: String,
}

impl HostEditor {
    /// Create a host editor driven by `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The command used to reach the host editor.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Render the arguments passed for `action`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::host::{HostAction, HostEditor};
    /// use vsix_installer::identifier::ExtensionIdentifier;
    ///
    /// let editor = HostEditor::new("codium");
    /// let id = ExtensionIdentifier::parse("bierner.markdown-emoji")?;
    /// assert_eq!(
    ///     editor.arguments(&HostAction::Uninstall(&id)),
    ///     vec!["--uninstall-extension".to_owned(), "bierner.markdown-emoji".to_owned()],
    /// );
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    #[must_use]
    pub fn arguments(&self, action: &HostAction<'_>) -> Vec<String> {
        match action {
            HostAction::Install(path) => {
                vec![INSTALL_FLAG.to_owned(), path.display().to_string()]
            }
            HostAction::Uninstall(id) => vec![UNINSTALL_FLAG.to_owned(), id.to_string()],
        }
    }

    /// Render the full command line for `action`, for display.
    #[must_use]
    pub fn command_line(&self, action: &HostAction<'_>) -> String {
        let mut parts = vec![self.command.clone()];
        parts.extend(self.arguments(action));
        parts.join(" ")
    }

    /// Run the host editor for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::HostToolMissing`] if the command cannot be
    /// found, and [`InstallerError::HostToolFailed`] if it exits unsuccessfully.
    pub fn invoke(&self, executor: &dyn CommandExecutor, action: &HostAction<'_>) -> Result<()> {
        let arguments = self.arguments(action);
        let args: Vec<&str> = arguments.iter().map(String::as_str).collect();
        debug!("running host editor: {}", self.command_line(action));

        let output = executor.run(&self.command, &args).map_err(|err| match err {
            InstallerError::Io(io) if io.kind() == ErrorKind::NotFound => {
                InstallerError::HostToolMissing {
                    command: self.command.clone(),
                }
            }
            other => other,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            info!("{}: {}", self.command, stdout.trim());
        }

        if output.status.success() {
            return Ok(());
        }

        Err(InstallerError::HostToolFailed {
            command: self.command.clone(),
            status: HostExit::from(output.status),
            diagnostics: diagnostics(&output),
        })
    }
}

impl Default for HostEditor {
    fn default() -> Self {
        Self::new(DEFAULT_EDITOR)
    }
}

/// Prefer stderr; some editors report failures on stdout only.
fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no diagnostic output".to_owned()
    } else {
        trimmed.to_owned()
    }
}
