//! Install and uninstall orchestration.
//!
//! A [`Session`] runs one operation end to end:
//!
//! ```text
//! Parsing -> Fetching -> Normalizing -> Verifying -> Staging -> Invoking -> Done
//! ```
//!
//! Uninstall skips straight from parsing to invoking and never touches the
//! marketplace. Every failure surfaces as an [`OperationOutcome`] carrying the
//! exit code for its error kind; the staged package (if any) is gone by the
//! time the outcome is returned.

use crate::error::{InstallerError, Result};
use crate::host::{CommandExecutor, HostAction, HostEditor};
use crate::identifier::ExtensionIdentifier;
use crate::marketplace::MarketplaceClient;
use crate::output::{DryRunPlan, installed_message, uninstalled_message};
use crate::package::{self, VerificationPolicy};
use crate::staging::{StagedPackage, staged_filename};
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

/// The operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    /// Download a package and hand it to the host editor.
    Install,
    /// Ask the host editor to remove an extension.
    Uninstall,
}

impl Subcommand {
    /// Lower-case name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validating the raw identifier.
    Parsing,
    /// Downloading the package.
    Fetching,
    /// Stripping transfer framing.
    Normalizing,
    /// Checking the package before it is staged.
    Verifying,
    /// Writing the package to a temporary file.
    Staging,
    /// Running the host editor.
    Invoking,
    /// Finished successfully.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsing => "parsing",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Verifying => "verifying",
            Self::Staging => "staging",
            Self::Invoking => "invoking",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Whether an operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// The operation completed.
    Success,
    /// The operation failed; see the exit code and message.
    Failure,
}

/// Terminal result of one operation, handed to the process boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    /// Success or failure.
    pub status: OutcomeStatus,
    /// Process exit code; 0 on success.
    pub exit_code: i32,
    /// Human-readable summary.
    pub message: String,
}

impl OperationOutcome {
    /// A successful outcome with `message`.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            exit_code: 0,
            message: message.into(),
        }
    }

    /// A failed outcome describing `err`.
    #[must_use]
    pub fn failure(err: &InstallerError) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            exit_code: err.exit_code(),
            message: err.to_string(),
        }
    }

    /// Return true for [`OutcomeStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Per-run options beyond the collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// How downloaded packages are checked.
    pub policy: VerificationPolicy,
    /// Version to install instead of the latest.
    pub pin: Option<String>,
}

/// Sequences parsing, download, staging, and host invocation.
pub struct Session<'a> {
    marketplace: &'a dyn MarketplaceClient,
    executor: &'a dyn CommandExecutor,
    editor: &'a HostEditor,
    options: SessionOptions,
}

impl<'a> Session<'a> {
    /// Create a session with default options.
    #[must_use]
    pub fn new(
        marketplace: &'a dyn MarketplaceClient,
        executor: &'a dyn CommandExecutor,
        editor: &'a HostEditor,
    ) -> Self {
        Self {
            marketplace,
            executor,
            editor,
            options: SessionOptions::default(),
        }
    }

    /// Replace the session options.
    #[must_use]
    pub fn with_options(self, options: SessionOptions) -> Self {
        Self { options, ..self }
    }

    /// Run `subcommand` for the raw identifier `raw`.
    ///
    /// Never panics on user or environment errors; every failure becomes a
    /// [`OutcomeStatus::Failure`] outcome.
    pub fn run(&self, subcommand: Subcommand, raw: &str) -> OperationOutcome {
        match self.execute(subcommand, raw) {
            Ok(message) => {
                debug!("{subcommand} {raw}: {}", Stage::Done);
                OperationOutcome::success(message)
            }
            Err(err) => {
                debug!("{subcommand} {raw} failed: {err:?}");
                OperationOutcome::failure(&err)
            }
        }
    }

    /// Describe what `run` would do, without network access or host
    /// invocation.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidIdentifierFormat`] for a malformed
    /// identifier or pinned version.
    pub fn plan(&self, subcommand: Subcommand, raw: &str) -> Result<DryRunPlan> {
        let id = self.parse(subcommand, raw)?;
        let (download_url, command_line) = match subcommand {
            Subcommand::Install => {
                let staged = PathBuf::from("<staging-dir>").join(staged_filename(&id));
                (
                    Some(self.marketplace.download_url(&id)),
                    self.editor.command_line(&HostAction::Install(&staged)),
                )
            }
            Subcommand::Uninstall => (
                None,
                self.editor.command_line(&HostAction::Uninstall(&id)),
            ),
        };
        Ok(DryRunPlan {
            operation: subcommand.as_str(),
            identifier: id.to_string(),
            download_url,
            command_line,
        })
    }

    fn execute(&self, subcommand: Subcommand, raw: &str) -> Result<String> {
        let id = self.parse(subcommand, raw)?;
        match subcommand {
            Subcommand::Install => self.install(&id),
            Subcommand::Uninstall => self.uninstall(&id),
        }
    }

    fn parse(&self, subcommand: Subcommand, raw: &str) -> Result<ExtensionIdentifier> {
        debug!("{subcommand} {raw}: {}", Stage::Parsing);
        let id = ExtensionIdentifier::parse(raw)?;
        match (subcommand, self.options.pin.as_deref()) {
            (Subcommand::Install, Some(version)) => id.with_version(version),
            _ => Ok(id),
        }
    }

    fn install(&self, id: &ExtensionIdentifier) -> Result<String> {
        enter(Stage::Fetching, id);
        let fetched = self.marketplace.fetch(id)?;

        enter(Stage::Normalizing, id);
        let bytes = package::normalize(&fetched)?;

        enter(Stage::Verifying, id);
        let verified = package::verify(bytes, id, &self.options.policy)?;
        if let Some(version) = &verified.version {
            info!("{id} package declares version {version}");
        }

        enter(Stage::Staging, id);
        let staged = StagedPackage::create(id, &verified.bytes)?;

        enter(Stage::Invoking, id);
        self.editor
            .invoke(self.executor, &HostAction::Install(staged.path()))?;
        drop(staged);

        Ok(installed_message(id))
    }

    fn uninstall(&self, id: &ExtensionIdentifier) -> Result<String> {
        enter(Stage::Invoking, id);
        self.editor
            .invoke(self.executor, &HostAction::Uninstall(id))?;
        Ok(uninstalled_message(id))
    }
}

fn enter(stage: Stage, id: &ExtensionIdentifier) {
    debug!("{id}: {stage}");
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
