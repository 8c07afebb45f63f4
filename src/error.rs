//! Error types for the extension installer.
//!
//! Every failure the pipeline can report maps to one [`InstallerError`]
//! variant. Each variant carries a distinct process exit code so that scripts
//! driving the CLI can tell a missing extension from a broken host editor
//! without parsing messages.

use camino::Utf8PathBuf;
use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while installing or uninstalling an extension.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The raw identifier is not of the form `publisher.name`.
    #[error("invalid extension identifier {input:?}: {reason}")]
    InvalidIdentifierFormat {
        /// The rejected user input.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// The marketplace could not be reached or the transfer was interrupted.
    #[error("network error fetching {url}: {reason}")]
    NetworkError {
        /// The URL that was requested.
        url: String,
        /// Description of the transport failure.
        reason: String,
    },

    /// The marketplace has no extension under the requested identifier.
    #[error("extension {identifier} not found in the marketplace ({url})")]
    NotFound {
        /// Canonical identifier that was requested.
        identifier: String,
        /// The URL that returned 404.
        url: String,
    },

    /// The marketplace answered with a non-success status other than 404.
    #[error("marketplace returned HTTP {status} for {url}")]
    UpstreamError {
        /// The HTTP status code returned.
        status: u16,
        /// The URL that was requested.
        url: String,
    },

    /// The downloaded payload could not be decoded into a usable package.
    #[error("corrupt package: {reason}")]
    CorruptPackage {
        /// Description of what failed to decode or verify.
        reason: String,
    },

    /// The host editor command could not be found on the execution path.
    #[error("host editor command `{command}` not found; is it installed and on PATH?")]
    HostToolMissing {
        /// The command that could not be spawned.
        command: String,
    },

    /// The host editor ran but reported failure.
    #[error("host editor `{command}` failed ({status}): {diagnostics}")]
    HostToolFailed {
        /// The command that was run.
        command: String,
        /// Exit status reported by the host editor.
        status: HostExit,
        /// Diagnostic output captured from the host editor.
        diagnostics: String,
    },

    /// The configuration file or an override could not be used.
    #[error("invalid configuration at {path}: {reason}")]
    Config {
        /// Path of the configuration source (or the environment variable name).
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Coarse classification of an [`InstallerError`], used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`InstallerError::InvalidIdentifierFormat`].
    InvalidIdentifierFormat,
    /// See [`InstallerError::NetworkError`].
    NetworkError,
    /// See [`InstallerError::NotFound`].
    NotFound,
    /// See [`InstallerError::UpstreamError`].
    UpstreamError,
    /// See [`InstallerError::CorruptPackage`].
    CorruptPackage,
    /// See [`InstallerError::HostToolMissing`].
    HostToolMissing,
    /// See [`InstallerError::HostToolFailed`].
    HostToolFailed,
    /// Configuration, I/O, and other local failures.
    Internal,
}

impl ErrorKind {
    /// Return the process exit code reported for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::error::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::NotFound.exit_code(), 12);
    /// assert_eq!(ErrorKind::Internal.exit_code(), 1);
    /// ```
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidIdentifierFormat => 10,
            Self::NetworkError => 11,
            Self::NotFound => 12,
            Self::UpstreamError => 13,
            Self::CorruptPackage => 14,
            Self::HostToolMissing => 15,
            Self::HostToolFailed => 16,
            Self::Internal => 1,
        }
    }
}

impl InstallerError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifierFormat { .. } => ErrorKind::InvalidIdentifierFormat,
            Self::NetworkError { .. } => ErrorKind::NetworkError,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UpstreamError { .. } => ErrorKind::UpstreamError,
            Self::CorruptPackage { .. } => ErrorKind::CorruptPackage,
            Self::HostToolMissing { .. } => ErrorKind::HostToolMissing,
            Self::HostToolFailed { .. } => ErrorKind::HostToolFailed,
            Self::Config { .. } | Self::Io(_) => ErrorKind::Internal,
            #[cfg(any(test, feature = "test-support"))]
            Self::StubMismatch { .. } => ErrorKind::Internal,
        }
    }

    /// Return the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// Return true when the failure originates in the host editor rather
    /// than in this tool.
    #[must_use]
    pub const fn is_host_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::HostToolMissing | ErrorKind::HostToolFailed
        )
    }

    /// Build a [`InstallerError::CorruptPackage`] from any displayable reason.
    pub fn corrupt(reason: impl fmt::Display) -> Self {
        Self::CorruptPackage {
            reason: reason.to_string(),
        }
    }
}

/// Exit status of a host editor invocation.
///
/// Wraps [`ExitStatus`] so that signal terminations without a code still
/// render sensibly in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostExit(ExitStatus);

impl HostExit {
    /// Return the numeric exit code, if the process exited normally.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.0.code()
    }
}

impl From<ExitStatus> for HostExit {
    fn from(status: ExitStatus) -> Self {
        Self(status)
    }
}

impl fmt::Display for HostExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.code() {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
