//! VS Code extension installer library.
//!
//! This crate downloads extension packages from the VS Code marketplace and
//! installs them into editors built on the VS Code codebase by driving the
//! editor's own `--install-extension` CLI. It is used by the `vsix-installer`
//! binary and can be consumed programmatically for testing or custom flows.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Layered configuration from file, environment, and flags
//! - [`digest`] - SHA-256 digest newtype for package pinning
//! - [`error`] - Error taxonomy and exit codes
//! - [`host`] - Host editor invocation
//! - [`identifier`] - `publisher.name` extension identifiers
//! - [`logging`] - Diagnostic logging setup
//! - [`marketplace`] - Marketplace download client
//! - [`output`] - User-facing message formatting
//! - [`package`] - Gzip normalization and package verification
//! - [`session`] - Install and uninstall orchestration
//! - [`staging`] - Temporary package files with guaranteed cleanup

pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod host;
pub mod identifier;
pub mod logging;
pub mod marketplace;
pub mod output;
pub mod package;
pub mod session;
pub mod staging;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
