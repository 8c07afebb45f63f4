//! CLI argument definitions for the extension installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::ConfigOverrides;
use crate::digest::Sha256Digest;
use crate::session::Subcommand;
use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser};

/// Install VS Code marketplace extensions into a compatible editor.
#[derive(Parser, Debug)]
#[command(name = "vsix-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install VS Code marketplace extensions into a compatible editor.\n\n",
    "Editors built on the VS Code codebase (Cursor, VSCodium, and others) often ",
    "cannot reach the Microsoft marketplace directly. This tool downloads the ",
    "extension package itself, strips the gzip framing the marketplace applies, ",
    "checks the package, and hands it to the editor's own --install-extension.",
))]
#[command(after_help = concat!(
    "EXIT CODES:\n",
    "  0   success\n",
    "  1   configuration or local I/O failure\n",
    "  2   invalid command-line usage\n",
    "  10  malformed extension identifier\n",
    "  11  marketplace unreachable\n",
    "  12  extension not found\n",
    "  13  marketplace error response\n",
    "  14  corrupt or mismatched package\n",
    "  15  host editor command not found\n",
    "  16  host editor reported failure\n\n",
    "EXAMPLES:\n",
    "  Install the latest release into Cursor:\n",
    "    $ vsix-installer install vv13.markdown-auto-preview\n\n",
    "  Install a specific version into VSCodium:\n",
    "    $ vsix-installer --editor codium install vv13.markdown-auto-preview --pin 1.0.0\n\n",
    "  Remove an extension:\n",
    "    $ vsix-installer uninstall bierner.markdown-emoji\n\n",
    "  Preview without downloading:\n",
    "    $ vsix-installer install bierner.markdown-emoji --dry-run",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Download an extension and install it into the host editor.
    Install(InstallArgs),

    /// Remove an extension from the host editor.
    Uninstall(UninstallArgs),
}

/// Options accepted before or after the subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Host editor command [default: cursor].
    #[arg(long, global = true, value_name = "CMD")]
    pub editor: Option<String>,

    /// Marketplace gallery API root.
    #[arg(long, global = true, value_name = "URL")]
    pub marketplace_url: Option<String>,

    /// Download timeout in seconds [default: 30].
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Configuration file [default: platform config directory].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Extension identifier, as `publisher.name`.
    #[arg(value_name = "PUBLISHER.NAME")]
    pub extension: String,

    /// Install this version instead of the latest.
    #[arg(long, value_name = "VERSION")]
    pub pin: Option<String>,

    /// Require the package to have this SHA-256 digest.
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<Sha256Digest>,

    /// Show what would be downloaded and run, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the uninstall command.
#[derive(Args, Debug, Clone, Default)]
pub struct UninstallArgs {
    /// Extension identifier, as `publisher.name`.
    #[arg(value_name = "PUBLISHER.NAME")]
    pub extension: String,

    /// Show what would be run, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// The requested operation and its raw identifier.
    #[must_use]
    pub fn operation(&self) -> (Subcommand, &str) {
        match &self.command {
            Command::Install(args) => (Subcommand::Install, &args.extension),
            Command::Uninstall(args) => (Subcommand::Uninstall, &args.extension),
        }
    }

    /// Return true when `--dry-run` was given.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        match &self.command {
            Command::Install(args) => args.dry_run,
            Command::Uninstall(args) => args.dry_run,
        }
    }
}

impl GlobalArgs {
    /// Configuration values supplied on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::cli::GlobalArgs;
    ///
    /// let args = GlobalArgs {
    ///     editor: Some("codium".to_owned()),
    ///     ..GlobalArgs::default()
    /// };
    /// assert_eq!(args.overrides().editor.as_deref(), Some("codium"));
    /// assert!(args.overrides().timeout_secs.is_none());
    /// ```
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            editor: self.editor.clone(),
            marketplace_url: self.marketplace_url.clone(),
            timeout_secs: self.timeout,
        }
    }

    /// Default log filter for the requested verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
