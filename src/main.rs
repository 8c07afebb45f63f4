//! Extension installer CLI entrypoint.
//!
//! This binary installs or uninstalls one marketplace extension per run by
//! driving a VS Code-compatible editor's own extension CLI. The process exit
//! code identifies the failure kind.

use clap::Parser;
use std::io::Write;
use vsix_installer::cli::{Cli, Command};
use vsix_installer::config::Config;
use vsix_installer::host::{CommandExecutor, HostEditor, SystemCommandExecutor};
use vsix_installer::logging;
use vsix_installer::marketplace::{HttpMarketplace, MarketplaceClient};
use vsix_installer::output::{error_line, write_stderr_line};
use vsix_installer::package::VerificationPolicy;
use vsix_installer::session::{OperationOutcome, OutcomeStatus, Session, SessionOptions};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.log_filter());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let exit_code = run(&cli, &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> i32 {
    let config = match Config::resolve(cli.global.config.as_deref(), &cli.global.overrides()) {
        Ok(config) => config,
        Err(err) => return exit_code_for_outcome(&OperationOutcome::failure(&err), true, stderr),
    };
    log::debug!("resolved configuration: {config:?}");

    let marketplace = HttpMarketplace::new(&config.marketplace_url, config.timeout())
        .with_retries(config.retries);
    let editor = HostEditor::new(config.editor.clone());
    let collaborators = Collaborators {
        marketplace: &marketplace,
        executor: &SystemCommandExecutor,
        editor: &editor,
    };
    run_with(cli, &config, &collaborators, stdout, stderr)
}

struct Collaborators<'a> {
    marketplace: &'a dyn MarketplaceClient,
    executor: &'a dyn CommandExecutor,
    editor: &'a HostEditor,
}

fn run_with(
    cli: &Cli,
    config: &Config,
    collaborators: &Collaborators<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    let session = Session::new(
        collaborators.marketplace,
        collaborators.executor,
        collaborators.editor,
    )
    .with_options(session_options(cli, config));
    let (subcommand, raw) = cli.operation();

    if cli.dry_run() {
        return match session.plan(subcommand, raw) {
            Ok(plan) => {
                if writeln!(stdout, "{}", plan.display_text()).is_err() {
                    // Best-effort output; ignore write failures.
                }
                0
            }
            Err(err) => exit_code_for_outcome(&OperationOutcome::failure(&err), true, stderr),
        };
    }

    let outcome = session.run(subcommand, raw);
    exit_code_for_outcome(&outcome, cli.global.quiet, stderr)
}

fn session_options(cli: &Cli, config: &Config) -> SessionOptions {
    let (pin, expected_sha256) = match &cli.command {
        Command::Install(args) => (args.pin.clone(), args.sha256.clone()),
        Command::Uninstall(_) => (None, None),
    };
    SessionOptions {
        policy: VerificationPolicy {
            check_manifest: config.verify_package,
            expected_sha256,
        },
        pin,
    }
}

/// Report `outcome` and return its exit code. Errors are always reported.
fn exit_code_for_outcome(outcome: &OperationOutcome, quiet: bool, stderr: &mut dyn Write) -> i32 {
    match outcome.status {
        OutcomeStatus::Success => {
            if !quiet {
                write_stderr_line(stderr, &outcome.message);
            }
            0
        }
        OutcomeStatus::Failure => {
            write_stderr_line(stderr, error_line(&outcome.message));
            outcome.exit_code
        }
    }
}
