//! Behaviour-driven tests for install and uninstall sessions.
//!
//! These scenarios drive `Session` with a stub marketplace and a stub host
//! editor, covering the happy install path, marketplace and host failures,
//! and uninstall.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use vsix_installer::host::HostEditor;
use vsix_installer::identifier::ExtensionIdentifier;
use vsix_installer::session::{OperationOutcome, OutcomeStatus, Session, Subcommand};
use vsix_installer::test_utils::{
    RecordedCall, StubExecutor, StubMarketplace, failure_output, success_output, vsix_for,
};

#[derive(Default)]
struct SessionWorld {
    marketplace: RefCell<Option<StubMarketplace>>,
    executor: RefCell<Option<StubExecutor>>,
    requested: RefCell<Option<String>>,
    outcome: RefCell<Option<OperationOutcome>>,
}

impl SessionWorld {
    fn run(&self, subcommand: Subcommand, raw: &str) {
        let marketplace = self.marketplace.borrow();
        let marketplace = marketplace.as_ref().expect("marketplace not set");
        let mut executor = self.executor.borrow_mut();
        let executor = executor.get_or_insert_with(|| StubExecutor::new(Vec::new()));
        let editor = HostEditor::new("cursor");

        let outcome = Session::new(marketplace, &*executor, &editor).run(subcommand, raw);

        self.requested.replace(Some(raw.to_owned()));
        self.outcome.replace(Some(outcome));
    }

    fn outcome(&self) -> OperationOutcome {
        self.outcome.borrow().clone().expect("session has not run")
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.executor
            .borrow()
            .as_ref()
            .map(StubExecutor::calls)
            .unwrap_or_default()
    }

    fn fetch_count(&self) -> usize {
        self.marketplace
            .borrow()
            .as_ref()
            .map_or(0, StubMarketplace::fetch_count)
    }
}

#[fixture]
fn session_world() -> SessionWorld {
    SessionWorld::default()
}

fn parse(raw: &str) -> ExtensionIdentifier {
    ExtensionIdentifier::parse(raw).expect("scenario identifier should parse")
}

#[given("the marketplace serves a gzip-framed package for {raw}")]
fn given_marketplace_serves(session_world: &SessionWorld, raw: String) {
    session_world
        .marketplace
        .replace(Some(StubMarketplace::serving_gzip_vsix(&parse(&raw))));
}

#[given("the marketplace has no package for {raw}")]
fn given_marketplace_not_found(session_world: &SessionWorld, raw: String) {
    session_world
        .marketplace
        .replace(Some(StubMarketplace::not_found(&parse(&raw))));
}

#[given("the marketplace is not expected to be contacted")]
fn given_marketplace_unused(session_world: &SessionWorld) {
    session_world
        .marketplace
        .replace(Some(StubMarketplace::unused()));
}

#[given("the host editor accepts the request")]
fn given_host_accepts(session_world: &SessionWorld) {
    session_world
        .executor
        .replace(Some(StubExecutor::new(vec![Ok(success_output())])));
}

#[given("the host editor fails with {diagnostics}")]
fn given_host_fails(session_world: &SessionWorld, diagnostics: String) {
    session_world
        .executor
        .replace(Some(StubExecutor::new(vec![Ok(failure_output(&diagnostics))])));
}

#[when("install is run for {raw}")]
fn when_install(session_world: &SessionWorld, raw: String) {
    session_world.run(Subcommand::Install, &raw);
}

#[when("uninstall is run for {raw}")]
fn when_uninstall(session_world: &SessionWorld, raw: String) {
    session_world.run(Subcommand::Uninstall, &raw);
}

#[then("the outcome is success")]
fn then_success(session_world: &SessionWorld) {
    let outcome = session_world.outcome();
    assert_eq!(outcome.status, OutcomeStatus::Success, "{outcome:?}");
    assert_eq!(outcome.exit_code, 0);
}

#[then("the outcome is a failure with exit code {code}")]
fn then_failure_with_code(session_world: &SessionWorld, code: i32) {
    let outcome = session_world.outcome();
    assert_eq!(outcome.status, OutcomeStatus::Failure, "{outcome:?}");
    assert_eq!(outcome.exit_code, code, "{outcome:?}");
}

#[then("the outcome message mentions {text}")]
fn then_message_mentions(session_world: &SessionWorld, text: String) {
    let outcome = session_world.outcome();
    assert!(outcome.message.contains(&text), "{}", outcome.message);
}

#[then("the host editor received the plain package")]
fn then_host_received_plain_package(session_world: &SessionWorld) {
    let requested = session_world
        .requested
        .borrow()
        .clone()
        .expect("session has not run");
    let calls = session_world.calls();
    let call = calls.first().expect("host editor was not invoked");
    assert_eq!(call.args.first().map(String::as_str), Some("--install-extension"));
    let (_, bytes) = call.files.first().expect("no package file was passed");
    assert_eq!(bytes, &vsix_for(&parse(&requested)));
}

#[then("the staged package has been removed")]
fn then_staged_package_removed(session_world: &SessionWorld) {
    let calls = session_world.calls();
    let call = calls.first().expect("host editor was not invoked");
    let (path, _) = call.files.first().expect("no package file was passed");
    assert!(!path.exists(), "{} still exists", path.display());
}

#[then("the host editor was not invoked")]
fn then_host_not_invoked(session_world: &SessionWorld) {
    assert!(session_world.calls().is_empty());
}

#[then("the host editor was asked to uninstall {raw}")]
fn then_host_uninstalled(session_world: &SessionWorld, raw: String) {
    let calls = session_world.calls();
    let call = calls.first().expect("host editor was not invoked");
    assert_eq!(call.cmd, "cursor");
    assert_eq!(call.args, vec!["--uninstall-extension".to_owned(), raw]);
}

#[then("the marketplace was not contacted")]
fn then_marketplace_not_contacted(session_world: &SessionWorld) {
    assert_eq!(session_world.fetch_count(), 0);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Install a gzip-framed package from the marketplace"
)]
fn scenario_install_gzip_package(session_world: SessionWorld) {
    let _ = session_world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Install an extension the marketplace does not know"
)]
fn scenario_install_not_found(session_world: SessionWorld) {
    let _ = session_world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Host editor rejects the package"
)]
fn scenario_host_rejects_package(session_world: SessionWorld) {
    let _ = session_world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Uninstall never contacts the marketplace"
)]
fn scenario_uninstall_skips_marketplace(session_world: SessionWorld) {
    let _ = session_world;
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Malformed identifier is rejected before any work"
)]
fn scenario_malformed_identifier(session_world: SessionWorld) {
    let _ = session_world;
}
