//! Shared test utilities for the installer crate.
//!
//! Gated behind `cfg(test)` and the `test-support` feature so integration
//! tests can drive the session without a network or a real host editor.

use crate::config::ENV_OVERRIDES;
use crate::error::{InstallerError, Result};
use crate::host::CommandExecutor;
use crate::identifier::ExtensionIdentifier;
use crate::marketplace::{ContentEncoding, FetchResult, MarketplaceClient, download_url};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{ExitStatus, Output};

/// Gallery root used by [`StubMarketplace`] when rendering URLs.
pub const STUB_MARKETPLACE_URL: &str = "https://marketplace.test/_apis/public/gallery";

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Builds a minimal VSIX archive whose manifest names `publisher.name`.
///
/// Entry timestamps are fixed, so equal arguments give equal bytes.
///
/// # Panics
///
/// Panics if the in-memory zip writer fails, which indicates a broken test
/// environment.
#[must_use]
pub fn vsix_bytes(publisher: &str, name: &str, version: &str) -> Vec<u8> {
    let manifest = serde_json::json!({
        "publisher": publisher,
        "name": name,
        "version": version,
        "engines": { "vscode": "^1.60.0" },
    });
    let options = || {
        zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .last_modified_time(zip::DateTime::default())
    };

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("extension.vsixmanifest", options())
        .expect("start vsixmanifest entry");
    writer
        .write_all(b"<PackageManifest Version=\"2.0.0\"/>")
        .expect("write vsixmanifest");
    writer
        .start_file("extension/package.json", options())
        .expect("start package.json entry");
    writer
        .write_all(manifest.to_string().as_bytes())
        .expect("write package.json");
    writer.finish().expect("finish zip").into_inner()
}

/// Builds a VSIX archive for `id` at version `1.0.0`.
#[must_use]
pub fn vsix_for(id: &ExtensionIdentifier) -> Vec<u8> {
    vsix_bytes(id.publisher(), id.name(), "1.0.0")
}

/// Gzip-frames `bytes`.
///
/// # Panics
///
/// Panics if the in-memory encoder fails.
#[must_use]
pub fn gzip_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Wraps `bytes` in a [`FetchResult`] with the given encoding.
#[must_use]
pub fn fetch_result(bytes: Vec<u8>, content_encoding: ContentEncoding) -> FetchResult {
    FetchResult {
        bytes,
        content_encoding,
        source_url: format!("{STUB_MARKETPLACE_URL}/vspackage"),
    }
}

/// Runs `f` with every configuration environment override unset.
pub fn with_clean_env<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars_unset(ENV_OVERRIDES, f)
}

/// A single invocation observed by [`StubExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The command that was run.
    pub cmd: String,
    /// The arguments it was given.
    pub args: Vec<String>,
    /// Arguments that named existing files at call time, with their contents.
    pub files: Vec<(PathBuf, Vec<u8>)>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns queued results in order and records every invocation, including
/// a snapshot of any file arguments, so tests can inspect what the host
/// editor would have received.
#[derive(Debug, Default)]
pub struct StubExecutor {
    results: RefCell<VecDeque<Result<Output>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl StubExecutor {
    /// Creates a `StubExecutor` that answers with `results` in order.
    #[must_use]
    pub fn new(results: Vec<Result<Output>>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Creates a `StubExecutor` whose single invocation succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(vec![Ok(success_output())])
    }

    /// Returns the invocations recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Asserts that all queued results have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining results that were not requested.
    pub fn assert_finished(&self) {
        assert!(
            self.results.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let files: Vec<(PathBuf, Vec<u8>)> = args
            .iter()
            .map(|arg| PathBuf::from(*arg))
            .filter(|path| path.is_file())
            .filter_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)))
            .collect();
        self.calls.borrow_mut().push(RecordedCall {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            files,
        });

        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(InstallerError::StubMismatch {
                    message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
                })
            })
    }
}

/// A stub marketplace returning one canned response and counting calls.
#[derive(Debug, Default)]
pub struct StubMarketplace {
    response: RefCell<Option<Result<FetchResult>>>,
    fetches: Cell<usize>,
}

impl StubMarketplace {
    /// Creates a marketplace whose next fetch returns `response`.
    #[must_use]
    pub fn new(response: Result<FetchResult>) -> Self {
        Self {
            response: RefCell::new(Some(response)),
            fetches: Cell::new(0),
        }
    }

    /// Creates a marketplace that must never be asked for a package.
    #[must_use]
    pub fn unused() -> Self {
        Self::default()
    }

    /// Creates a marketplace serving a gzip-framed VSIX for `id`.
    #[must_use]
    pub fn serving_gzip_vsix(id: &ExtensionIdentifier) -> Self {
        let body = gzip_bytes(&vsix_for(id));
        Self::new(Ok(fetch_result(body, ContentEncoding::Gzip)))
    }

    /// Creates a marketplace answering every fetch with 404.
    #[must_use]
    pub fn not_found(id: &ExtensionIdentifier) -> Self {
        Self::new(Err(InstallerError::NotFound {
            identifier: id.to_string(),
            url: download_url(STUB_MARKETPLACE_URL, id),
        }))
    }

    /// Number of fetches performed.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl MarketplaceClient for StubMarketplace {
    fn download_url(&self, id: &ExtensionIdentifier) -> String {
        download_url(STUB_MARKETPLACE_URL, id)
    }

    fn fetch(&self, id: &ExtensionIdentifier) -> Result<FetchResult> {
        self.fetches.set(self.fetches.get() + 1);
        self.response.borrow_mut().take().unwrap_or_else(|| {
            Err(InstallerError::StubMismatch {
                message: format!("unexpected fetch for {id}"),
            })
        })
    }
}
