//! Temporary staging of downloaded packages.
//!
//! The host editor installs from a file path, so the verified package bytes
//! are written to a private temporary directory for the duration of one
//! install. [`StagedPackage`] owns that directory and removes it when dropped,
//! which covers success, error returns, and unwinding alike.

use crate::error::Result;
use crate::identifier::ExtensionIdentifier;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STAGING_PREFIX: &str = "vsix-installer-";
const PACKAGE_EXTENSION: &str = "vsix";

/// A package file staged for the host editor.
#[derive(Debug)]
pub struct StagedPackage {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl StagedPackage {
    /// Write `bytes` to a fresh temporary directory as `publisher.name.vsix`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::identifier::ExtensionIdentifier;
    /// use vsix_installer::staging::StagedPackage;
    ///
    /// let id = ExtensionIdentifier::parse("vv13.markdown-auto-preview")?;
    /// let staged = StagedPackage::create(&id, b"PK\x03\x04")?;
    /// let path = staged.path().to_path_buf();
    /// assert!(path.ends_with("vv13.markdown-auto-preview.vsix"));
    /// drop(staged);
    /// assert!(!path.exists());
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    pub fn create(id: &ExtensionIdentifier, bytes: &[u8]) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
        Self::create_in(dir, id, bytes)
    }

    /// Stage into an already-created temporary directory, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn create_in(dir: TempDir, id: &ExtensionIdentifier, bytes: &[u8]) -> Result<Self> {
        let path = dir.path().join(staged_filename(id));
        fs::write(&path, bytes)?;
        debug!("staged {} bytes at {}", bytes.len(), path.display());
        Ok(Self {
            path,
            dir: Some(dir),
        })
    }

    /// Path of the staged package file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedPackage {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let dir_path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!("removed staging directory {}", dir_path.display()),
            Err(err) => warn!(
                "failed to remove staging directory {}: {err}",
                dir_path.display()
            ),
        }
    }
}

/// Compute the staged filename: `publisher.name.vsix`.
#[must_use]
pub fn staged_filename(id: &ExtensionIdentifier) -> String {
    format!("{id}.{PACKAGE_EXTENSION}")
}
