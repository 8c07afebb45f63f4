//! Package normalization and verification.
//!
//! The marketplace frequently serves VSIX packages gzip-framed regardless of
//! what the client asked for. [`normalize`] strips that framing so the host
//! editor always receives a plain VSIX (zip) archive, and [`verify`] checks the
//! result before it is staged.

use crate::digest::Sha256Digest;
use crate::error::{InstallerError, Result};
use crate::identifier::ExtensionIdentifier;
use crate::marketplace::{ContentEncoding, FetchResult};
use flate2::read::MultiGzDecoder;
use log::{debug, info, warn};
use serde::Deserialize;
use std::fmt;
use std::io::{Cursor, Read};

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Leading bytes of a zip local file header, which starts every VSIX.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Location of the extension manifest inside a VSIX archive.
const MANIFEST_ENTRY: &str = "extension/package.json";

/// Return true if `bytes` begins with the gzip magic number.
#[must_use]
pub fn has_gzip_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Convert a fetched payload into raw package bytes.
///
/// Gzip-framed payloads, whether announced by the server or recognised by
/// their magic number, are fully decompressed. Anything else is returned
/// unchanged. The input is never modified, so repeated calls agree.
///
/// # Errors
///
/// Returns [`InstallerError::CorruptPackage`] if the payload is supposed to be
/// gzip but cannot be decoded.
///
/// # Examples
///
/// ```
/// use vsix_installer::marketplace::{ContentEncoding, FetchResult};
/// use vsix_installer::package::normalize;
///
/// let plain = FetchResult {
///     bytes: b"PK\x03\x04rest".to_vec(),
///     content_encoding: ContentEncoding::None,
///     source_url: "https://example.test/vspackage".to_owned(),
/// };
/// assert_eq!(normalize(&plain)?, plain.bytes);
/// # Ok::<(), vsix_installer::error::InstallerError>(())
/// ```
pub fn normalize(result: &FetchResult) -> Result<Vec<u8>> {
    if result.content_encoding == ContentEncoding::Gzip || has_gzip_magic(&result.bytes) {
        decompress(&result.bytes)
    } else {
        Ok(result.bytes.clone())
    }
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Err(InstallerError::corrupt("gzip stream is empty"));
    }
    let mut decoded = Vec::new();
    MultiGzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(|e| InstallerError::corrupt(format!("gzip stream is malformed: {e}")))?;
    debug!(
        "decompressed {} gzip bytes into {} package bytes",
        bytes.len(),
        decoded.len()
    );
    Ok(decoded)
}

/// Policy governing how a normalized package is checked before staging.
///
/// # Examples
///
/// ```
/// use vsix_installer::package::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(policy.check_manifest);
/// assert!(policy.expected_sha256.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Require `extension/package.json` to name the requested extension.
    pub check_manifest: bool,
    /// Require the package to hash to this digest.
    pub expected_sha256: Option<Sha256Digest>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            check_manifest: true,
            expected_sha256: None,
        }
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let manifest = if self.check_manifest {
            "manifest identity checked"
        } else {
            "manifest identity not checked"
        };
        match &self.expected_sha256 {
            Some(digest) => write!(f, "{manifest}, sha256 pinned to {digest}"),
            None => write!(f, "{manifest}, sha256 not pinned"),
        }
    }
}

/// A package that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPackage {
    /// The package bytes, ready for staging.
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`.
    pub sha256: Sha256Digest,
    /// Version declared by the package manifest, when it was read.
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    publisher: String,
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// Check that `bytes` form a VSIX package for `id` under `policy`.
///
/// # Errors
///
/// Returns [`InstallerError::CorruptPackage`] if the digest does not match a
/// pinned value, the bytes are not a zip archive, or (when the policy asks for
/// it) the manifest is missing, unreadable, or names another extension.
pub fn verify(
    bytes: Vec<u8>,
    id: &ExtensionIdentifier,
    policy: &VerificationPolicy,
) -> Result<VerifiedPackage> {
    let sha256 = Sha256Digest::of(&bytes);
    info!("package sha256 for {id}: {sha256}");

    if let Some(expected) = policy.expected_sha256.as_ref().filter(|e| **e != sha256) {
        return Err(InstallerError::corrupt(format!(
            "checksum mismatch: expected {expected}, got {sha256}"
        )));
    }

    if !bytes.starts_with(ZIP_MAGIC) {
        return Err(InstallerError::corrupt(
            "payload is not a VSIX (zip) archive",
        ));
    }

    let version = if policy.check_manifest {
        let manifest = read_manifest(&bytes)?;
        if !id.matches(&manifest.publisher, &manifest.name) {
            return Err(InstallerError::corrupt(format!(
                "package manifest names {}.{}, expected {id}",
                manifest.publisher, manifest.name
            )));
        }
        if let (Some(pinned), Some(found)) = (id.version(), manifest.version.as_deref()) {
            if pinned != found {
                warn!("requested {id} version {pinned} but package declares {found}");
            }
        }
        manifest.version
    } else {
        open_archive(&bytes)?;
        None
    };

    Ok(VerifiedPackage {
        bytes,
        sha256,
        version,
    })
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>> {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| InstallerError::corrupt(format!("unreadable VSIX archive: {e}")))
}

fn read_manifest(bytes: &[u8]) -> Result<PackageManifest> {
    let mut archive = open_archive(bytes)?;
    let mut entry = archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|e| InstallerError::corrupt(format!("{MANIFEST_ENTRY} missing: {e}")))?;
    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| InstallerError::corrupt(format!("{MANIFEST_ENTRY} unreadable: {e}")))?;
    serde_json::from_str(&contents)
        .map_err(|e| InstallerError::corrupt(format!("{MANIFEST_ENTRY} is invalid: {e}")))
}

#[cfg(test)]
#[path = "package_tests.rs"]
mod tests;
