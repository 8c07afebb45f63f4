//! Marketplace extension identifiers.
//!
//! This module provides the [`ExtensionIdentifier`] type, the validated
//! `publisher.name` pair that every other stage of the pipeline keys on.

use crate::error::{InstallerError, Result};
use std::fmt;
use std::str::FromStr;

/// A validated marketplace extension identifier.
///
/// The canonical string form is `publisher.name`. Case is preserved exactly as
/// given, because the marketplace path segments are case-sensitive and the
/// host editor is handed the same spelling.
///
/// # Examples
///
/// ```
/// use vsix_installer::identifier::ExtensionIdentifier;
///
/// let id = ExtensionIdentifier::parse("vv13.markdown-auto-preview")?;
/// assert_eq!(id.publisher(), "vv13");
/// assert_eq!(id.name(), "markdown-auto-preview");
/// assert_eq!(id.to_string(), "vv13.markdown-auto-preview");
/// # Ok::<(), vsix_installer::error::InstallerError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionIdentifier {
    publisher: String,
    name: String,
    version: Option<String>,
}

impl ExtensionIdentifier {
    /// Parse a raw `publisher.name` string.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidIdentifierFormat`] unless the input
    /// contains exactly one `.` with non-empty text on both sides, and only
    /// ASCII letters, digits, `-`, `_` and `~` around it.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| InstallerError::InvalidIdentifierFormat {
            input: raw.to_owned(),
            reason: reason.to_owned(),
        };

        if let Some(reason) = forbidden_character(raw) {
            return Err(invalid(&reason));
        }

        let mut parts = raw.split('.');
        let (Some(publisher), Some(name), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected exactly one '.' between publisher and name"));
        };

        if publisher.is_empty() {
            return Err(invalid("publisher is empty"));
        }
        if name.is_empty() {
            return Err(invalid("extension name is empty"));
        }

        Ok(Self {
            publisher: publisher.to_owned(),
            name: name.to_owned(),
            version: None,
        })
    }

    /// Pin this identifier to a specific marketplace version.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidIdentifierFormat`] if the version is
    /// empty, is `.` or `..`, or contains anything other than ASCII letters,
    /// digits, `-`, `_`, `.` and `~`.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::identifier::ExtensionIdentifier;
    ///
    /// let id = ExtensionIdentifier::parse("bierner.markdown-emoji")?.with_version("0.3.0")?;
    /// assert_eq!(id.version(), Some("0.3.0"));
    /// assert_eq!(id.to_string(), "bierner.markdown-emoji");
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    pub fn with_version(self, version: &str) -> Result<Self> {
        let reason = if version.is_empty() {
            Some("version is empty".to_owned())
        } else if matches!(version, "." | "..") {
            Some("version is a relative path segment".to_owned())
        } else {
            forbidden_character(version)
        };
        if let Some(reason) = reason {
            return Err(InstallerError::InvalidIdentifierFormat {
                input: format!("{self}@{version}"),
                reason: format!("invalid version: {reason}"),
            });
        }
        Ok(Self {
            version: Some(version.to_owned()),
            ..self
        })
    }

    /// The publisher segment.
    #[must_use]
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// The extension name segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pinned version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Return true if `publisher` and `name` match this identifier, ignoring
    /// ASCII case.
    #[must_use]
    pub fn matches(&self, publisher: &str, name: &str) -> bool {
        self.publisher.eq_ignore_ascii_case(publisher) && self.name.eq_ignore_ascii_case(name)
    }
}

fn forbidden_character(text: &str) -> Option<String> {
    if text.chars().any(char::is_whitespace) {
        Some("contains whitespace".to_owned())
    } else if text.contains(['/', '\\']) {
        Some("contains a path separator".to_owned())
    } else {
        text.chars()
            .find(|&ch| !is_url_safe(ch))
            .map(|ch| format!("contains {ch:?}, which is not allowed in a marketplace URL"))
    }
}

/// Unreserved URL characters: these never need escaping in a path segment.
const fn is_url_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '~')
}

impl FromStr for ExtensionIdentifier {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ExtensionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.name)
    }
}
