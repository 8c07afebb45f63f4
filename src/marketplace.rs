//! Marketplace download client.
//!
//! Provides a trait-based abstraction for fetching extension packages from
//! the marketplace gallery, enabling dependency injection for testing. The
//! production client performs a single GET per attempt and never decodes the
//! transfer encoding itself; that is the job of [`crate::package`].

use crate::error::{InstallerError, Result};
use crate::identifier::ExtensionIdentifier;
use crate::package::has_gzip_magic;
use log::{debug, warn};
use std::io::Read;
use std::time::Duration;

/// Default marketplace gallery API root.
pub const DEFAULT_MARKETPLACE_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery";

/// Version segment used when no version is pinned.
const LATEST_VERSION: &str = "latest";

/// Default network timeout for package downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("vsix-installer/", env!("CARGO_PKG_VERSION"));

/// Transfer encoding of a fetched payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentEncoding {
    /// The payload is the package itself.
    #[default]
    None,
    /// The payload is gzip-framed.
    Gzip,
}

impl ContentEncoding {
    /// Determine the encoding from a `Content-Encoding` header value and the
    /// leading bytes of the body.
    ///
    /// The magic bytes win over a missing or misleading header.
    ///
    /// # Examples
    ///
    /// ```
    /// use vsix_installer::marketplace::ContentEncoding;
    ///
    /// assert_eq!(ContentEncoding::detect(Some("gzip"), b"PK"), ContentEncoding::Gzip);
    /// assert_eq!(ContentEncoding::detect(None, &[0x1f, 0x8b, 8]), ContentEncoding::Gzip);
    /// assert_eq!(ContentEncoding::detect(None, b"PK\x03\x04"), ContentEncoding::None);
    /// ```
    #[must_use]
    pub fn detect(header: Option<&str>, bytes: &[u8]) -> Self {
        let header_says_gzip = header.is_some_and(|value| {
            value.split(',').any(|token| {
                matches!(
                    token.trim().to_ascii_lowercase().as_str(),
                    "gzip" | "x-gzip"
                )
            })
        });
        if header_says_gzip || has_gzip_magic(bytes) {
            Self::Gzip
        } else {
            Self::None
        }
    }
}

/// A raw marketplace response body and its encoding metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Body bytes exactly as received.
    pub bytes: Vec<u8>,
    /// Encoding reported by the server or sniffed from the body.
    pub content_encoding: ContentEncoding,
    /// URL the body was fetched from.
    pub source_url: String,
}

/// Trait for fetching extension packages from a marketplace.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
#[cfg_attr(test, mockall::automock)]
pub trait MarketplaceClient {
    /// Return the download URL for `id`.
    fn download_url(&self, id: &ExtensionIdentifier) -> String;

    /// Fetch the package for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NotFound`] for HTTP 404,
    /// [`InstallerError::UpstreamError`] for any other non-success status, and
    /// [`InstallerError::NetworkError`] when the transfer itself fails.
    fn fetch(&self, id: &ExtensionIdentifier) -> Result<FetchResult>;
}

/// HTTP marketplace client using `ureq`.
pub struct HttpMarketplace {
    base_url: String,
    retries: u32,
    agent: ureq::Agent,
}

impl HttpMarketplace {
    /// Create a client for the gallery rooted at `base_url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use vsix_installer::identifier::ExtensionIdentifier;
    /// use vsix_installer::marketplace::{HttpMarketplace, MarketplaceClient};
    ///
    /// let client = HttpMarketplace::new("https://gallery.example.test/", Duration::from_secs(5));
    /// let id = ExtensionIdentifier::parse("vv13.markdown-auto-preview")?;
    /// assert_eq!(
    ///     client.download_url(&id),
    ///     "https://gallery.example.test/publishers/vv13/vsextensions/markdown-auto-preview/latest/vspackage",
    /// );
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            retries: 0,
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Retry transport failures up to `retries` extra times.
    ///
    /// HTTP status failures are never retried.
    #[must_use]
    pub fn with_retries(self, retries: u32) -> Self {
        Self { retries, ..self }
    }

    fn fetch_once(&self, id: &ExtensionIdentifier, url: &str) -> Result<FetchResult> {
        let response = self
            .agent
            .get(url)
            .header("Accept-Encoding", "gzip")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(id, url, &e))?;

        let header = response
            .headers()
            .get("content-encoding")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| InstallerError::NetworkError {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        let content_encoding = ContentEncoding::detect(header.as_deref(), &bytes);
        debug!(
            "fetched {} bytes from {url} (content-encoding header: {header:?}, detected: {content_encoding:?})",
            bytes.len()
        );

        Ok(FetchResult {
            bytes,
            content_encoding,
            source_url: url.to_owned(),
        })
    }
}

impl MarketplaceClient for HttpMarketplace {
    fn download_url(&self, id: &ExtensionIdentifier) -> String {
        download_url(&self.base_url, id)
    }

    fn fetch(&self, id: &ExtensionIdentifier) -> Result<FetchResult> {
        let url = self.download_url(id);
        let mut attempt = 0;
        loop {
            match self.fetch_once(id, &url) {
                Err(err @ InstallerError::NetworkError { .. }) if attempt < self.retries => {
                    attempt += 1;
                    warn!("{err}; retrying ({attempt}/{})", self.retries);
                }
                other => return other,
            }
        }
    }
}

/// Build the package download URL for `id` under the gallery root `base_url`.
#[must_use]
pub fn download_url(base_url: &str, id: &ExtensionIdentifier) -> String {
    format!(
        "{}/publishers/{}/vsextensions/{}/{}/vspackage",
        base_url.trim_end_matches('/'),
        id.publisher(),
        id.name(),
        id.version().unwrap_or(LATEST_VERSION),
    )
}

/// Map a ureq error to an [`InstallerError`].
fn map_ureq_error(id: &ExtensionIdentifier, url: &str, err: &ureq::Error) -> InstallerError {
    match err {
        ureq::Error::StatusCode(404) => InstallerError::NotFound {
            identifier: id.to_string(),
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => InstallerError::UpstreamError {
            status: *status,
            url: url.to_owned(),
        },
        other => InstallerError::NetworkError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
