//! Installer configuration.
//!
//! Settings come from three layers, later layers winning: a TOML file, the
//! `VSIX_INSTALLER_*` environment variables, and command-line flags. The file
//! is either the one named by `--config` or `config.toml` in the platform
//! configuration directory; a missing default file simply yields defaults.

use crate::error::{InstallerError, Result};
use crate::host::DEFAULT_EDITOR;
use crate::marketplace::{DEFAULT_MARKETPLACE_URL, DEFAULT_TIMEOUT};
use camino::{Utf8Path, Utf8PathBuf};
use directories_next::ProjectDirs;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::time::Duration;

/// Environment variable overriding the host editor command.
pub const EDITOR_ENV: &str = "VSIX_INSTALLER_EDITOR";
/// Environment variable overriding the marketplace gallery root.
pub const MARKETPLACE_URL_ENV: &str = "VSIX_INSTALLER_MARKETPLACE_URL";
/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "VSIX_INSTALLER_TIMEOUT";

/// Every environment variable consulted by [`Config::apply_env`].
pub const ENV_OVERRIDES: [&str; 3] = [EDITOR_ENV, MARKETPLACE_URL_ENV, TIMEOUT_ENV];

const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolved installer configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Host editor command, looked up on `PATH`.
    pub editor: String,
    /// Marketplace gallery API root.
    pub marketplace_url: String,
    /// Whole-request timeout for package downloads, in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure.
    pub retries: u32,
    /// Check the package manifest names the requested extension.
    pub verify_package: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: DEFAULT_EDITOR.to_owned(),
            marketplace_url: DEFAULT_MARKETPLACE_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            retries: 0,
            verify_package: true,
        }
    }
}

/// Values supplied on the command line, applied last.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    /// `--editor`
    pub editor: Option<String>,
    /// `--marketplace-url`
    pub marketplace_url: Option<String>,
    /// `--timeout`
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Resolve the configuration for one run.
    ///
    /// An explicit `config_path` must exist. Without one, the platform default
    /// location is tried and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if a file cannot be read or parsed,
    /// or if any layer supplies an invalid value.
    pub fn resolve(config_path: Option<&Utf8Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_file(path)?,
            None => match default_config_path() {
                Some(path) => Self::load_optional(&path)?,
                None => Self::default(),
            },
        };
        let config = base.apply_env()?.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] on malformed TOML or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use vsix_installer::config::Config;
    ///
    /// let config = Config::from_toml("editor = \"codium\"\n", Utf8Path::new("inline"))?;
    /// assert_eq!(config.editor, "codium");
    /// assert_eq!(config.timeout_secs, 30);
    /// # Ok::<(), vsix_installer::error::InstallerError>(())
    /// ```
    pub fn from_toml(source: &str, origin: &Utf8Path) -> Result<Self> {
        toml::from_str(source).map_err(|e| config_error(origin, e))
    }

    /// Load configuration from `path`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if the file is missing, unreadable,
    /// or invalid.
    pub fn load_file(path: &Utf8Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| config_error(path, e))?;
        debug!("loaded configuration from {path}");
        Self::from_toml(&source, path)
    }

    /// Load configuration from `path`, falling back to defaults when it does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if the file exists but cannot be
    /// read or parsed.
    pub fn load_optional(path: &Utf8Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(source) => {
                debug!("loaded configuration from {path}");
                Self::from_toml(&source, path)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(config_error(path, err)),
        }
    }

    /// Apply `VSIX_INSTALLER_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if an override is malformed.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] if the timeout override is not a
    /// positive integer.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(editor) = read(EDITOR_ENV) {
            self.editor = editor;
        }
        if let Some(url) = read(MARKETPLACE_URL_ENV) {
            self.marketplace_url = url;
        }
        if let Some(raw) = read(TIMEOUT_ENV) {
            self.timeout_secs = raw.parse().map_err(|e| {
                config_error(
                    Utf8Path::new(TIMEOUT_ENV),
                    format!("expected whole seconds, got {raw:?}: {e}"),
                )
            })?;
        }
        Ok(self)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(editor) = &overrides.editor {
            self.editor.clone_from(editor);
        }
        if let Some(url) = &overrides.marketplace_url {
            self.marketplace_url.clone_from(url);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        self
    }

    /// Reject values no run could use.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] for an empty editor command, a
    /// non-HTTP marketplace URL, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        let origin = Utf8Path::new("resolved configuration");
        if self.editor.trim().is_empty() {
            return Err(config_error(origin, "editor must not be empty"));
        }
        if !(self.marketplace_url.starts_with("https://")
            || self.marketplace_url.starts_with("http://"))
        {
            return Err(config_error(
                origin,
                format!(
                    "marketplace_url must be an http(s) URL, got {:?}",
                    self.marketplace_url
                ),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(config_error(origin, "timeout must be at least one second"));
        }
        Ok(())
    }

    /// The request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Location of the default configuration file, if the platform has one.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().join(CONFIG_FILE_NAME)).ok()
}

fn config_error(path: &Utf8Path, reason: impl std::fmt::Display) -> InstallerError {
    InstallerError::Config {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::with_clean_env;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[rstest]
    fn defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.editor, "cursor");
        assert_eq!(config.marketplace_url, DEFAULT_MARKETPLACE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retries, 0);
        assert!(config.verify_package);
        config.validate().expect("defaults should validate");
    }

    #[rstest]
    fn deserialises_partial_file() {
        let source = "editor = \"codium\"\nretries = 2\n";

        let config = Config::from_toml(source, Utf8Path::new("test.toml"))
            .expect("expected configuration to parse successfully");

        assert_eq!(config.editor, "codium");
        assert_eq!(config.retries, 2);
        assert_eq!(config.timeout_secs, 30);
    }

    #[rstest]
    #[case::unknown_field("editor = \"cursor\"\nlocale = \"cy\"\n")]
    #[case::wrong_type("timeout_secs = \"soon\"\n")]
    #[case::malformed("editor = \n")]
    fn rejects_invalid_files(#[case] source: &str) {
        let err = Config::from_toml(source, Utf8Path::new("bad.toml"))
            .expect_err("expected a parse error");

        assert!(matches!(err, InstallerError::Config { ref path, .. } if path == "bad.toml"));
        assert_eq!(err.exit_code(), 1);
    }

    #[rstest]
    fn environment_overrides_file_values() {
        let lookup = lookup_from(&[
            (EDITOR_ENV, "codium"),
            (MARKETPLACE_URL_ENV, "https://open-vsx.test/gallery"),
            (TIMEOUT_ENV, " 5 "),
        ]);

        let config = Config::default()
            .apply_env_with(lookup)
            .expect("overrides should apply");

        assert_eq!(config.editor, "codium");
        assert_eq!(config.marketplace_url, "https://open-vsx.test/gallery");
        assert_eq!(config.timeout_secs, 5);
    }

    #[rstest]
    fn blank_environment_values_are_ignored() {
        let config = Config::default()
            .apply_env_with(lookup_from(&[(EDITOR_ENV, "   ")]))
            .expect("blank override should be ignored");

        assert_eq!(config.editor, "cursor");
    }

    #[rstest]
    fn malformed_timeout_override_names_the_variable() {
        let err = Config::default()
            .apply_env_with(lookup_from(&[(TIMEOUT_ENV, "half a minute")]))
            .expect_err("timeout must be numeric");

        assert!(err.to_string().contains(TIMEOUT_ENV));
    }

    #[rstest]
    fn command_line_overrides_environment() {
        let overrides = ConfigOverrides {
            editor: Some("code-oss".to_owned()),
            marketplace_url: None,
            timeout_secs: Some(90),
        };

        let config = Config::default()
            .apply_env_with(lookup_from(&[(EDITOR_ENV, "codium"), (TIMEOUT_ENV, "5")]))
            .expect("overrides should apply")
            .apply_overrides(&overrides);

        assert_eq!(config.editor, "code-oss");
        assert_eq!(config.timeout_secs, 90);
    }

    #[rstest]
    #[case::empty_editor(Config { editor: " ".to_owned(), ..Config::default() })]
    #[case::non_http_url(Config {
        marketplace_url: "ftp://gallery".to_owned(),
        ..Config::default()
    })]
    #[case::zero_timeout(Config { timeout_secs: 0, ..Config::default() })]
    fn validate_rejects_unusable_values(#[case] config: Config) {
        assert!(matches!(
            config.validate(),
            Err(InstallerError::Config { .. })
        ));
    }

    #[rstest]
    fn missing_optional_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.toml"))
            .expect("temp path is UTF-8");

        let config = Config::load_optional(&path).expect("missing file is not an error");

        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.toml"))
            .expect("temp path is UTF-8");

        let err = Config::load_file(&path).expect_err("explicit file must exist");

        assert!(matches!(err, InstallerError::Config { .. }));
    }

    #[rstest]
    fn resolve_layers_file_environment_and_flags() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.toml"))
            .expect("temp path is UTF-8");
        fs::write(&path, "editor = \"codium\"\ntimeout_secs = 10\nretries = 3\n")
            .expect("write config");
        let overrides = ConfigOverrides {
            timeout_secs: Some(45),
            ..ConfigOverrides::default()
        };

        let config = with_clean_env(|| {
            temp_env::with_var(MARKETPLACE_URL_ENV, Some("http://127.0.0.1:9/gallery"), || {
                Config::resolve(Some(&path), &overrides)
            })
        })
        .expect("configuration should resolve");

        assert_eq!(config.editor, "codium");
        assert_eq!(config.marketplace_url, "http://127.0.0.1:9/gallery");
        assert_eq!(config.timeout_secs, 45);
        assert_eq!(config.retries, 3);
    }
}
