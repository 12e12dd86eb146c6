//! Configuration types.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default name of the root index.
pub const DEFAULT_ROOT_FILE: &str = "packages.json";

/// Default time superseded files stay on disk after a dump.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 300;

/// Fully resolved dumper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumperConfig {
    /// Directory the repository tree is written under.
    pub webroot: PathBuf,
    /// File name of the root index inside the webroot.
    pub root_file: String,
    /// Seconds before superseded files may be deleted.
    pub grace_period_secs: u64,
    /// Write provider files in parallel.
    pub parallel_writes: bool,
}

impl DumperConfig {
    /// Configuration with defaults for everything but the webroot.
    #[must_use]
    pub fn new(webroot: impl Into<PathBuf>) -> Self {
        Self {
            webroot: webroot.into(),
            root_file: DEFAULT_ROOT_FILE.to_string(),
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            parallel_writes: false,
        }
    }

    /// Enable or disable parallel provider writes.
    #[must_use]
    pub const fn with_parallel_writes(mut self, parallel: bool) -> Self {
        self.parallel_writes = parallel;
        self
    }

    /// Grace period as a duration.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.webroot.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("webroot is empty".into()));
        }
        let mut components = Path::new(&self.root_file).components();
        let plain_name = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none()
            && !self.root_file.contains(['/', '\\']);
        if !plain_name {
            return Err(ConfigError::Invalid(format!(
                "root file '{}' must be a plain file name",
                self.root_file
            )));
        }
        Ok(())
    }
}

/// One configuration layer; unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConfig {
    /// Output directory.
    #[serde(default)]
    pub webroot: Option<PathBuf>,
    /// Root index file name.
    #[serde(default)]
    pub root_file: Option<String>,
    /// Grace period in seconds.
    #[serde(default)]
    pub grace_period: Option<u64>,
    /// Parallel provider writes.
    #[serde(default)]
    pub parallel_writes: Option<bool>,
}

impl PartialConfig {
    /// Overlay `other` on top of `self`; set fields in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            webroot: other.webroot.or(self.webroot),
            root_file: other.root_file.or(self.root_file),
            grace_period: other.grace_period.or(self.grace_period),
            parallel_writes: other.parallel_writes.or(self.parallel_writes),
        }
    }

    /// Fill defaults and validate.
    ///
    /// # Errors
    /// Returns error if no webroot was set or validation fails.
    pub fn into_config(self) -> Result<DumperConfig> {
        let webroot = self.webroot.ok_or(ConfigError::MissingWebroot)?;
        let config = DumperConfig {
            webroot,
            root_file: self
                .root_file
                .unwrap_or_else(|| DEFAULT_ROOT_FILE.to_string()),
            grace_period_secs: self.grace_period.unwrap_or(DEFAULT_GRACE_PERIOD_SECS),
            parallel_writes: self.parallel_writes.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}
