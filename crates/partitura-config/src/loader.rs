//! Layered configuration loading.

use crate::env::EnvConfig;
use crate::error::{ConfigError, Result};
use crate::types::{DumperConfig, PartialConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "partitura.json";

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults.
    Default,
    /// Per-user config file.
    Global(PathBuf),
    /// Project or explicitly named config file.
    File(PathBuf),
    /// `PARTITURA_*` environment variables.
    Environment,
    /// Command-line flags.
    Cli,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--webroot`.
    pub webroot: Option<PathBuf>,
    /// `--grace`.
    pub grace_period: Option<u64>,
    /// `--parallel`.
    pub parallel_writes: Option<bool>,
}

impl From<CliOverrides> for PartialConfig {
    fn from(cli: CliOverrides) -> Self {
        Self {
            webroot: cli.webroot,
            root_file: None,
            grace_period: cli.grace_period,
            parallel_writes: cli.parallel_writes,
        }
    }
}

/// Resolves a [`DumperConfig`] from, in increasing priority: defaults, the
/// global config file, the project (or explicit) config file, environment
/// variables and CLI overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    working_dir: PathBuf,
    explicit_file: Option<PathBuf>,
    global_file: Option<PathBuf>,
    read_env: bool,
}

impl ConfigLoader {
    /// Loader rooted at a working directory.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            explicit_file: None,
            global_file: default_global_file(),
            read_env: true,
        }
    }

    /// Use this file instead of `partitura.json`. It must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Override (or disable) the global config file location.
    #[must_use]
    pub fn with_global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global_file = path;
        self
    }

    /// Skip the environment layer.
    #[must_use]
    pub const fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Path of the project config file.
    #[must_use]
    pub fn project_config_path(&self) -> PathBuf {
        self.explicit_file
            .clone()
            .unwrap_or_else(|| self.working_dir.join(PROJECT_CONFIG_FILE))
    }

    /// Merge every layer and validate the result.
    ///
    /// # Errors
    /// Returns error if a file is unreadable or malformed, an environment
    /// variable is invalid, or the merged configuration is incomplete.
    pub fn resolve(&self, cli: CliOverrides) -> Result<DumperConfig> {
        let mut merged = PartialConfig::default();
        let mut sources = vec![ConfigSource::Default];

        if let Some(global) = &self.global_file
            && global.is_file()
        {
            merged = merged.merge(read_file(global)?);
            sources.push(ConfigSource::Global(global.clone()));
        }

        let project = self.project_config_path();
        if self.explicit_file.is_some() || project.is_file() {
            let mut layer = read_file(&project)?;
            // Relative webroots in a file are relative to that file.
            if let Some(webroot) = layer.webroot.take() {
                layer.webroot = Some(resolve_relative(&project, webroot));
            }
            merged = merged.merge(layer);
            sources.push(ConfigSource::File(project));
        }

        if self.read_env {
            merged = merged.merge(EnvConfig::from_env()?.layer().clone());
            sources.push(ConfigSource::Environment);
        }

        merged = merged.merge(cli.into());
        sources.push(ConfigSource::Cli);

        debug!(?sources, "resolved configuration layers");
        merged.into_config()
    }
}

fn read_file(path: &Path) -> Result<PartialConfig> {
    let data = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    sonic_rs::from_slice(&data).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn resolve_relative(file: &Path, webroot: PathBuf) -> PathBuf {
    if webroot.is_absolute() {
        return webroot;
    }
    file.parent()
        .map(|dir| dir.join(&webroot))
        .unwrap_or(webroot)
}

fn default_global_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "partitura")
        .map(|dirs| dirs.config_dir().join("config.json"))
}
