//! Environment variable layer.

use crate::error::{ConfigError, Result};
use crate::types::PartialConfig;
use std::path::PathBuf;

/// Environment variables understood by Partitura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartituraEnvVar {
    /// Output directory.
    Webroot,
    /// Grace period in seconds.
    GracePeriod,
    /// Parallel provider writes (`1`/`true`/`yes`/`on`).
    Parallel,
}

impl PartituraEnvVar {
    /// All known variables.
    pub const ALL: [Self; 3] = [Self::Webroot, Self::GracePeriod, Self::Parallel];

    /// Variable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webroot => "PARTITURA_WEBROOT",
            Self::GracePeriod => "PARTITURA_GRACE_PERIOD",
            Self::Parallel => "PARTITURA_PARALLEL",
        }
    }
}

/// Configuration read from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    layer: PartialConfig,
}

impl EnvConfig {
    /// Read from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup function.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut layer = PartialConfig::default();

        for var in PartituraEnvVar::ALL {
            let Some(value) = lookup(var.as_str()).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let value = value.trim().to_string();
            match var {
                PartituraEnvVar::Webroot => layer.webroot = Some(PathBuf::from(value)),
                PartituraEnvVar::GracePeriod => {
                    let secs = parse_duration_secs(&value).ok_or(ConfigError::InvalidEnv {
                        var: var.as_str(),
                        value,
                    })?;
                    layer.grace_period = Some(secs);
                }
                PartituraEnvVar::Parallel => {
                    let flag = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                        var: var.as_str(),
                        value,
                    })?;
                    layer.parallel_writes = Some(flag);
                }
            }
        }

        Ok(Self { layer })
    }

    /// The layer this source contributes.
    #[must_use]
    pub fn layer(&self) -> &PartialConfig {
        &self.layer
    }
}

/// Parse a duration in seconds, accepting an optional `s`/`m`/`h` suffix.
#[must_use]
pub fn parse_duration_secs(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, multiplier) = match s.chars().last()? {
        's' => (&s[..s.len() - 1], 1),
        'm' => (&s[..s.len() - 1], 60),
        'h' => (&s[..s.len() - 1], 3600),
        _ => (s, 1),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
