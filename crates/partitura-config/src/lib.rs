//! Layered configuration for the Partitura repository generator.
//!
//! Sources are merged in priority order:
//!
//! 1. Built-in defaults
//! 2. Global config (`~/.config/partitura/config.json`)
//! 3. Project config (`partitura.json`, or a file named with `--config`)
//! 4. Environment variables (`PARTITURA_*`)
//! 5. CLI arguments
//!
//! # Quick Start
//!
//! ```no_run
//! use partitura_config::{CliOverrides, ConfigLoader};
//!
//! let config = ConfigLoader::new(".")
//!     .resolve(CliOverrides::default())
//!     .expect("failed to resolve config");
//! println!("Writing to {}", config.webroot.display());
//! ```
//!
//! A config file uses kebab-case keys:
//!
//! ```json
//! {
//!     "webroot": "public",
//!     "root-file": "packages.json",
//!     "grace-period": 300,
//!     "parallel-writes": true
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod env;
pub mod error;
pub mod loader;
pub mod types;

pub use env::{EnvConfig, PartituraEnvVar, parse_duration_secs};
pub use error::{ConfigError, Result};
pub use loader::{CliOverrides, ConfigLoader, ConfigSource, PROJECT_CONFIG_FILE};
pub use types::{DEFAULT_GRACE_PERIOD_SECS, DEFAULT_ROOT_FILE, DumperConfig, PartialConfig};
