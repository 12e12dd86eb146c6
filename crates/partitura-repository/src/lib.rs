//! Static Composer repository generation for Partitura.
//!
//! A dump reads every publishable package, version and dependency from a
//! [`PackageSource`] and writes the tree a Composer client expects:
//!
//! - `p/<vendor>/<name>/<sha256>.json` — one provider file per package,
//!   listing all its versions;
//! - `p/provider/<sha256>.json` — the provider index, mapping every package
//!   name to the hash of its provider file;
//! - `packages.json` — the root index, pointing at the provider index and
//!   telling clients how to build provider URLs.
//!
//! Hashed files are content-addressed: unchanged content is never rewritten
//! and changed content lands at a new path. Files a dump supersedes are
//! handed to a [`StaleSink`](partitura_store::StaleSink) for deletion after
//! a grace period.
//!
//! ## Example
//!
//! ```no_run
//! use partitura_config::DumperConfig;
//! use partitura_repository::{Dumper, MemorySource};
//! use partitura_store::CollectingSink;
//!
//! # fn example() -> partitura_core::Result<()> {
//! let source = MemorySource::from_file("snapshot.json")?;
//! let dumper = Dumper::new(source, DumperConfig::new("/srv/composer"));
//!
//! let sink = CollectingSink::new();
//! let report = dumper.dump(&sink)?;
//! println!(
//!     "{} providers, {} new files, {} stale",
//!     report.providers,
//!     report.written,
//!     report.stale_paths.len()
//! );
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod dumper;
pub mod provider;
pub mod source;

pub use dumper::{DumpReport, Dumper, ProviderSet, provider_hash};
pub use provider::{
    HashRef, PROVIDER_INDEX_TEMPLATE, PROVIDER_TEMPLATE, PROVIDERS_URL, ProviderFile,
    ProviderIndex, RootIndex, VersionMetadata, provider_template,
};
pub use source::{MemorySource, PackageSource, Snapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
