//! Core types and utilities for Partitura.
//!
//! Partitura generates static Composer repositories: a root `packages.json`,
//! a provider index and one content-addressed provider file per package.
//! This crate holds what every other crate shares: the error type, SHA-256
//! content hashes, JSON encoding rules and the stored/decoded data model.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod hash;
pub mod json;
pub mod package;

pub use error::{Error, Result};
pub use hash::ContentHash;
pub use json::{decode_stored, from_json_slice, to_canonical_json, to_json_pretty};
pub use package::{
    Abandoned, DEFAULT_PACKAGE_TYPE, DependencyRecord, Package, PackageName, PackageRecord,
    Version, VersionRecord,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
