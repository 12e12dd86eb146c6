//! Data access for a dump.
//!
//! A [`PackageSource`] answers the three reads a dump performs, in order.
//! Each read narrows the next: only packages with a latest version, only
//! versions of those packages, only dependencies of those versions.

use partitura_core::{
    DependencyRecord, Error, PackageRecord, Result, VersionRecord, from_json_slice,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Backing store of package, version and dependency rows.
///
/// Rows must come back in a stable order; versions of one package keep that
/// order in the published provider file.
pub trait PackageSource: Send + Sync {
    /// Packages whose latest version is set.
    fn packages(&self) -> Result<Vec<PackageRecord>>;

    /// Versions belonging to any of `package_ids`.
    fn versions(&self, package_ids: &[u64]) -> Result<Vec<VersionRecord>>;

    /// Dependencies belonging to any of `version_ids`.
    fn dependencies(&self, version_ids: &[u64]) -> Result<Vec<DependencyRecord>>;
}

impl<S: PackageSource + ?Sized> PackageSource for &S {
    fn packages(&self) -> Result<Vec<PackageRecord>> {
        (**self).packages()
    }

    fn versions(&self, package_ids: &[u64]) -> Result<Vec<VersionRecord>> {
        (**self).versions(package_ids)
    }

    fn dependencies(&self, version_ids: &[u64]) -> Result<Vec<DependencyRecord>> {
        (**self).dependencies(version_ids)
    }
}

/// Every row of a repository, as exported from the backing store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Package rows, including ones without a latest version.
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
    /// Version rows.
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
    /// Dependency rows.
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

impl Snapshot {
    /// Parse a snapshot from JSON bytes.
    ///
    /// # Errors
    /// Returns error if the JSON does not match the row layout.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        from_json_slice(bytes)
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let snapshot = Self::from_slice(&bytes)?;
        debug!(
            path = %path.display(),
            packages = snapshot.packages.len(),
            versions = snapshot.versions.len(),
            dependencies = snapshot.dependencies.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

/// In-memory source that filters rows the way the store queries would.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    snapshot: Snapshot,
}

impl MemorySource {
    /// Source over the given rows.
    #[must_use]
    pub fn new(
        packages: Vec<PackageRecord>,
        versions: Vec<VersionRecord>,
        dependencies: Vec<DependencyRecord>,
    ) -> Self {
        Self::from_snapshot(Snapshot {
            packages,
            versions,
            dependencies,
        })
    }

    /// Source over a loaded snapshot.
    #[must_use]
    pub const fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Source over a snapshot file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Snapshot::from_file(path).map(Self::from_snapshot)
    }

    /// Mutable access to the rows.
    pub fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.snapshot
    }
}

impl PackageSource for MemorySource {
    fn packages(&self) -> Result<Vec<PackageRecord>> {
        Ok(self
            .snapshot
            .packages
            .iter()
            .filter(|p| p.latest_version.is_some())
            .cloned()
            .collect())
    }

    fn versions(&self, package_ids: &[u64]) -> Result<Vec<VersionRecord>> {
        let wanted: HashSet<u64> = package_ids.iter().copied().collect();
        Ok(self
            .snapshot
            .versions
            .iter()
            .filter(|v| wanted.contains(&v.package_id))
            .cloned()
            .collect())
    }

    fn dependencies(&self, version_ids: &[u64]) -> Result<Vec<DependencyRecord>> {
        let wanted: HashSet<u64> = version_ids.iter().copied().collect();
        Ok(self
            .snapshot
            .dependencies
            .iter()
            .filter(|d| wanted.contains(&d.version_id))
            .cloned()
            .collect())
    }
}
