//! Full repository dump.

use crate::provider::{
    PROVIDER_INDEX_TEMPLATE, ProviderFile, ProviderIndex, RootIndex, VersionMetadata,
    provider_template,
};
use crate::source::PackageSource;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use partitura_config::DumperConfig;
use partitura_core::{ContentHash, Error, Package, Result, Version};
use partitura_store::{ContentStore, StaleSink, StoredFile, WriteOutcome};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// In-memory repository built by the read phase, keyed by package name in
/// source order.
#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    providers: IndexMap<String, ProviderFile>,
    package_count: usize,
    version_count: usize,
}

impl ProviderSet {
    /// Provider files by package name.
    #[must_use]
    pub fn providers(&self) -> &IndexMap<String, ProviderFile> {
        &self.providers
    }

    /// Packages loaded (including ones with no versions).
    #[must_use]
    pub const fn package_count(&self) -> usize {
        self.package_count
    }

    /// Version rows loaded.
    #[must_use]
    pub const fn version_count(&self) -> usize {
        self.version_count
    }
}

/// Summary of one dump.
#[derive(Debug, Clone, Serialize)]
pub struct DumpReport {
    /// When the dump finished.
    pub generated_at: DateTime<Utc>,
    /// Packages with a latest version.
    pub packages: usize,
    /// Version rows published.
    pub versions: usize,
    /// Provider files referenced by the index.
    pub providers: usize,
    /// Hashed files created by this dump.
    pub written: usize,
    /// Hashed files already present.
    pub unchanged: usize,
    /// Hash of the provider index.
    pub index_hash: String,
    /// Location of the provider index.
    pub index_path: PathBuf,
    /// Location of the root index.
    pub root_path: PathBuf,
    /// Superseded files handed over for deferred deletion.
    pub stale_paths: Vec<PathBuf>,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

/// Package name, stored file and the siblings it superseded.
type WrittenProvider = (String, StoredFile, Vec<PathBuf>);

/// Generates the static repository for a [`PackageSource`].
#[derive(Debug)]
pub struct Dumper<S> {
    source: S,
    config: DumperConfig,
    store: ContentStore,
}

impl<S: PackageSource> Dumper<S> {
    /// Dumper writing under `config.webroot`.
    #[must_use]
    pub fn new(source: S, config: DumperConfig) -> Self {
        let store = ContentStore::new(config.webroot.clone());
        Self {
            source,
            config,
            store,
        }
    }

    /// Read phase: load and decode every row and assemble the provider
    /// files. Touches no files.
    ///
    /// # Errors
    /// Returns error if a read fails, a stored field cannot be decoded, or a
    /// version references a package outside the loaded set.
    pub fn load(&self) -> Result<ProviderSet> {
        let packages: IndexMap<u64, Package> = self
            .source
            .packages()?
            .into_iter()
            .filter(|record| record.latest_version.is_some())
            .map(|record| Package::try_from(record).map(|p| (p.id, p)))
            .collect::<Result<_>>()?;

        let package_ids: Vec<u64> = packages.keys().copied().collect();
        let versions = self.source.versions(&package_ids)?;

        let version_ids: Vec<u64> = versions.iter().map(|v| v.id).collect();
        let mut requires: HashMap<u64, IndexMap<String, String>> = HashMap::new();
        for dep in self.source.dependencies(&version_ids)? {
            requires
                .entry(dep.version_id)
                .or_default()
                .insert(dep.name, dep.constraints);
        }

        let version_count = versions.len();
        let mut providers: IndexMap<String, ProviderFile> = IndexMap::new();
        for record in versions {
            let package = packages.get(&record.package_id).ok_or_else(|| {
                Error::Source(format!(
                    "version {} references package {} outside the dump set",
                    record.id, record.package_id
                ))
            })?;
            let require = requires.remove(&record.id);
            let version = Version::try_from(record)?;

            providers
                .entry(package.name.clone())
                .or_default()
                .insert(VersionMetadata::build(package, version, require));
        }

        debug!(
            packages = packages.len(),
            versions = version_count,
            providers = providers.len(),
            "assembled provider files"
        );

        Ok(ProviderSet {
            providers,
            package_count: packages.len(),
            version_count,
        })
    }

    /// Run a complete dump.
    ///
    /// Every read happens before the first write. Provider files are written
    /// first, then the provider index, and the root index last, so a failure
    /// never leaves `packages.json` pointing at a file that does not exist.
    /// Every file the new root references is reported to `sink` as
    /// reclaimed, then superseded files are handed to it (only if there are
    /// any); none are deleted here.
    ///
    /// # Errors
    /// Returns error on any read, decode, serialization or write failure.
    pub fn dump(&self, sink: &dyn StaleSink) -> Result<DumpReport> {
        let started = Instant::now();
        let set = self.load()?;

        let mut stale = Vec::new();
        let mut published = Vec::with_capacity(set.providers().len() + 1);
        let mut index = ProviderIndex::default();
        let mut written = 0;
        let mut unchanged = 0;
        let mut tally = |file: &StoredFile| match file.outcome {
            WriteOutcome::Written => written += 1,
            WriteOutcome::Unchanged => unchanged += 1,
        };

        for (name, stored, superseded) in self.write_providers(&set)? {
            tally(&stored);
            stale.extend(superseded);
            index.providers.insert(name, stored.hash.into());
            published.push(stored.path);
        }

        let index_file = self
            .store
            .write_json(&index, PROVIDER_INDEX_TEMPLATE, &mut stale)?;
        tally(&index_file);
        published.push(index_file.path.clone());

        let root_path = self
            .store
            .write_fixed(&RootIndex::new(index_file.hash), &self.config.root_file)?;

        sink.reclaim(&published);
        if !stale.is_empty() {
            sink.retire(stale.clone());
        }

        let report = DumpReport {
            generated_at: Utc::now(),
            packages: set.package_count(),
            versions: set.version_count(),
            providers: index.providers.len(),
            written,
            unchanged,
            index_hash: index_file.hash.to_hex(),
            index_path: index_file.path,
            root_path,
            stale_paths: stale,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            packages = report.packages,
            versions = report.versions,
            written = report.written,
            unchanged = report.unchanged,
            stale = report.stale_paths.len(),
            index = %index_file.hash.short(),
            "repository dumped"
        );
        Ok(report)
    }

    /// Write every provider file, in parallel when configured. Results come
    /// back in provider order either way, each with the siblings it
    /// superseded.
    fn write_providers(&self, set: &ProviderSet) -> Result<Vec<WrittenProvider>> {
        let write = |(name, file): (&String, &ProviderFile)| -> Result<WrittenProvider> {
            let mut superseded = Vec::new();
            let stored = self
                .store
                .write_json(file, &provider_template(name), &mut superseded)?;
            Ok((name.clone(), stored, superseded))
        };

        if self.config.parallel_writes {
            let entries: Vec<(&String, &ProviderFile)> = set.providers().iter().collect();
            entries.into_par_iter().map(write).collect()
        } else {
            set.providers().iter().map(write).collect()
        }
    }
}

/// Hash a provider file exactly as the dump would, without writing it.
///
/// # Errors
/// Returns error if serialization fails.
pub fn provider_hash(file: &ProviderFile) -> Result<ContentHash> {
    partitura_core::to_canonical_json(file).map(|bytes| ContentHash::from_bytes(&bytes))
}
