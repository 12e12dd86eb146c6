//! Composer repository documents.
//!
//! Field order and presence follow what Composer clients and Packagist emit
//! for a version (`Version::toArray()` order), so serializing these structs
//! with `serde_json` yields the published bytes directly.

use indexmap::IndexMap;
use partitura_core::{Abandoned, ContentHash, DEFAULT_PACKAGE_TYPE, Package, Version};
use serde::Serialize;
use serde_json::{Value, json};

/// Path template of per-package provider files, relative to the webroot.
pub const PROVIDER_TEMPLATE: &str = "p/%package%/%hash%.json";

/// Path template of the provider index, relative to the webroot.
pub const PROVIDER_INDEX_TEMPLATE: &str = "p/provider/%hash%.json";

/// URL template clients expand to fetch a provider file.
pub const PROVIDERS_URL: &str = "/p/%package%/%hash%.json";

/// Provider file template for one package.
#[must_use]
pub fn provider_template(package: &str) -> String {
    PROVIDER_TEMPLATE.replace("%package%", package)
}

/// Published metadata of one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionMetadata {
    pub name: String,
    pub description: String,
    pub keywords: Value,
    pub homepage: String,
    pub version: String,
    pub version_normalized: String,
    pub license: Value,
    pub authors: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist: Option<Value>,
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(rename = "target-dir", skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
    #[serde(rename = "include-path", skip_serializing_if = "Option::is_none")]
    pub include_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggest: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provide: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<Value>,
    #[serde(skip_serializing_if = "Abandoned::is_no")]
    pub abandoned: Abandoned,
    pub uid: u64,
}

impl VersionMetadata {
    /// Assemble the published form of `version`.
    ///
    /// `require` is `None` when the version has no dependency rows, which
    /// omits the key rather than emitting `{}`.
    #[must_use]
    pub fn build(
        package: &Package,
        version: Version,
        require: Option<IndexMap<String, String>>,
    ) -> Self {
        Self {
            name: package.name.clone(),
            description: version.description.unwrap_or_default(),
            keywords: present(version.keywords).unwrap_or_else(|| json!([])),
            homepage: version.homepage.unwrap_or_default(),
            version: version.version,
            version_normalized: version.normalized_version,
            license: present(version.license).unwrap_or_else(|| json!([])),
            authors: present(version.authors).unwrap_or_else(|| json!([])),
            dist: version.dist,
            package_type: version
                .package_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_PACKAGE_TYPE.to_string()),
            time: version.time,
            autoload: present(version.autoload),
            extra: present(version.extra),
            target_dir: version.target_dir,
            include_path: version.include_path,
            bin: present(version.bin),
            require,
            suggest: present(version.suggest),
            conflict: present(version.conflict),
            provide: present(version.provide),
            replace: present(version.replace),
            abandoned: package.abandoned.clone(),
            uid: version.id,
        }
    }
}

/// A stored `null` counts as unset everywhere except `dist`.
fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

/// `{"packages": {"<name>": {"<version>": {...}}}}` for one package.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderFile {
    pub packages: IndexMap<String, IndexMap<String, VersionMetadata>>,
}

impl ProviderFile {
    /// Insert a version. A version string seen before keeps its position and
    /// takes the newer metadata.
    pub fn insert(&mut self, metadata: VersionMetadata) {
        self.packages
            .entry(metadata.name.clone())
            .or_default()
            .insert(metadata.version.clone(), metadata);
    }

    /// Number of distinct version strings.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.packages.values().map(IndexMap::len).sum()
    }
}

/// A `{"sha256": "<hex>"}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashRef {
    pub sha256: String,
}

impl From<ContentHash> for HashRef {
    fn from(hash: ContentHash) -> Self {
        Self {
            sha256: hash.to_hex(),
        }
    }
}

/// `{"providers": {"<name>": {"sha256": "<hex>"}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderIndex {
    pub providers: IndexMap<String, HashRef>,
}

/// The `packages.json` entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootIndex {
    pub packages: IndexMap<String, Value>,
    #[serde(rename = "provider-includes")]
    pub provider_includes: IndexMap<String, HashRef>,
    #[serde(rename = "providers-url")]
    pub providers_url: String,
}

impl RootIndex {
    /// Root index pointing at the provider index with the given hash.
    #[must_use]
    pub fn new(index_hash: ContentHash) -> Self {
        let include = PROVIDER_INDEX_TEMPLATE.replace("%hash%", &index_hash.to_hex());
        let mut provider_includes = IndexMap::new();
        provider_includes.insert(include, HashRef::from(index_hash));
        Self {
            packages: IndexMap::new(),
            provider_includes,
            providers_url: PROVIDERS_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partitura_core::{VersionRecord, to_canonical_json};

    fn widget() -> Package {
        Package {
            id: 1,
            name: "acme/widget".into(),
            abandoned: Abandoned::No,
            latest_version: Some("1.0.0".into()),
        }
    }

    fn version(record: VersionRecord) -> Version {
        Version::try_from(record).unwrap()
    }

    fn base_record() -> VersionRecord {
        VersionRecord {
            id: 10,
            package_id: 1,
            version: "1.0.0".into(),
            normalized_version: "1.0.0.0".into(),
            ..VersionRecord::default()
        }
    }

    fn encode<T: Serialize>(value: &T) -> String {
        String::from_utf8(to_canonical_json(value).unwrap()).unwrap()
    }

    #[test]
    fn minimal_version_defaults() {
        let metadata = VersionMetadata::build(&widget(), version(base_record()), None);
        assert_eq!(
            encode(&metadata),
            r#"{"name":"acme/widget","description":"","keywords":[],"homepage":"","version":"1.0.0","version_normalized":"1.0.0.0","license":[],"authors":[],"type":"library","uid":10}"#
        );
    }

    #[test]
    fn optional_fields_in_published_order() {
        let record = VersionRecord {
            package_type: Some("composer-plugin".into()),
            time: Some("2024-01-02T03:04:05+00:00".into()),
            autoload: Some(r#"{"psr-4":{"Acme\\":"src/"}}"#.into()),
            extra: Some(r#"{"class":"Acme\\Plugin"}"#.into()),
            target_dir: Some("Acme".into()),
            include_paths: Some("lib/".into()),
            binaries: Some(r#"["bin/widget"]"#.into()),
            suggest: Some(r#"{"ext-intl":"for locales"}"#.into()),
            conflict: Some(r#"{"acme/old":"*"}"#.into()),
            provide: Some(r#"{"psr/log-implementation":"1.0"}"#.into()),
            replace: Some(r#"{"acme/legacy":"self.version"}"#.into()),
            ..base_record()
        };
        let mut require = IndexMap::new();
        require.insert("php".to_string(), ">=8.1".to_string());

        let metadata = VersionMetadata::build(&widget(), version(record), Some(require));
        let json = encode(&metadata);

        let keys = [
            "\"type\"",
            "\"time\"",
            "\"autoload\"",
            "\"extra\"",
            "\"target-dir\"",
            "\"include-path\"",
            "\"bin\"",
            "\"require\"",
            "\"suggest\"",
            "\"conflict\"",
            "\"provide\"",
            "\"replace\"",
            "\"uid\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert!(json.contains(r#""include-path":"lib/""#));
        assert!(!json.contains("\"abandoned\""));
        assert!(json.ends_with(r#""uid":10}"#));
    }

    #[test]
    fn dist_presence() {
        let absent = VersionMetadata::build(&widget(), version(base_record()), None);
        assert!(!encode(&absent).contains("\"dist\""));

        let null = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                dist: Some("null".into()),
                ..base_record()
            }),
            None,
        );
        assert!(encode(&null).contains(r#""dist":null,"type""#));

        let object = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                dist: Some(r#"{"type":"zip","url":"http://x/1.0.0.zip"}"#.into()),
                ..base_record()
            }),
            None,
        );
        assert!(encode(&object).contains(r#""dist":{"type":"zip","url":"http://x/1.0.0.zip"}"#));
    }

    #[test]
    fn stored_null_falls_back_to_defaults() {
        let metadata = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                keywords: Some("null".into()),
                autoload: Some("null".into()),
                ..base_record()
            }),
            None,
        );
        let json = encode(&metadata);
        assert!(json.contains(r#""keywords":[]"#));
        assert!(!json.contains("\"autoload\""));
    }

    #[test]
    fn empty_homepage_is_kept() {
        let metadata = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                homepage: Some(String::new()),
                ..base_record()
            }),
            None,
        );
        assert!(encode(&metadata).contains(r#""homepage":"""#));
    }

    #[test]
    fn abandoned_variants() {
        let mut package = widget();
        package.abandoned = Abandoned::Yes;
        let yes = VersionMetadata::build(&package, version(base_record()), None);
        assert!(encode(&yes).ends_with(r#""abandoned":true,"uid":10}"#));

        package.abandoned = Abandoned::Replacement("acme/gadget".into());
        let replaced = VersionMetadata::build(&package, version(base_record()), None);
        assert!(encode(&replaced).ends_with(r#""abandoned":"acme/gadget","uid":10}"#));
    }

    #[test]
    fn duplicate_version_overwrites_in_place() {
        let mut file = ProviderFile::default();
        let first = VersionMetadata::build(&widget(), version(base_record()), None);
        let other = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                id: 11,
                version: "2.0.0".into(),
                ..base_record()
            }),
            None,
        );
        let duplicate = VersionMetadata::build(
            &widget(),
            version(VersionRecord {
                id: 12,
                ..base_record()
            }),
            None,
        );
        file.insert(first);
        file.insert(other);
        file.insert(duplicate);

        let versions = &file.packages["acme/widget"];
        assert_eq!(file.version_count(), 2);
        assert_eq!(versions.keys().collect::<Vec<_>>(), vec!["1.0.0", "2.0.0"]);
        assert_eq!(versions["1.0.0"].uid, 12);
    }

    #[test]
    fn root_index_shape() {
        let hash = ContentHash::from_bytes(b"index");
        let hex = hash.to_hex();
        assert_eq!(
            encode(&RootIndex::new(hash)),
            format!(
                r#"{{"packages":{{}},"provider-includes":{{"p/provider/{hex}.json":{{"sha256":"{hex}"}}}},"providers-url":"/p/%package%/%hash%.json"}}"#
            )
        );
    }

    #[test]
    fn provider_templates() {
        assert_eq!(provider_template("acme/widget"), "p/acme/widget/%hash%.json");
    }
}
