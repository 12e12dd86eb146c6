//! Package, version and dependency records.
//!
//! `*Record` types mirror the rows of the backing store, including the
//! opaque JSON text columns. [`Version`] is the decoded form the generator
//! works with: every stored blob is parsed exactly once, when the record is
//! converted.

use crate::json::decode_stored;
use crate::{Error, Result};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Composer's default package type.
pub const DEFAULT_PACKAGE_TYPE: &str = "library";

/// Package identifier (vendor/name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName {
    vendor: String,
    name: String,
}

impl PackageName {
    /// Parse from "vendor/name" string.
    ///
    /// Rejects names that could escape the provider directory when used as a
    /// path component.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (vendor, name) = s.split_once('/')?;
        let valid = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
        };
        if !valid(vendor) || !valid(name) {
            return None;
        }
        Some(Self {
            vendor: vendor.to_string(),
            name: name.to_string(),
        })
    }

    /// Get vendor.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Get name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vendor, self.name)
    }
}

/// Abandonment state of a package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Abandoned {
    /// Actively maintained.
    #[default]
    No,
    /// Abandoned without a suggested replacement.
    Yes,
    /// Abandoned in favour of another package.
    Replacement(String),
}

impl Abandoned {
    /// Build from the stored flag and optional replacement column.
    #[must_use]
    pub fn from_stored(abandoned: bool, replacement: Option<String>) -> Self {
        match (abandoned, replacement) {
            (false, _) => Self::No,
            (true, Some(name)) if !name.is_empty() => Self::Replacement(name),
            (true, _) => Self::Yes,
        }
    }

    /// Whether the package is still maintained.
    #[must_use]
    pub fn is_no(&self) -> bool {
        matches!(self, Self::No)
    }
}

/// Serializes as `true` or the replacement name; `No` is never emitted.
impl Serialize for Abandoned {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::No => serializer.serialize_bool(false),
            Self::Yes => serializer.serialize_bool(true),
            Self::Replacement(name) => serializer.serialize_str(name),
        }
    }
}

/// Stored package row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    /// Row identity.
    pub id: u64,
    /// `vendor/name`.
    pub name: String,
    /// Abandoned flag.
    #[serde(default)]
    pub abandoned: bool,
    /// Suggested replacement when abandoned.
    #[serde(default)]
    pub replacement_package: Option<String>,
    /// Latest resolvable version, if any.
    #[serde(default)]
    pub latest_version: Option<String>,
}

/// A package taking part in a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Row identity.
    pub id: u64,
    /// `vendor/name`.
    pub name: String,
    /// Abandonment state.
    pub abandoned: Abandoned,
    /// Latest resolvable version.
    pub latest_version: Option<String>,
}

impl TryFrom<PackageRecord> for Package {
    type Error = Error;

    fn try_from(record: PackageRecord) -> Result<Self> {
        if PackageName::parse(&record.name).is_none() {
            return Err(Error::Source(format!(
                "package {} has invalid name '{}'",
                record.id, record.name
            )));
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            abandoned: Abandoned::from_stored(record.abandoned, record.replacement_package),
            latest_version: record.latest_version,
        })
    }
}

/// Stored version row. JSON columns are kept as raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub id: u64,
    pub package_id: u64,
    pub version: String,
    pub normalized_version: String,
    #[serde(default, rename = "type")]
    pub package_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub conflict: Option<String>,
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub provide: Option<String>,
    #[serde(default)]
    pub suggest: Option<String>,
    #[serde(default)]
    pub autoload: Option<String>,
    #[serde(default)]
    pub include_paths: Option<String>,
    #[serde(default)]
    pub target_dir: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub binaries: Option<String>,
    #[serde(default)]
    pub dist: Option<String>,
}

/// A decoded version.
///
/// `None` means the column was unset. For `dist`, `Some(Value::Null)` means
/// a stored literal `null`, which is emitted as such.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub id: u64,
    pub package_id: u64,
    pub version: String,
    pub normalized_version: String,
    pub package_type: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Value>,
    pub homepage: Option<String>,
    pub time: Option<String>,
    pub license: Option<Value>,
    pub authors: Option<Value>,
    pub dist: Option<Value>,
    pub autoload: Option<Value>,
    pub extra: Option<Value>,
    pub target_dir: Option<String>,
    pub include_path: Option<String>,
    pub bin: Option<Value>,
    pub suggest: Option<Value>,
    pub conflict: Option<Value>,
    pub provide: Option<Value>,
    pub replace: Option<Value>,
}

impl TryFrom<VersionRecord> for Version {
    type Error = Error;

    fn try_from(record: VersionRecord) -> Result<Self> {
        let id = record.id;
        let decode = |field, stored: &Option<String>| decode_stored(id, field, stored.as_deref());

        Ok(Self {
            keywords: decode("keywords", &record.keywords)?,
            license: decode("license", &record.license)?,
            authors: decode("authors", &record.authors)?,
            dist: decode("dist", &record.dist)?,
            autoload: decode("autoload", &record.autoload)?,
            extra: decode("extra", &record.extra)?,
            bin: decode("binaries", &record.binaries)?,
            suggest: decode("suggest", &record.suggest)?,
            conflict: decode("conflict", &record.conflict)?,
            provide: decode("provide", &record.provide)?,
            replace: decode("replace", &record.replace)?,
            id,
            package_id: record.package_id,
            version: record.version,
            normalized_version: record.normalized_version,
            package_type: record.package_type,
            description: record.description,
            homepage: record.homepage,
            time: record.time,
            target_dir: record.target_dir,
            include_path: record.include_paths,
        })
    }
}

/// Stored dependency row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    /// Owning version.
    pub version_id: u64,
    /// Required package.
    pub name: String,
    /// Version constraint string.
    pub constraints: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_package_name() {
        let name = PackageName::parse("acme/widget").expect("valid package name should parse");
        assert_eq!(name.vendor(), "acme");
        assert_eq!(name.name(), "widget");
        assert_eq!(name.to_string(), "acme/widget");
    }

    #[test]
    fn invalid_package_name() {
        assert!(PackageName::parse("invalid").is_none());
        assert!(PackageName::parse("/name").is_none());
        assert!(PackageName::parse("vendor/").is_none());
        assert!(PackageName::parse("../etc").is_none());
        assert!(PackageName::parse("a/b/c").is_none());
    }

    #[test]
    fn abandoned_from_stored() {
        assert_eq!(Abandoned::from_stored(false, Some("x/y".into())), Abandoned::No);
        assert_eq!(Abandoned::from_stored(true, None), Abandoned::Yes);
        assert_eq!(Abandoned::from_stored(true, Some(String::new())), Abandoned::Yes);
        assert_eq!(
            Abandoned::from_stored(true, Some("acme/gadget".into())),
            Abandoned::Replacement("acme/gadget".into())
        );
    }

    #[test]
    fn abandoned_serializes_as_flag_or_name() {
        assert_eq!(serde_json::to_string(&Abandoned::Yes).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&Abandoned::Replacement("acme/gadget".into())).unwrap(),
            "\"acme/gadget\""
        );
    }

    #[test]
    fn version_record_decodes_blobs_once() {
        let record = VersionRecord {
            id: 10,
            package_id: 1,
            version: "1.0.0".into(),
            normalized_version: "1.0.0.0".into(),
            keywords: Some(r#"["cli","tool"]"#.into()),
            dist: Some("null".into()),
            target_dir: Some("Acme/Widget".into()),
            ..VersionRecord::default()
        };
        let version = Version::try_from(record).unwrap();
        assert_eq!(version.keywords, Some(serde_json::json!(["cli", "tool"])));
        assert_eq!(version.dist, Some(Value::Null));
        assert_eq!(version.target_dir.as_deref(), Some("Acme/Widget"));
        assert!(version.autoload.is_none());
    }

    #[test]
    fn include_paths_are_published_verbatim() {
        let record = VersionRecord {
            id: 10,
            include_paths: Some("lib/".into()),
            ..VersionRecord::default()
        };
        let version = Version::try_from(record).unwrap();
        assert_eq!(version.include_path.as_deref(), Some("lib/"));
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let record = VersionRecord {
            id: 7,
            authors: Some("[{".into()),
            ..VersionRecord::default()
        };
        assert!(matches!(
            Version::try_from(record),
            Err(Error::Decode { version_id: 7, field: "authors", .. })
        ));
    }

    #[test]
    fn record_field_names_match_store_columns() {
        let record: PackageRecord = serde_json::from_str(
            r#"{"id":1,"name":"acme/widget","abandoned":true,"replacementPackage":"acme/gadget","latestVersion":"1.0.0"}"#,
        )
        .unwrap();
        let package = Package::try_from(record).unwrap();
        assert_eq!(package.abandoned, Abandoned::Replacement("acme/gadget".into()));
    }
}
