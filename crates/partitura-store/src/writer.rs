//! Content-addressed JSON writer.

use crate::atomic::write_atomic;
use partitura_core::{ContentHash, Error, Result, to_canonical_json};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Placeholder substituted with the hex digest in path templates.
pub const HASH_PLACEHOLDER: &str = "%hash%";

/// What a write did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new file was created.
    Written,
    /// A file with this hash already existed; nothing was touched.
    Unchanged,
}

/// Result of a content-addressed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// SHA-256 of the serialized payload.
    pub hash: ContentHash,
    /// Absolute location of the file.
    pub path: PathBuf,
    /// Whether the file was created by this call.
    pub outcome: WriteOutcome,
}

/// Writes JSON documents under a root directory, naming hashed ones by
/// their own SHA-256.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serialize `payload` and write it at `template` with `%hash%` replaced
    /// by the digest of the serialized bytes.
    ///
    /// If the target already exists the call returns immediately: identical
    /// content always maps to the identical path. Otherwise every file
    /// already in the target directory is appended to `stale`, since it can
    /// only be an older version of the same document.
    ///
    /// # Errors
    /// Returns error on an invalid template, serialization failure or IO
    /// failure. An existing target is not an error.
    pub fn write_json<T: Serialize>(
        &self,
        payload: &T,
        template: &str,
        stale: &mut Vec<PathBuf>,
    ) -> Result<StoredFile> {
        let bytes = to_canonical_json(payload)?;
        self.write_bytes(&bytes, template, stale)
    }

    /// [`write_json`](Self::write_json) for already-serialized bytes.
    ///
    /// # Errors
    /// See [`write_json`](Self::write_json).
    pub fn write_bytes(
        &self,
        bytes: &[u8],
        template: &str,
        stale: &mut Vec<PathBuf>,
    ) -> Result<StoredFile> {
        validate_template(template)?;

        let hash = ContentHash::from_bytes(bytes);
        let relative = template.replace(HASH_PLACEHOLDER, &hash.to_hex());
        let path = self.root.join(relative);

        if path.exists() {
            debug!(path = %path.display(), hash = %hash.short(), "unchanged");
            return Ok(StoredFile {
                hash,
                path,
                outcome: WriteOutcome::Unchanged,
            });
        }

        if let Some(dir) = path.parent() {
            collect_siblings(dir, stale)?;
        }

        write_atomic(&path, bytes)?;
        debug!(path = %path.display(), hash = %hash.short(), size = bytes.len(), "written");

        Ok(StoredFile {
            hash,
            path,
            outcome: WriteOutcome::Written,
        })
    }

    /// Serialize `payload` to a fixed, unhashed path, replacing any previous
    /// file.
    ///
    /// # Errors
    /// Returns error on serialization or IO failure.
    pub fn write_fixed<T: Serialize>(&self, payload: &T, relative: &str) -> Result<PathBuf> {
        validate_relative(relative)?;
        let bytes = to_canonical_json(payload)?;
        let path = self.root.join(relative);
        write_atomic(&path, &bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "written");
        Ok(path)
    }
}

/// Append every regular file in `dir` to `stale`. A missing directory
/// contributes nothing.
fn collect_siblings(dir: &Path, stale: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
        // Subdirectories hold other documents, not older versions of this one
        if file_type.is_dir() {
            continue;
        }
        found.push(entry.path());
    }
    // read_dir order is filesystem-dependent
    found.sort();
    stale.extend(found);
    Ok(())
}

fn validate_template(template: &str) -> Result<()> {
    if !template.contains(HASH_PLACEHOLDER) {
        return Err(Error::InvalidTemplate {
            template: template.to_string(),
            reason: format!("missing {HASH_PLACEHOLDER} placeholder"),
        });
    }
    validate_relative(template)
}

fn validate_relative(relative: &str) -> Result<()> {
    let escapes = Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.is_empty() || escapes {
        return Err(Error::InvalidTemplate {
            template: relative.to_string(),
            reason: "must be a relative path inside the webroot".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_under_hash_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let mut stale = Vec::new();

        let payload = json!({"packages": {"acme/widget": {}}});
        let stored = store
            .write_json(&payload, "p/acme/widget/%hash%.json", &mut stale)
            .unwrap();

        let bytes = br#"{"packages":{"acme/widget":{}}}"#;
        assert_eq!(stored.hash, ContentHash::from_bytes(bytes));
        assert_eq!(
            stored.path,
            dir.path()
                .join(format!("p/acme/widget/{}.json", stored.hash.to_hex()))
        );
        assert_eq!(std::fs::read(&stored.path).unwrap(), bytes);
        assert_eq!(stored.outcome, WriteOutcome::Written);
        assert!(stale.is_empty());
    }

    #[test]
    fn existing_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let mut stale = Vec::new();

        let first = store.write_json(&json!([1]), "p/x/%hash%.json", &mut stale).unwrap();
        // Existing targets are trusted without re-reading
        std::fs::write(&first.path, b"tampered").unwrap();

        let second = store.write_json(&json!([1]), "p/x/%hash%.json", &mut stale).unwrap();
        assert_eq!(second.hash, first.hash);
        assert_eq!(second.outcome, WriteOutcome::Unchanged);
        assert_eq!(std::fs::read(&second.path).unwrap(), b"tampered");
        assert!(stale.is_empty());
    }

    #[test]
    fn siblings_become_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let mut stale = Vec::new();

        let old = store.write_json(&json!([1]), "p/x/%hash%.json", &mut stale).unwrap();
        let new = store.write_json(&json!([2]), "p/x/%hash%.json", &mut stale).unwrap();

        assert_ne!(old.hash, new.hash);
        assert_eq!(stale, vec![old.path.clone()]);
        assert!(old.path.exists(), "stale files are never deleted by the writer");
        assert!(new.path.exists());
    }

    #[test]
    fn nested_directories_are_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        let mut stale = Vec::new();

        store
            .write_json(&json!({"a": 1}), "p/provider/nested/%hash%.json", &mut stale)
            .unwrap();
        store
            .write_json(&json!({"b": 1}), "p/provider/%hash%.json", &mut stale)
            .unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn template_must_contain_placeholder() {
        let store = ContentStore::new("/nonexistent");
        let err = store
            .write_json(&json!({}), "p/x/static.json", &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn template_cannot_escape_root() {
        let store = ContentStore::new("/nonexistent");
        for template in ["../%hash%.json", "/tmp/%hash%.json", "p/../../%hash%.json"] {
            let err = store
                .write_json(&json!({}), template, &mut Vec::new())
                .unwrap_err();
            assert!(matches!(err, Error::InvalidTemplate { .. }), "{template}");
        }
    }

    #[test]
    fn fixed_path_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());

        let path = store.write_fixed(&json!({"v": 1}), "packages.json").unwrap();
        store.write_fixed(&json!({"v": 2}), "packages.json").unwrap();
        assert_eq!(path, dir.path().join("packages.json"));
        assert_eq!(std::fs::read(&path).unwrap(), br#"{"v":2}"#);
    }
}
