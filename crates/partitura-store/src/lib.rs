//! Content-addressed file store for Partitura.
//!
//! Documents are written under a root directory at paths derived from the
//! SHA-256 of their own serialized bytes (`p/acme/widget/<sha256>.json`).
//! Writing identical content twice is a no-op; writing new content for the
//! same document reports the files it superseded so they can be retired
//! after a grace period instead of being deleted under a client's feet.
//!
//! ```no_run
//! use partitura_store::{CollectingSink, ContentStore, StaleSink};
//!
//! # fn example() -> partitura_core::Result<()> {
//! let store = ContentStore::new("/srv/composer");
//! let mut stale = Vec::new();
//! let stored = store.write_json(
//!     &serde_json::json!({"packages": {}}),
//!     "p/acme/widget/%hash%.json",
//!     &mut stale,
//! )?;
//! println!("{} -> {}", stored.hash, stored.path.display());
//!
//! let sink = CollectingSink::new();
//! if !stale.is_empty() {
//!     sink.retire(stale);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod atomic;
pub mod retire;
pub mod writer;

pub use atomic::write_atomic;
pub use retire::{CollectingSink, DeferredDeleter, DeletionReport, StaleSink, delete_paths};
pub use writer::{ContentStore, HASH_PLACEHOLDER, StoredFile, WriteOutcome};
