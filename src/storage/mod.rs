//! Filesystem persistence for map documents.
//!
//! Two logical pieces compose the persistence behavior:
//!
//! *   **Document codec** ([`encode`]/[`decode`]): converts between an
//!     in-memory map document and its JSON text representation. Encoding
//!     stamps the current time; decoding is best-effort and degrades a
//!     malformed file into a raw-text document instead of failing the
//!     listing that found it.
//! *   **Storage gateways**: [`PrivateStore`] performs read/write/list/delete
//!     against the app-private directory and resolves filename collisions;
//!     [`write_to_chosen_location`] and [`batch_import`] write to and import
//!     from opaque picker-supplied [`LocationHandle`]s.
//!
//! On top of both sits the [`MapCatalog`]: the coordinator owning the
//! in-memory list of known documents. A save serializes through the codec,
//! writes through a gateway, and only then appends to the list; startup
//! listing goes the other way. All mutation of the list funnels through the
//! catalog's single replace path.
//!
//! # Storage keys
//!
//! A document's name becomes a storage key via [`sanitize_name`]: trimmed,
//! blank input replaced by a fallback, the characters `/ \ : * ? " < > |`
//! replaced with `_`, and the `.json` extension appended when missing.
//! Within app-private storage no two documents share a key; collisions are
//! resolved by a numeric suffix before the extension (`Map(1).json`).
//! Picker-chosen targets have no stable key the app can retain: only
//! app-private documents are rediscovered on the next launch.
//!
//! # Asynchronous API
//!
//! All I/O here is `async` on the `tokio` runtime. The UI thread awaits
//! completion; nothing in this module blocks it. Operations are discrete and
//! stateless: no locking, no transactions, and no ordering guarantees
//! beyond "list once at startup, write on explicit user action".
//!
//! # Failure policy
//!
//! No failure in this module is fatal to the process. Every operation
//! returns [`StoreResult`] with a [`StoreError`] from a small taxonomy, so
//! callers can discriminate a cancelled picker from a genuine failure
//! without string-matching. Worst case a single document fails to load or
//! save and is skipped or reported individually.

pub use self::catalog::{ImportSummary, MapCatalog, SaveOutcome};
pub use self::codec::{decode, encode, parse_content};
pub use self::device::{
    batch_import, resolve_display_name, write_to_chosen_location, FsLocation, ImportResult,
    ImportedMap, LocationHandle,
};
pub use self::private::{sanitize_name, PrivateStore, StoredEntry};

mod catalog;
mod codec;
mod device;
mod private;

use thiserror::Error;

/// Extension every stored map key carries, without the leading dot.
pub const MAP_EXTENSION: &str = "json";

/// Name substituted when the create dialog is confirmed with a blank field.
pub const DEFAULT_MAP_NAME: &str = "Untitled.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No stored map under key '{0}'")]
    NotFound(String),

    #[error("I/O failure")]
    Io(#[from] std::io::Error),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Malformed map document")]
    Parse(#[from] serde_json::Error),

    #[error("Cancelled by the user")]
    Cancelled,
}

impl StoreError {
    /// Folds an I/O error into the taxonomy, keyed by the path or key it hit.
    pub(crate) fn from_io(key: &str, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(key.to_string()),
            std::io::ErrorKind::PermissionDenied => StoreError::AccessDenied(key.to_string()),
            _ => StoreError::Io(e),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
