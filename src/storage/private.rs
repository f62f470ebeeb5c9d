//! Gateway to the app-private storage directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::UNIX_EPOCH;

use regex::Regex;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::storage::{StoreError, StoreResult, MAP_EXTENSION};

fn illegal_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|]"#).expect("illegal-char pattern is valid"))
}

/// One entry of the private-storage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub path: PathBuf,
    /// Last-modified time in milliseconds since the epoch; 0 when the
    /// backend cannot supply one.
    pub modified_ms: u64,
}

/// Durable read/write/list/delete against the app-private directory.
///
/// Keys are plain filenames produced by [`sanitize_name`]. Every operation
/// is a discrete, stateless unit; writes have overwrite semantics.
#[derive(Debug, Clone)]
pub struct PrivateStore {
    root: PathBuf,
}

impl PrivateStore {
    /// Wraps the given directory. The host shell decides where app-private
    /// storage lives; the directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PrivateStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Writes `text` under `key`, creating or truncating as needed.
    #[instrument(skip(self, text), fields(root = %self.root.display()))]
    pub async fn write(&self, key: &str, text: &str) -> StoreResult<()> {
        fs::write(self.key_path(key), text.as_bytes())
            .await
            .map_err(|e| StoreError::from_io(key, e))?;
        debug!("Wrote {} bytes under '{}'", text.len(), key);
        Ok(())
    }

    /// Reads the text stored under `key`.
    ///
    /// A missing key is `Ok(None)`, not an error. Other failures are folded
    /// into the taxonomy and logged.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No stored map under '{}'", key);
                Ok(None)
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                warn!("Cannot access '{}': {}", key, e);
                Err(StoreError::AccessDenied(key.to_string()))
            }
            Err(e) => {
                warn!("I/O error while reading '{}': {}", key, e);
                Err(StoreError::Io(e))
            }
        }
    }

    /// Lists stored maps. Only entries carrying the map extension are
    /// returned; a missing or inaccessible directory yields an empty listing.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn list(&self) -> StoreResult<Vec<StoredEntry>> {
        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    || e.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                warn!("Private storage not listable: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let suffix = format!(".{}", MAP_EXTENSION);
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(StoreError::Io)? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue; // skip non-unicode filenames
            };
            if !name.ends_with(&suffix) {
                continue;
            }
            let modified_ms = match entry.metadata().await {
                Ok(meta) => modified_millis(&meta),
                Err(e) => {
                    warn!("No metadata for '{}': {}", name, e);
                    0
                }
            };
            entries.push(StoredEntry {
                name: name.to_string(),
                path,
                modified_ms,
            });
        }
        debug!("Found {} stored maps", entries.len());
        Ok(entries)
    }

    /// Removes the map stored under `key`.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        fs::remove_file(self.key_path(key))
            .await
            .map_err(|e| StoreError::from_io(key, e))?;
        debug!("Deleted '{}'", key);
        Ok(())
    }

    /// Resolves a storage key that does not collide with an existing entry.
    ///
    /// Returns `base` unchanged when it is unused; otherwise probes
    /// `base(1).json`, `base(2).json`, … until a free key turns up. One
    /// existence check per candidate, linear in the number of collisions.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn unique_key(&self, base: &str) -> StoreResult<String> {
        let suffix = format!(".{}", MAP_EXTENSION);
        let stem = base.strip_suffix(&suffix).unwrap_or(base);

        let mut candidate = base.to_string();
        let mut index = 1u32;
        while fs::try_exists(self.key_path(&candidate))
            .await
            .map_err(StoreError::Io)?
        {
            candidate = format!("{}({}).{}", stem, index, MAP_EXTENSION);
            index += 1;
        }
        Ok(candidate)
    }
}

fn modified_millis(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Normalizes user input into a storage key.
///
/// Trims the input, substitutes `fallback` for blank input, replaces each of
/// the characters `/ \ : * ? " < > |` with `_`, and appends the `.json`
/// extension unless it is already there (case-insensitive check).
/// Idempotent: sanitizing an already-sanitized name is a no-op.
pub fn sanitize_name(input: &str, fallback: &str) -> String {
    let trimmed = input.trim();
    let trimmed = if trimmed.is_empty() { fallback } else { trimmed };

    let sanitized = illegal_chars().replace_all(trimmed, "_");

    let suffix = format!(".{}", MAP_EXTENSION);
    if sanitized.to_lowercase().ends_with(&suffix) {
        sanitized.into_owned()
    } else {
        format!("{}{}", sanitized, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DEFAULT_MAP_NAME;
    use tempfile::tempdir;

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize_name("a/b:c", DEFAULT_MAP_NAME), "a_b_c.json");
        assert_eq!(
            sanitize_name(r#"w\x*y?z"<>|"#, DEFAULT_MAP_NAME),
            "w_x_y_z____.json"
        );
    }

    #[test]
    fn sanitize_substitutes_fallback_for_blank_input() {
        assert_eq!(sanitize_name("", "Untitled.json"), "Untitled.json");
        assert_eq!(sanitize_name("   ", "Untitled.json"), "Untitled.json");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["a/b:c", "", "  Plan  ", "Done.JSON", "x.json"] {
            let once = sanitize_name(input, DEFAULT_MAP_NAME);
            assert_eq!(sanitize_name(&once, DEFAULT_MAP_NAME), once);
        }
    }

    #[test]
    fn sanitize_keeps_existing_extension_case_insensitively() {
        assert_eq!(sanitize_name("Done.JSON", DEFAULT_MAP_NAME), "Done.JSON");
        assert_eq!(sanitize_name("plan.json", DEFAULT_MAP_NAME), "plan.json");
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        store.write("Map.json", "hello").await.unwrap();
        assert_eq!(store.read("Map.json").await.unwrap(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn read_missing_key_is_absent_not_an_error() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        assert_eq!(store.read("nope.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unique_key_probes_past_collisions() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        // No collision: the base comes back unchanged.
        assert_eq!(store.unique_key("Map.json").await.unwrap(), "Map.json");

        // Persist the first result; the same base now resolves differently.
        store.write("Map.json", "{}").await.unwrap();
        assert_eq!(store.unique_key("Map.json").await.unwrap(), "Map(1).json");

        store.write("Map(1).json", "{}").await.unwrap();
        assert_eq!(store.unique_key("Map.json").await.unwrap(), "Map(2).json");
    }

    #[tokio::test]
    async fn list_skips_entries_without_the_extension() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        store.write("a.json", "{}").await.unwrap();
        fs::write(dir.path().join("notes.txt"), "x").await.unwrap();
        fs::write(dir.path().join("b.json"), "{}").await.unwrap();
        fs::create_dir(dir.path().join("sub.json")).await.unwrap();

        let mut names: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.name).collect();
        names.sort();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[tokio::test]
    async fn list_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path().join("gone"));

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_reports_modified_time() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        store.write("t.json", "{}").await.unwrap();
        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].modified_ms > 0);
    }

    #[tokio::test]
    async fn delete_removes_the_key_and_reports_missing_ones() {
        let dir = tempdir().unwrap();
        let store = PrivateStore::new(dir.path());

        store.write("x.json", "{}").await.unwrap();
        store.delete("x.json").await.unwrap();
        assert_eq!(store.read("x.json").await.unwrap(), None);

        let err = store.delete("x.json").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(key) if key == "x.json"));
    }
}
