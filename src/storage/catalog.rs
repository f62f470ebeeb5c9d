//! The coordinator owning the in-memory list of known map documents.

use tracing::{debug, instrument, warn};

use crate::model::{now_millis, MapDocument, MapDraft, StorageLocation};
use crate::storage::{
    codec, device, sanitize_name, ImportResult, LocationHandle, PrivateStore, StoreError,
    StoreResult, DEFAULT_MAP_NAME, MAP_EXTENSION,
};

/// Outcome of a save against a picker-chosen location.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The document was written and appended to the catalog.
    Saved(MapDocument),
    /// The user dismissed the picker. Nothing was written, the catalog is
    /// unchanged, and this is not an error.
    Cancelled,
}

impl SaveOutcome {
    /// Collapses the outcome for callers that want a single result channel;
    /// cancellation maps to [`StoreError::Cancelled`].
    pub fn into_result(self) -> StoreResult<MapDocument> {
        match self {
            SaveOutcome::Saved(document) => Ok(document),
            SaveOutcome::Cancelled => Err(StoreError::Cancelled),
        }
    }
}

/// Outcome of a multi-document import.
#[derive(Debug)]
pub enum ImportSummary {
    /// The picker came back empty; nothing was read.
    Cancelled,
    /// One result per picked handle, in pick order. Successes are already in
    /// the catalog; failures are for the shell to report individually.
    Completed(Vec<ImportResult>),
}

/// Owns the list of documents the UI renders and funnels every mutation
/// through one replace path. Single writer: the UI issues one request at a
/// time and awaits it.
#[derive(Debug)]
pub struct MapCatalog {
    store: PrivateStore,
    documents: Vec<MapDocument>,
}

impl MapCatalog {
    pub fn new(store: PrivateStore) -> Self {
        MapCatalog {
            store,
            documents: Vec::new(),
        }
    }

    /// The current document list.
    pub fn documents(&self) -> &[MapDocument] {
        &self.documents
    }

    /// Replaces the list wholesale. All mutation funnels through here.
    pub fn replace(&mut self, documents: Vec<MapDocument>) {
        self.documents = documents;
    }

    /// Whether some known document already uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.documents.iter().any(|d| d.name == name)
    }

    fn append(&mut self, document: MapDocument) {
        let mut next = self.documents.clone();
        next.push(document);
        self.replace(next);
    }

    /// Rebuilds the list from app-private storage.
    ///
    /// One document per stored entry; unreadable and empty files are skipped
    /// with a logged diagnostic, malformed ones are kept in degraded form.
    /// The result is sorted descending by name. Returns the number of
    /// documents loaded.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> StoreResult<usize> {
        let mut loaded = Vec::new();
        for entry in self.store.list().await? {
            let text = match self.store.read(&entry.name).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping unreadable map '{}': {}", entry.name, e);
                    continue;
                }
            };
            if text.is_empty() {
                debug!("Skipping empty map '{}'", entry.name);
                continue;
            }
            let mut doc = codec::decode(&entry.name, &text, entry.modified_ms);
            // Everything under the private directory is app storage,
            // whatever the record claims.
            doc.location = StorageLocation::App;
            loaded.push(doc);
        }
        loaded.sort_by(|a, b| b.name.cmp(&a.name));
        let count = loaded.len();
        self.replace(loaded);
        debug!("Loaded {} maps from private storage", count);
        Ok(count)
    }

    /// Saves a draft into app-private storage.
    ///
    /// The name is sanitized and a non-colliding key resolved; the document
    /// joins the list, carrying the stored key as its name, only after the
    /// write succeeds. A failed write leaves the list unchanged.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn save_to_private(&mut self, draft: MapDraft) -> StoreResult<MapDocument> {
        let sanitized = sanitize_name(&draft.name, DEFAULT_MAP_NAME);
        let key = self.store.unique_key(&sanitized).await?;
        let text = codec::encode(&sanitized, StorageLocation::App, &draft.content)?;
        self.store.write(&key, &text).await?;

        let document = MapDocument {
            name: key,
            content: draft.content,
            location: StorageLocation::App,
            created_at: now_millis(),
        };
        self.append(document.clone());
        Ok(document)
    }

    /// Saves a draft to a picker-chosen location.
    ///
    /// `None` means the user cancelled the picker: a distinct outcome, not a
    /// failure. On success the document joins the list under its display
    /// name (no extension), since a device target has no stable key the app
    /// could retain.
    #[instrument(skip(self, picked, draft), fields(name = %draft.name))]
    pub async fn save_to_device(
        &mut self,
        picked: Option<&dyn LocationHandle>,
        draft: MapDraft,
    ) -> StoreResult<SaveOutcome> {
        let Some(handle) = picked else {
            debug!("Save cancelled from the picker");
            return Ok(SaveOutcome::Cancelled);
        };

        let sanitized = sanitize_name(&draft.name, DEFAULT_MAP_NAME);
        let text = codec::encode(&sanitized, StorageLocation::Device, &draft.content)?;
        device::write_to_chosen_location(handle, &text).await?;

        let suffix = format!(".{}", MAP_EXTENSION);
        let document = MapDocument {
            name: sanitized
                .strip_suffix(&suffix)
                .unwrap_or(&sanitized)
                .to_string(),
            content: draft.content,
            location: StorageLocation::Device,
            created_at: now_millis(),
        };
        self.append(document.clone());
        Ok(SaveOutcome::Saved(document))
    }

    /// Imports picker-chosen documents.
    ///
    /// An empty pick is the cancelled outcome. Each successful entry joins
    /// the list as a device document whose content is the whole parsed
    /// value; failures stay in the summary for the shell to report.
    #[instrument(skip(self, handles), fields(count = handles.len()))]
    pub async fn import_from_device(&mut self, handles: &[&dyn LocationHandle]) -> ImportSummary {
        if handles.is_empty() {
            debug!("Import cancelled from the picker");
            return ImportSummary::Cancelled;
        }

        let results = device::batch_import(handles).await;
        let mut next = self.documents.clone();
        for result in &results {
            if let Ok(imported) = &result.outcome {
                next.push(MapDocument {
                    name: imported.name.clone(),
                    content: imported.content.clone(),
                    location: StorageLocation::Device,
                    created_at: now_millis(),
                });
            }
        }
        self.replace(next);
        ImportSummary::Completed(results)
    }

    /// Deletes the stored file under `key` and drops the matching list entry.
    #[instrument(skip(self))]
    pub async fn delete_from_private(&mut self, key: &str) -> StoreResult<()> {
        self.store.delete(key).await?;
        let next: Vec<MapDocument> = self
            .documents
            .iter()
            .filter(|d| !(d.location == StorageLocation::App && d.name == key))
            .cloned()
            .collect();
        self.replace(next);
        Ok(())
    }
}
