//! Gateway to user-chosen storage targets.
//!
//! The system file picker hands the app an opaque handle to wherever the
//! user pointed it. This module writes documents to such handles and imports
//! documents back from them; it never constructs a handle itself and cannot
//! re-enumerate one after the operation completes.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::storage::{codec, StoreError, StoreResult};

/// An opaque read/write target supplied by the system picker.
#[async_trait]
pub trait LocationHandle: Send + Sync {
    /// Writes UTF-8 text to the target, flushing and closing the stream on
    /// every exit path.
    async fn write_text(&self, text: &str) -> std::io::Result<()>;

    /// Reads the target's full content as UTF-8 text.
    async fn read_text(&self) -> std::io::Result<String>;

    /// The target's human-readable display name, when the backend has one.
    async fn display_name(&self) -> Option<String>;
}

/// Path-backed handle, for platforms where the picker yields a real
/// filesystem path.
#[derive(Debug, Clone)]
pub struct FsLocation {
    path: PathBuf,
}

impl FsLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FsLocation { path: path.into() }
    }
}

#[async_trait]
impl LocationHandle for FsLocation {
    async fn write_text(&self, text: &str) -> std::io::Result<()> {
        let mut file = fs::File::create(&self.path).await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        file.shutdown().await?;
        Ok(())
    }

    async fn read_text(&self) -> std::io::Result<String> {
        fs::read_to_string(&self.path).await
    }

    async fn display_name(&self) -> Option<String> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    }
}

/// Writes a serialized document to a picker-chosen target. Failures are
/// folded into the taxonomy; the stream is never left open.
#[instrument(skip(handle, text))]
pub async fn write_to_chosen_location(
    handle: &dyn LocationHandle,
    text: &str,
) -> StoreResult<()> {
    let name = resolve_display_name(handle).await.unwrap_or_default();
    handle.write_text(text).await.map_err(|e| {
        warn!("Write to chosen location '{}' failed: {}", name, e);
        StoreError::from_io(&name, e)
    })?;
    debug!("Wrote {} bytes to chosen location '{}'", text.len(), name);
    Ok(())
}

/// Queries a handle's metadata for its display name; absent when the
/// backend cannot supply one.
pub async fn resolve_display_name(handle: &dyn LocationHandle) -> Option<String> {
    handle.display_name().await
}

/// Result of one imported handle: its original position in the pick, plus
/// either the imported map or the failure that stopped it.
#[derive(Debug)]
pub struct ImportResult {
    pub index: usize,
    pub outcome: StoreResult<ImportedMap>,
}

/// A successfully imported map: the display name (possibly empty) and the
/// whole parsed JSON value as content.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMap {
    pub name: String,
    pub content: Value,
}

/// Reads and parses every handle, producing one result per input in input
/// order. A failing entry is tagged with its cause and never stops the rest
/// of the batch.
#[instrument(skip(handles), fields(count = handles.len()))]
pub async fn batch_import(handles: &[&dyn LocationHandle]) -> Vec<ImportResult> {
    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.iter().enumerate() {
        let outcome = import_one(*handle).await;
        if let Err(e) = &outcome {
            warn!("Import failed at index {}: {}", index, e);
        }
        results.push(ImportResult { index, outcome });
    }
    results
}

async fn import_one(handle: &dyn LocationHandle) -> StoreResult<ImportedMap> {
    let name = resolve_display_name(handle).await.unwrap_or_default();
    let raw = handle
        .read_text()
        .await
        .map_err(|e| StoreError::from_io(&name, e))?;
    let content = codec::parse_content(&raw)?;
    Ok(ImportedMap { name, content })
}
