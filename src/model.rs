//! The map document model shared between the UI shell and the storage layer.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::storage::StoreResult;

/// Where a map document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageLocation {
    /// A user-chosen external target, selected through the system picker
    /// each time. The app cannot re-enumerate it later.
    Device,
    /// The app-private storage directory, enumerable and keyed by filename.
    App,
}

impl StorageLocation {
    /// Human-readable label, persisted as the `storedIn` field.
    pub fn label(&self) -> &'static str {
        match self {
            StorageLocation::Device => "Device storage",
            StorageLocation::App => "App storage",
        }
    }
}

/// One saved map as the catalog knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub name: String,
    /// The page payload. Opaque to the persistence layer; see [`MapPage`]
    /// for the shape the UI reads and writes.
    pub content: Value,
    pub location: StorageLocation,
    /// Milliseconds since the epoch. Display/sort key, and the UI's list key.
    pub created_at: u64,
}

/// What the create dialog hands over: a raw, unsanitized name and the
/// current payload. Becomes a [`MapDocument`] only once a durable write
/// succeeds.
#[derive(Debug, Clone)]
pub struct MapDraft {
    pub name: String,
    pub content: Value,
}

impl MapDraft {
    pub fn new(name: impl Into<String>, content: Value) -> Self {
        MapDraft {
            name: name.into(),
            content,
        }
    }
}

/// A single page of a map: a free-text note or a spatial canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MapPage {
    Note {
        id: u32,
        title: String,
        body: String,
    },
    Space {
        nodes: Vec<SpaceNode>,
    },
}

/// A draggable node on a space canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceNode {
    pub id: u32,
    /// Stable identity for list rendering, independent of position in `nodes`.
    pub uuid: Uuid,
    pub x: f32,
    pub y: f32,
    pub has_border: bool,
    pub text: String,
}

impl SpaceNode {
    pub fn new(id: u32, x: f32, y: f32, text: impl Into<String>) -> Self {
        SpaceNode {
            id,
            uuid: Uuid::new_v4(),
            x,
            y,
            has_border: true,
            text: text.into(),
        }
    }
}

/// Serializes a page list into the opaque content payload.
pub fn pages_to_content(pages: &[MapPage]) -> StoreResult<Value> {
    Ok(serde_json::to_value(pages)?)
}

/// Reads a page list back out of a content payload.
pub fn pages_from_content(content: &Value) -> StoreResult<Vec<MapPage>> {
    Ok(serde_json::from_value(content.clone())?)
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_serializes_symbolically() {
        assert_eq!(
            serde_json::to_value(StorageLocation::Device).unwrap(),
            json!("DEVICE")
        );
        assert_eq!(
            serde_json::to_value(StorageLocation::App).unwrap(),
            json!("APP")
        );
        assert_eq!(StorageLocation::App.label(), "App storage");
    }

    #[test]
    fn page_list_round_trips_through_content() {
        let pages = vec![
            MapPage::Note {
                id: 0,
                title: "Ideas".to_string(),
                body: "start here".to_string(),
            },
            MapPage::Space {
                nodes: vec![SpaceNode::new(0, 12.5, -3.0, "root")],
            },
        ];

        let content = pages_to_content(&pages).unwrap();
        let restored = pages_from_content(&content).unwrap();
        assert_eq!(restored, pages);
    }

    #[test]
    fn page_variants_are_tagged() {
        let content = pages_to_content(&[MapPage::Space { nodes: vec![] }]).unwrap();
        assert_eq!(content[0]["type"], json!("Space"));
    }
}
