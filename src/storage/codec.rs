//! JSON text codec for map documents.
//!
//! One JSON object per document, pretty-printed for readability:
//!
//! ```json
//! {
//!   "fileName": "Groceries.json",
//!   "storage": "APP",
//!   "createdAt": 1754200000000,
//!   "fileContent": { ... },
//!   "storedIn": "App storage"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::{now_millis, MapDocument, StorageLocation};
use crate::storage::StoreResult;

/// On-disk shape of one map document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MapRecord<'a> {
    file_name: &'a str,
    storage: StorageLocation,
    created_at: u64,
    file_content: &'a Value,
    stored_in: &'a str,
}

/// The fields the reader recovers individually. Anything missing falls back
/// per field instead of failing the document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialRecord {
    #[serde(default)]
    storage: Option<StorageLocation>,
    #[serde(default)]
    created_at: Option<u64>,
    #[serde(default)]
    file_content: Option<Value>,
}

/// Serializes a document for storage.
///
/// `createdAt` is stamped with the current time at encode time, not the
/// document's own timestamp; `storedIn` is the location's display label.
pub fn encode(name: &str, location: StorageLocation, content: &Value) -> StoreResult<String> {
    let record = MapRecord {
        file_name: name,
        storage: location,
        created_at: now_millis(),
        file_content: content,
        stored_in: location.label(),
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

/// Reads a document back out of JSON text. Never fails.
///
/// On a parse failure the raw text becomes the content and the file's
/// last-modified time (`modified_ms`) the timestamp, so one bad file still
/// shows up in the listing. An intact record falls back field by field:
/// absent `fileContent` to the empty string, absent `createdAt` to
/// `modified_ms`, absent `storage` to app storage.
pub fn decode(name: &str, text: &str, modified_ms: u64) -> MapDocument {
    match serde_json::from_str::<PartialRecord>(text) {
        Ok(record) => MapDocument {
            name: name.to_string(),
            content: record
                .file_content
                .unwrap_or_else(|| Value::String(String::new())),
            location: record.storage.unwrap_or(StorageLocation::App),
            created_at: record.created_at.unwrap_or(modified_ms),
        },
        Err(e) => {
            warn!("Map '{}' is not valid JSON, keeping raw text: {}", name, e);
            MapDocument {
                name: name.to_string(),
                content: Value::String(text.to_string()),
                location: StorageLocation::App,
                created_at: modified_ms,
            }
        }
    }
}

/// Strict parse used by import: blank or malformed text is an error.
pub fn parse_content(text: &str) -> StoreResult<Value> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;
    use serde_json::json;

    #[test]
    fn round_trip_recovers_content_and_location() {
        let content = json!({"pages": [{"type": "Note", "id": 0, "title": "t", "body": "b"}]});
        let text = encode("Trip.json", StorageLocation::Device, &content).unwrap();

        let doc = decode("Trip.json", &text, 0);
        assert_eq!(doc.content, content);
        assert_eq!(doc.location, StorageLocation::Device);
        // createdAt is stamped at encode time, so it only has to be present.
        assert!(doc.created_at > 0);
    }

    #[test]
    fn encode_writes_the_record_fields() {
        let text = encode("A.json", StorageLocation::App, &json!("payload")).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["fileName"], json!("A.json"));
        assert_eq!(value["storage"], json!("APP"));
        assert_eq!(value["fileContent"], json!("payload"));
        assert_eq!(value["storedIn"], json!("App storage"));
        assert!(value["createdAt"].is_u64());
    }

    #[test]
    fn decode_falls_back_per_missing_field() {
        let doc = decode("Bare.json", r#"{"fileName": "Bare.json"}"#, 1234);
        assert_eq!(doc.content, Value::String(String::new()));
        assert_eq!(doc.created_at, 1234);
        assert_eq!(doc.location, StorageLocation::App);
    }

    #[test]
    fn decode_degrades_malformed_text_to_raw_content() {
        let doc = decode("Broken.json", "definitely { not json", 99);
        assert_eq!(doc.content, Value::String("definitely { not json".to_string()));
        assert_eq!(doc.created_at, 99);
    }

    #[test]
    fn parse_content_rejects_blank_text() {
        assert!(matches!(parse_content(""), Err(StoreError::Parse(_))));
        assert!(matches!(parse_content("   "), Err(StoreError::Parse(_))));
    }
}
