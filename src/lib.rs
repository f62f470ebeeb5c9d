//! Persistence core for a mobile note/mind-mapping application.
//!
//! Users create "maps": documents holding a sequence of pages that are either
//! free-text notes or spatial canvases of draggable nodes. This crate owns
//! everything below the UI: the document model, the JSON codec, the storage
//! gateways (app-private directory and picker-chosen locations), and the
//! in-memory catalog the UI renders its file list from.
//!
//! See the [`storage`] module for the persistence design.

pub mod model;
pub mod storage;

pub use model::{MapDocument, MapDraft, MapPage, SpaceNode, StorageLocation};
pub use storage::{MapCatalog, PrivateStore, StoreError, StoreResult};
