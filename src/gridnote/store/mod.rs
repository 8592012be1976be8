//! # Storage Layer
//!
//! The [`TableStore`] trait is the persistence collaborator the
//! controller is injected with. The engine is agnostic to the backing
//! format; it only requires that the whole [`Table`] round-trips
//! atomically (`load(save(T)) == T` up to key ordering and fresh
//! synthetic row ids) and that every load runs through
//! [`crate::normalize`].
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: one pretty-printed JSON document per `.gridnote`
//!   file under a root directory.
//! - [`embedded::EmbeddedStore`]: Markdown documents carrying the JSON in
//!   a fenced ```gridnote block, with the surrounding text preserved and
//!   a managed wiki-link footer for the host's backlink graph.
//! - [`memory::InMemoryStore`]: no persistence; fast, isolated tests and
//!   headless hosts.
//!
//! Documents are addressed by host-managed string ids (file names for the
//! file-backed stores). Saves transmit the entire table snapshot; there
//! is no partial write or merge, so last-writer-wins at document
//! granularity.

use crate::error::Result;
use crate::model::Table;

pub mod embedded;
pub mod fs;
pub mod memory;

/// Abstract interface for table document storage.
pub trait TableStore {
    /// Load and normalize the table persisted under `doc`.
    fn load(&self, doc: &str) -> Result<Table>;

    /// Persist the full table snapshot under `doc` (create or replace).
    fn save(&mut self, doc: &str, table: &Table) -> Result<()>;

    /// Rename the document to a new base name, returning the new doc id.
    /// Fails with [`crate::error::GridError::RenameConflict`] when the
    /// target name is taken and with `Store` when the name is invalid.
    fn rename(&mut self, doc: &str, new_base: &str) -> Result<String>;

    /// Every table document this store knows about; what the
    /// link-maintenance sweep iterates.
    fn list_docs(&self) -> Result<Vec<String>>;
}
