use std::collections::HashMap;

use serde_json::Value;

use super::TableStore;
use crate::error::{GridError, Result};
use crate::model::Table;
use crate::normalize::normalize;

/// In-memory store for tests and headless hosts.
///
/// Documents are held in their serialized form so loads exercise the same
/// normalize-and-reassign-row-ids path as the file-backed stores.
#[derive(Default)]
pub struct InMemoryStore {
    docs: HashMap<String, Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, bypassing the typed model. Lets tests start
    /// from legacy shapes.
    pub fn insert_raw(&mut self, doc: impl Into<String>, raw: Value) {
        self.docs.insert(doc.into(), raw);
    }

    pub fn contains(&self, doc: &str) -> bool {
        self.docs.contains_key(doc)
    }
}

impl TableStore for InMemoryStore {
    fn load(&self, doc: &str) -> Result<Table> {
        let raw = self
            .docs
            .get(doc)
            .ok_or_else(|| GridError::Store(format!("no document '{}'", doc)))?;
        normalize(raw.clone())
    }

    fn save(&mut self, doc: &str, table: &Table) -> Result<()> {
        let value = serde_json::to_value(table).map_err(GridError::Serialization)?;
        self.docs.insert(doc.to_string(), value);
        Ok(())
    }

    fn rename(&mut self, doc: &str, new_base: &str) -> Result<String> {
        if new_base.is_empty() {
            return Err(GridError::Store("empty document name".to_string()));
        }
        if new_base != doc && self.docs.contains_key(new_base) {
            return Err(GridError::RenameConflict(new_base.to_string()));
        }
        let value = self
            .docs
            .remove(doc)
            .ok_or_else(|| GridError::Store(format!("no document '{}'", doc)))?;
        self.docs.insert(new_base.to_string(), value);
        Ok(new_base.to_string())
    }

    fn list_docs(&self) -> Result<Vec<String>> {
        let mut docs: Vec<String> = self.docs.keys().cloned().collect();
        docs.sort();
        Ok(docs)
    }
}
