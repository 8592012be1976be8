use std::fs;
use std::path::{Path, PathBuf};

use super::TableStore;
use crate::error::{GridError, Result};
use crate::model::Table;
use crate::normalize::normalize;

const DEFAULT_EXT: &str = ".gridnote";

/// File-backed store: one pretty-printed JSON document per table file
/// under a root directory. Doc ids are file names relative to the root.
pub struct FileStore {
    root: PathBuf,
    file_ext: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_ext: DEFAULT_EXT.to_string(),
        }
    }

    pub fn with_file_ext(mut self, ext: &str) -> Self {
        if ext.starts_with('.') {
            self.file_ext = ext.to_string();
        } else {
            self.file_ext = format!(".{}", ext);
        }
        self
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    fn doc_path(&self, doc: &str) -> PathBuf {
        self.root.join(doc)
    }

    fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(GridError::Io)?;
        }
        Ok(())
    }
}

/// Reject names that would escape the root or collide with path syntax.
pub(crate) fn validate_base_name(base: &str) -> Result<()> {
    if base.is_empty() || base.contains(['/', '\\']) || base == "." || base == ".." {
        return Err(GridError::Store(format!(
            "invalid document name '{}'",
            base
        )));
    }
    Ok(())
}

impl TableStore for FileStore {
    fn load(&self, doc: &str) -> Result<Table> {
        let content = fs::read_to_string(self.doc_path(doc)).map_err(GridError::Io)?;
        let raw = serde_json::from_str(&content).map_err(GridError::Serialization)?;
        normalize(raw)
    }

    fn save(&mut self, doc: &str, table: &Table) -> Result<()> {
        self.ensure_root()?;
        let content = serde_json::to_string_pretty(table).map_err(GridError::Serialization)?;
        fs::write(self.doc_path(doc), content).map_err(GridError::Io)?;
        Ok(())
    }

    fn rename(&mut self, doc: &str, new_base: &str) -> Result<String> {
        validate_base_name(new_base)?;
        let new_doc = format!("{}{}", new_base, self.file_ext);
        if new_doc == doc {
            return Ok(new_doc);
        }
        let target = self.doc_path(&new_doc);
        if target.exists() {
            return Err(GridError::RenameConflict(new_base.to_string()));
        }
        fs::rename(self.doc_path(doc), target).map_err(GridError::Io)?;
        Ok(new_doc)
    }

    fn list_docs(&self) -> Result<Vec<String>> {
        list_files_with_ext(&self.root, &self.file_ext)
    }
}

/// Shared by the file-backed stores.
pub(crate) fn list_files_with_ext(root: &Path, ext: &str) -> Result<Vec<String>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut docs = Vec::new();
    for entry in fs::read_dir(root).map_err(GridError::Io)? {
        let entry = entry.map_err(GridError::Io)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(ext) && entry.path().is_file() {
            docs.push(name);
        }
    }
    docs.sort();
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_creates_root_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("tables"));
        let table = Table::new_default();

        store.save("tasks.gridnote", &table).unwrap();
        let loaded = store.load("tasks.gridnote").unwrap();
        assert_eq!(loaded.columns, table.columns);
        assert_eq!(loaded.views, table.views);
        assert_eq!(loaded.rows[0].cells, table.rows[0].cells);
    }

    #[test]
    fn load_rejects_non_table_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.gridnote"), r#"{"text": "hi"}"#).unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.load("notes.gridnote"),
            Err(GridError::Structure(_))
        ));
    }

    #[test]
    fn list_docs_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.save("b.gridnote", &Table::new_default()).unwrap();
        store.save("a.gridnote", &Table::new_default()).unwrap();
        std::fs::write(dir.path().join("readme.md"), "hello").unwrap();

        assert_eq!(store.list_docs().unwrap(), ["a.gridnote", "b.gridnote"]);
    }

    #[test]
    fn rename_conflicts_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.save("a.gridnote", &Table::new_default()).unwrap();
        store.save("b.gridnote", &Table::new_default()).unwrap();

        assert!(matches!(
            store.rename("a.gridnote", "b"),
            Err(GridError::RenameConflict(_))
        ));
        assert!(matches!(
            store.rename("a.gridnote", "../escape"),
            Err(GridError::Store(_))
        ));
        assert_eq!(store.rename("a.gridnote", "c").unwrap(), "c.gridnote");
        assert!(dir.path().join("c.gridnote").exists());
        assert!(!dir.path().join("a.gridnote").exists());
    }
}
