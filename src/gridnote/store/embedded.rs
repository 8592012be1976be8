//! Markdown-embedded storage: the table's JSON lives inside a fenced
//! ```gridnote block of an otherwise ordinary note document.
//!
//! Saving preserves every byte of the document outside the block, so the
//! user's prose around the table survives. Below the note body the store
//! maintains a managed footer listing each notelink cell value as a
//! `[[wiki-link]]`, which keeps the links visible to the host's backlink
//! graph even though the table itself is opaque JSON.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use super::fs::{list_files_with_ext, validate_base_name};
use super::TableStore;
use crate::error::{GridError, Result};
use crate::model::{ColumnType, Table};
use crate::normalize::normalize;

const FENCE_OPEN: &str = "```gridnote";
const FENCE_CLOSE: &str = "```";
const LINKS_OPEN: &str = "%%gridnote:links";
const LINKS_CLOSE: &str = "%%";
const DEFAULT_EXT: &str = ".md";

/// Store for table documents embedded in Markdown notes.
pub struct EmbeddedStore {
    root: PathBuf,
    file_ext: String,
}

impl EmbeddedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_ext: DEFAULT_EXT.to_string(),
        }
    }

    fn doc_path(&self, doc: &str) -> PathBuf {
        self.root.join(doc)
    }
}

/// The parts of a note document around its table block.
struct DocumentParts<'a> {
    before: &'a str,
    block: &'a str,
    after: &'a str,
}

/// Locate the fenced table block. Operates line-wise: the opening fence
/// must be a line equal to ```` ```gridnote ````, the closing fence the
/// next line equal to ```` ``` ````.
fn split_document(text: &str) -> Option<DocumentParts<'_>> {
    let mut pos = 0;
    let mut fence = None;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == FENCE_OPEN {
            fence = Some((pos, pos + line.len()));
            break;
        }
        pos += line.len();
    }
    let (before_end, block_start) = fence?;

    let mut cursor = block_start;
    for line in text[block_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE_CLOSE {
            return Some(DocumentParts {
                before: &text[..before_end],
                block: &text[block_start..cursor],
                after: &text[cursor + line.len()..],
            });
        }
        cursor += line.len();
    }
    None
}

/// Strip a previously written managed link footer from the trailing
/// text. The footer is always the last section of the document, so
/// everything from its opening marker on goes.
fn strip_link_footer(after: &str) -> &str {
    match after.find(LINKS_OPEN) {
        Some(start) => &after[..start],
        None => after,
    }
}

/// The managed footer: one wiki-link line per distinct notelink value.
fn link_footer(table: &Table) -> String {
    let link_columns: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.column_type == ColumnType::NoteLink)
        .map(|c| c.id.as_str())
        .collect();
    let mut links = BTreeSet::new();
    for row in &table.rows {
        for column_id in &link_columns {
            let value = row.cell_text(column_id);
            if !value.is_empty() {
                links.insert(value.to_string());
            }
        }
    }
    if links.is_empty() {
        return String::new();
    }
    let mut footer = String::from(LINKS_OPEN);
    footer.push('\n');
    for link in links {
        footer.push_str(&format!("[[{}]]\n", link));
    }
    footer.push_str(LINKS_CLOSE);
    footer.push('\n');
    footer
}

fn render_document(before: &str, table: &Table, after: &str) -> Result<String> {
    let json = serde_json::to_string_pretty(table).map_err(GridError::Serialization)?;
    let body_after = strip_link_footer(after);
    let mut out = String::new();
    out.push_str(before);
    out.push_str(FENCE_OPEN);
    out.push('\n');
    out.push_str(&json);
    out.push('\n');
    out.push_str(FENCE_CLOSE);
    out.push('\n');
    out.push_str(body_after);
    let footer = link_footer(table);
    if !footer.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&footer);
    }
    Ok(out)
}

impl TableStore for EmbeddedStore {
    fn load(&self, doc: &str) -> Result<Table> {
        let text = fs::read_to_string(self.doc_path(doc)).map_err(GridError::Io)?;
        let parts = split_document(&text).ok_or_else(|| {
            GridError::Structure(format!("'{}' has no {} block", doc, FENCE_OPEN))
        })?;
        let raw = serde_json::from_str(parts.block).map_err(GridError::Serialization)?;
        normalize(raw)
    }

    fn save(&mut self, doc: &str, table: &Table) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(GridError::Io)?;
        }
        let path = self.doc_path(doc);
        let (before, after) = match fs::read_to_string(&path) {
            Ok(existing) => match split_document(&existing) {
                Some(parts) => (parts.before.to_string(), parts.after.to_string()),
                // A note without a block yet: the table goes at the end.
                None => {
                    let mut before = existing;
                    if !before.is_empty() && !before.ends_with('\n') {
                        before.push('\n');
                    }
                    (before, String::new())
                }
            },
            Err(_) => (String::new(), String::new()),
        };
        let content = render_document(&before, table, &after)?;
        fs::write(path, content).map_err(GridError::Io)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Column, Row, View};

    fn linked_table() -> Table {
        Table {
            columns: vec![Column::new("ref", "Ref", ColumnType::NoteLink)],
            rows: vec![
                Row::new(vec![Cell::new("ref", "notes/plan.md")]),
                Row::new(vec![Cell::new("ref", "")]),
            ],
            views: vec![View::new("v1", "Default")],
        }
    }

    #[test]
    fn save_into_fresh_document_and_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EmbeddedStore::new(dir.path());
        store.save("tasks.md", &linked_table()).unwrap();

        let loaded = store.load("tasks.md").unwrap();
        assert_eq!(loaded.columns[0].column_type, ColumnType::NoteLink);
        assert_eq!(loaded.rows[0].cell_text("ref"), "notes/plan.md");
    }

    #[test]
    fn save_preserves_surrounding_prose() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.md");
        fs::write(
            &path,
            "# Weekly plan\n\nintro text\n\n```gridnote\n{\"columns\": [], \"rows\": []}\n```\noutro text\n",
        )
        .unwrap();

        let mut store = EmbeddedStore::new(dir.path());
        let table = store.load("tasks.md").unwrap();
        store.save("tasks.md", &table).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Weekly plan\n\nintro text\n\n```gridnote\n"));
        assert!(written.contains("outro text"));
    }

    #[test]
    fn save_appends_block_to_plain_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "just prose").unwrap();

        let mut store = EmbeddedStore::new(dir.path());
        store.save("note.md", &linked_table()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("just prose\n```gridnote\n"));
        store.load("note.md").unwrap();
    }

    #[test]
    fn link_footer_lists_notelink_values_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EmbeddedStore::new(dir.path());
        let mut table = linked_table();
        table
            .rows
            .push(Row::new(vec![Cell::new("ref", "notes/plan.md")]));
        store.save("tasks.md", &table).unwrap();

        let written = fs::read_to_string(dir.path().join("tasks.md")).unwrap();
        assert_eq!(written.matches("[[notes/plan.md]]").count(), 1);
        assert!(written.contains(LINKS_OPEN));

        // Saving again replaces the footer instead of stacking a second one.
        store.save("tasks.md", &table).unwrap();
        let written = fs::read_to_string(dir.path().join("tasks.md")).unwrap();
        assert_eq!(written.matches(LINKS_OPEN).count(), 1);
    }

    #[test]
    fn load_without_block_is_a_structure_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.md"), "no table here\n").unwrap();
        let store = EmbeddedStore::new(dir.path());
        assert!(matches!(
            store.load("plain.md"),
            Err(GridError::Structure(_))
        ));
    }
}
