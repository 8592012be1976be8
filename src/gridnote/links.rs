//! Note-link integration: the suggestion seam consumed by notelink cell
//! editors, and the batch link-maintenance sweep.
//!
//! The sweep runs outside any live controller. The host triggers it from
//! its document rename/delete events; it walks every table document of a
//! store and rewrites or clears the notelink cells pointing at the moved
//! path, writing each touched table back through the normal save path so
//! all model invariants hold.

use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::model::{ColumnType, Table};
use crate::store::TableStore;

/// Source of notelink completions, injected by the host.
///
/// `query` is the text typed so far; `all_files` widens the candidates
/// from notes to every file type (the column's `suggestAllFiles` option).
/// Selecting a suggestion yields a resolved stable path, which becomes
/// the cell's stored value.
pub trait LinkSource {
    fn suggest(&self, query: &str, all_files: bool) -> Vec<String>;
}

/// A document was renamed: point every notelink cell at the new path.
/// Returns the number of rewritten cells.
pub fn sweep_rename<S: TableStore>(store: &mut S, old_path: &str, new_path: &str) -> Result<usize> {
    sweep(store, old_path, Some(new_path))
}

/// A document was deleted: clear every notelink cell referencing it.
/// Returns the number of cleared cells.
pub fn sweep_delete<S: TableStore>(store: &mut S, old_path: &str) -> Result<usize> {
    sweep(store, old_path, None)
}

fn sweep<S: TableStore>(store: &mut S, old_path: &str, new_path: Option<&str>) -> Result<usize> {
    let mut rewritten = 0;
    for doc in store.list_docs()? {
        let mut table = match store.load(&doc) {
            Ok(table) => table,
            // Not every listed document has to be a table; skip the
            // ones that aren't instead of aborting the whole sweep.
            Err(GridError::Structure(reason)) => {
                debug!(doc = %doc, %reason, "skipping non-table document during link sweep");
                continue;
            }
            Err(err) => {
                warn!(doc = %doc, error = %err, "failed to load document during link sweep");
                continue;
            }
        };

        let touched = rewrite_table(&mut table, old_path, new_path);
        if touched > 0 {
            store.save(&doc, &table)?;
            rewritten += touched;
        }
    }
    Ok(rewritten)
}

fn rewrite_table(table: &mut Table, old_path: &str, new_path: Option<&str>) -> usize {
    let link_columns: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.column_type == ColumnType::NoteLink)
        .map(|c| c.id.clone())
        .collect();
    if link_columns.is_empty() {
        return 0;
    }

    let mut touched = 0;
    for row in &mut table.rows {
        for column_id in &link_columns {
            if let Some(cell) = row.cell_mut(column_id) {
                if cell.value == old_path {
                    cell.value = new_path.unwrap_or("").to_string();
                    touched += 1;
                }
            }
        }
    }
    touched
}
