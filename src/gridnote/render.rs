//! The frame view-model and the renderer seam.
//!
//! A [`GridFrame`] is everything the host needs to paint the grid: header
//! affordances, visible body rows with display-ready text, and the scroll
//! offset to restore. The controller rebuilds it from scratch on every
//! redraw and hands it to a [`Renderer`].
//!
//! Keeping the renderer behind a trait is what makes the controller
//! testable without a widget tree: tests inject a [`RecordingRenderer`]
//! and assert on the frames it was handed.

use unicode_width::UnicodeWidthChar;
use uuid::Uuid;

use crate::editors::editor_for;
use crate::filter::visible_rows;
use crate::model::{Row, SortDirection, Table};

/// Assumed pixel width of one terminal-ish display cell when truncating
/// cell text to a column's pixel width.
const PX_PER_CELL: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollOffset {
    pub x: u32,
    pub y: u32,
}

/// One column header with its control affordances.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub column_id: String,
    pub name: String,
    pub width: Option<u32>,
    /// Set when this column carries the active sort rule.
    pub sort: Option<SortDirection>,
    /// Set when any active filter rule references this column.
    pub filtered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyCell {
    pub column_id: String,
    /// The stored string value.
    pub raw: String,
    /// The editor-rendered text, truncated to the column width.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyRow {
    pub id: Uuid,
    pub cells: Vec<BodyCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridFrame {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<BodyRow>,
    pub scroll: ScrollOffset,
}

impl GridFrame {
    /// Build a frame from the table's current state and the visible row
    /// subset (already sorted and filtered).
    pub fn build(table: &Table, visible: &[&Row], scroll: ScrollOffset) -> Self {
        let sort = table.active_sort();
        let filters = table.active_filters();

        let headers = table
            .columns
            .iter()
            .map(|column| HeaderCell {
                column_id: column.id.clone(),
                name: column.name.clone(),
                width: column.width,
                sort: sort
                    .filter(|rule| rule.column_id == column.id)
                    .map(|rule| rule.direction),
                filtered: filters.iter().any(|rule| rule.column_id == column.id),
            })
            .collect();

        let rows = visible
            .iter()
            .map(|row| BodyRow {
                id: row.id,
                cells: table
                    .columns
                    .iter()
                    .map(|column| body_cell(table, row, &column.id))
                    .collect(),
            })
            .collect();

        GridFrame {
            headers,
            rows,
            scroll,
        }
    }

    /// Convenience for the full pipeline tail: filter, then build.
    /// Sorting already happened in place on the table's rows.
    pub fn of_table(table: &Table, scroll: ScrollOffset) -> Self {
        let visible = visible_rows(&table.rows, table.active_filters());
        GridFrame::build(table, &visible, scroll)
    }
}

/// Render one cell's display text for the grid.
pub fn body_cell(table: &Table, row: &Row, column_id: &str) -> BodyCell {
    let raw = row.cell_text(column_id).to_string();
    let display = match table.column(column_id) {
        Some(column) => {
            let text = editor_for(column.column_type).display(&raw, &column.type_options);
            match column.width {
                Some(px) => fit_to_width(&text, (px / PX_PER_CELL) as usize),
                None => text,
            }
        }
        None => raw.clone(),
    };
    BodyCell {
        column_id: column_id.to_string(),
        raw,
        display,
    }
}

/// Truncate `text` to at most `max_cells` display cells, ending with an
/// ellipsis when anything was cut.
fn fit_to_width(text: &str, max_cells: usize) -> String {
    if unicode_width::UnicodeWidthStr::width(text) <= max_cells {
        return text.to_string();
    }
    let budget = max_cells.saturating_sub(1);
    let mut used = 0usize;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// The seam between the controller and the host's painting code.
pub trait Renderer {
    /// Replace the whole grid with a freshly built frame.
    fn draw(&mut self, frame: &GridFrame);

    /// Update a single already-rendered cell in place. Called instead of
    /// `draw` when an edit cannot change visible order or membership.
    fn patch_cell(&mut self, _row_id: Uuid, _cell: &BodyCell) {}
}

/// Discards everything; for headless hosts and benchmarks.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &GridFrame) {}
}

/// Records every call; what controller tests assert against.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<GridFrame>,
    pub patches: Vec<(Uuid, BodyCell)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&GridFrame> {
        self.frames.last()
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, frame: &GridFrame) {
        self.frames.push(frame.clone());
    }

    fn patch_cell(&mut self, row_id: Uuid, cell: &BodyCell) {
        self.patches.push((row_id, cell.clone()));
    }
}
