//! The render/interaction controller: the stateful orchestrator bridging
//! the data model, the sort/filter engines, and the host's grid.
//!
//! Every mutation follows the same shape: change the table, run the full
//! redraw pipeline against the latest in-memory state, then persist. The
//! redraw never waits on the save, and a failed save never rolls back
//! what the user already sees; it is logged, remembered in
//! [`GridController::last_save_error`], and left for the user's next
//! action to retry. Saves go through a single-slot coalescing queue so
//! rapid edits collapse into one snapshot write instead of racing.

use tracing::warn;
use uuid::Uuid;

use crate::editors::editor_for;
use crate::error::{GridError, Result};
use crate::model::{
    fresh_column_id, fresh_filter_id, Cell, Column, ColumnType, DateFormat, FilterOperator,
    FilterRule, Row, SortRule, Table, DEFAULT_CHOICES,
};
use crate::render::{body_cell, GridFrame, Renderer, ScrollOffset};
use crate::sort::sort_rows;
use crate::store::TableStore;

/// Single-slot save coalescing: at most one save in flight, and any
/// number of mutations while it runs collapse into one follow-up save of
/// the newest snapshot. Last-writer-wins at document granularity is the
/// store contract; the queue just removes the overlap.
#[derive(Debug, Default)]
pub struct SaveQueue {
    dirty: bool,
    in_flight: bool,
}

impl SaveQueue {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Claim the slot. True means the caller should save the current
    /// snapshot now and report back with [`SaveQueue::complete`].
    pub fn begin(&mut self) -> bool {
        if self.dirty && !self.in_flight {
            self.dirty = false;
            self.in_flight = true;
            true
        } else {
            false
        }
    }

    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// The one popup that can be open. An explicit state slot with explicit
/// transitions, not ambient outside-click listeners, so tests stay
/// deterministic without a widget tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Closed,
    /// The sort popup edits a draft, committed only by
    /// [`GridController::apply_sort`]; closing discards it.
    Sort { draft: Option<SortRule> },
    /// The filter popup has no draft: rule edits persist immediately.
    Filter,
}

/// The one pointer gesture that can be active. Acquired on gesture
/// start, released on end or cancel; a second gesture is refused while
/// one is running.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    None,
    ColumnDrag { from: usize },
    Resize { column_id: String },
}

/// The stateful facade over one open table document.
///
/// Generic over the storage backend and the renderer, like every layer
/// below it: production hosts inject their document store and painting
/// code, tests inject [`crate::store::memory::InMemoryStore`] and
/// [`crate::render::RecordingRenderer`].
pub struct GridController<S: TableStore, R: Renderer> {
    store: S,
    renderer: R,
    doc: String,
    table: Table,
    scroll: ScrollOffset,
    popup: PopupState,
    gesture: Gesture,
    saves: SaveQueue,
    save_error: Option<GridError>,
}

impl<S: TableStore, R: Renderer> GridController<S, R> {
    /// Open an existing table document and render it.
    pub fn open(store: S, renderer: R, doc: impl Into<String>) -> Result<Self> {
        let doc = doc.into();
        let table = store.load(&doc)?;
        let mut controller = Self::with_table(store, renderer, doc, table);
        controller.refresh();
        Ok(controller)
    }

    /// Create a fresh default table under `doc`, persist it, render it.
    pub fn create(store: S, renderer: R, doc: impl Into<String>) -> Result<Self> {
        let doc = doc.into();
        let mut store = store;
        let table = Table::new_default();
        store.save(&doc, &table)?;
        let mut controller = Self::with_table(store, renderer, doc, table);
        controller.refresh();
        Ok(controller)
    }

    fn with_table(store: S, renderer: R, doc: String, table: Table) -> Self {
        Self {
            store,
            renderer,
            doc,
            table,
            scroll: ScrollOffset::default(),
            popup: PopupState::Closed,
            gesture: Gesture::None,
            saves: SaveQueue::default(),
            save_error: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The error of the most recent failed save, cleared by the next
    /// successful one. In-memory and rendered state are unaffected by a
    /// failure; the host shows this as a transient notice.
    pub fn last_save_error(&self) -> Option<&GridError> {
        self.save_error.as_ref()
    }

    /// Remember the grid viewport's scroll offset so the next rebuilt
    /// frame restores it.
    pub fn set_scroll(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    // ---- redraw pipeline ----

    /// Sort the canonical rows in place, filter, rebuild the frame, and
    /// hand it to the renderer. Runs synchronously on every mutation,
    /// always before (and regardless of) persistence.
    pub fn refresh(&mut self) {
        let rule = self.table.active_sort().cloned();
        let Table { rows, columns, .. } = &mut self.table;
        sort_rows(rows, columns, rule.as_ref());

        let frame = GridFrame::of_table(&self.table, self.scroll);
        self.renderer.draw(&frame);
    }

    fn persist(&mut self) {
        self.saves.mark_dirty();
        while self.saves.begin() {
            let outcome = self.store.save(&self.doc, &self.table);
            self.saves.complete();
            match outcome {
                Ok(()) => self.save_error = None,
                Err(err) => {
                    warn!(doc = %self.doc, error = %err, "save failed, keeping in-memory state");
                    self.save_error = Some(err);
                    // No automatic retry; the next mutation saves again.
                    return;
                }
            }
        }
    }

    // ---- column operations ----

    /// Append a new column and an empty cell for it to every existing
    /// row. Returns the new column's id.
    pub fn add_column(&mut self, column_type: ColumnType, name: impl Into<String>) -> String {
        let mut id = fresh_column_id();
        if self.table.column(&id).is_some() {
            // Same-millisecond creation; disambiguate.
            id = format!("{}_{}", id, self.table.columns.len());
        }

        let mut column = Column::new(id.clone(), name, column_type);
        match column_type {
            ColumnType::Dropdown | ColumnType::Multiselect => {
                column.type_options.options = Some(DEFAULT_CHOICES.clone());
            }
            ColumnType::Date => {
                column.type_options.date_format = Some(DateFormat::default());
            }
            ColumnType::NoteLink => {
                column.type_options.suggest_all_files = Some(false);
            }
            ColumnType::Text | ColumnType::Checkbox => {}
        }
        self.table.columns.push(column);
        for row in &mut self.table.rows {
            row.cells.push(Cell::new(&id, ""));
        }

        self.refresh();
        self.persist();
        id
    }

    /// Remove the column definition and strip its cell from every row.
    /// Other cells and the surviving column order are untouched.
    pub fn delete_column(&mut self, column_id: &str) -> Result<()> {
        let index = self
            .table
            .column_index(column_id)
            .ok_or_else(|| GridError::ColumnNotFound(column_id.to_string()))?;
        self.table.columns.remove(index);
        for row in &mut self.table.rows {
            row.cells.retain(|cell| cell.column != column_id);
        }

        self.refresh();
        self.persist();
        Ok(())
    }

    /// Remove the column at `from` and reinsert it at `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.table.columns.len();
        if from >= len {
            return Err(GridError::Store(format!("no column at index {}", from)));
        }
        let column = self.table.columns.remove(from);
        self.table.columns.insert(to.min(len - 1), column);

        self.refresh();
        self.persist();
        Ok(())
    }

    pub fn resize_column(&mut self, column_id: &str, width: u32) -> Result<()> {
        let index = self
            .table
            .column_index(column_id)
            .ok_or_else(|| GridError::ColumnNotFound(column_id.to_string()))?;
        self.table.columns[index].width = Some(width);

        self.refresh();
        self.persist();
        Ok(())
    }

    pub fn rename_column(&mut self, column_id: &str, name: impl Into<String>) -> Result<()> {
        let index = self
            .table
            .column_index(column_id)
            .ok_or_else(|| GridError::ColumnNotFound(column_id.to_string()))?;
        self.table.columns[index].name = name.into();

        self.refresh();
        self.persist();
        Ok(())
    }

    /// Rename the hosting document. Delegated to the store; on a
    /// conflict the error propagates unchanged so the host's rename
    /// input can revert to the prior name. Nothing else changes.
    pub fn rename_table(&mut self, new_base: &str) -> Result<String> {
        let new_doc = self.store.rename(&self.doc, new_base)?;
        self.doc = new_doc.clone();
        Ok(new_doc)
    }

    // ---- cell and row operations ----

    /// Commit editor input into the cell for (row, column), creating the
    /// cell lazily on first edit.
    ///
    /// The full redraw is skipped when the edited column participates in
    /// neither the active sort nor any filter rule: such an edit cannot
    /// change visible order or membership, so only the one cell is
    /// patched. (This holds because nothing references a column
    /// indirectly; there are no derived columns.)
    pub fn edit_cell(&mut self, row_id: Uuid, column_id: &str, input: &str) -> Result<()> {
        let column = self
            .table
            .column(column_id)
            .ok_or_else(|| GridError::ColumnNotFound(column_id.to_string()))?;
        let value = editor_for(column.column_type).commit(input, &column.type_options);

        let row = self
            .table
            .row_mut(row_id)
            .ok_or(GridError::RowNotFound(row_id))?;
        match row.cell_mut(column_id) {
            Some(cell) => cell.value = value,
            None => row.cells.push(Cell::new(column_id, value)),
        }

        if self.affects_view(column_id) {
            self.refresh();
        } else if let Some(row) = self.table.row(row_id) {
            let cell = body_cell(&self.table, row, column_id);
            self.renderer.patch_cell(row_id, &cell);
        }
        self.persist();
        Ok(())
    }

    /// Whether an edit to this column could change visible order or
    /// membership. The redraw-skip optimization must never be taken when
    /// this is true.
    fn affects_view(&self, column_id: &str) -> bool {
        self.table
            .active_sort()
            .is_some_and(|rule| rule.column_id == column_id)
            || self
                .table
                .active_filters()
                .iter()
                .any(|rule| rule.column_id == column_id)
    }

    /// Append a new row with one cell per column: `"false"` for
    /// checkboxes, `""` otherwise — except that a column under an active
    /// `equals` filter with a non-empty value gets that value, so the
    /// row the user just added stays visible under its own filter.
    /// Returns the new row's id.
    pub fn add_row(&mut self) -> Uuid {
        let prefills: Vec<(String, String)> = self
            .table
            .active_filters()
            .iter()
            .filter(|rule| rule.operator == FilterOperator::Equals)
            .filter_map(|rule| {
                let value = rule.value.as_deref().unwrap_or("");
                (!value.is_empty()).then(|| (rule.column_id.clone(), value.to_string()))
            })
            .collect();

        let cells = self
            .table
            .columns
            .iter()
            .map(|column| {
                let prefill = prefills
                    .iter()
                    .find(|(column_id, _)| *column_id == column.id)
                    .map(|(_, value)| value.clone());
                let value = prefill
                    .unwrap_or_else(|| editor_for(column.column_type).default_value().to_string());
                Cell::new(&column.id, value)
            })
            .collect();

        let row = Row::new(cells);
        let id = row.id;
        self.table.rows.push(row);

        self.refresh();
        self.persist();
        id
    }

    pub fn delete_row(&mut self, row_id: Uuid) -> Result<()> {
        let index = self
            .table
            .rows
            .iter()
            .position(|row| row.id == row_id)
            .ok_or(GridError::RowNotFound(row_id))?;
        self.table.rows.remove(index);

        self.refresh();
        self.persist();
        Ok(())
    }

    // ---- sort and filter popups ----

    /// Open the sort popup seeded with the current rule as its draft.
    pub fn open_sort_popup(&mut self) {
        self.popup = PopupState::Sort {
            draft: self.table.active_sort().cloned(),
        };
    }

    /// Replace the sort popup's draft (`None` is "no column"). Nothing
    /// is applied yet.
    pub fn edit_sort_draft(&mut self, draft: Option<SortRule>) {
        match &mut self.popup {
            PopupState::Sort { draft: slot } => *slot = draft,
            _ => warn!("ignoring sort draft edit, the sort popup is not open"),
        }
    }

    /// Commit the sort popup's draft as the active rule and close the
    /// popup. A `None` draft clears the rule; rows keep the order the
    /// last sort left them in.
    pub fn apply_sort(&mut self) {
        let PopupState::Sort { draft } = std::mem::replace(&mut self.popup, PopupState::Closed)
        else {
            warn!("ignoring sort apply, the sort popup is not open");
            return;
        };
        if let Some(view) = self.table.active_view_mut() {
            view.sort = draft.into_iter().collect();
        }

        self.refresh();
        self.persist();
    }

    pub fn open_filter_popup(&mut self) {
        self.popup = PopupState::Filter;
    }

    /// Close whichever popup is open (outside click or explicit close).
    /// A sort draft is discarded; filter edits were already persisted.
    pub fn close_popup(&mut self) {
        self.popup = PopupState::Closed;
    }

    /// Append a filter rule and persist immediately; filters have no
    /// separate apply step. Returns the new rule's id.
    pub fn add_filter_rule(
        &mut self,
        column_id: impl Into<String>,
        operator: FilterOperator,
        value: Option<String>,
    ) -> String {
        let id = fresh_filter_id();
        if let Some(view) = self.table.active_view_mut() {
            view.filter.push(FilterRule {
                id: id.clone(),
                column_id: column_id.into(),
                operator,
                value,
            });
        }

        self.refresh();
        self.persist();
        id
    }

    pub fn update_filter_rule(
        &mut self,
        rule_id: &str,
        column_id: impl Into<String>,
        operator: FilterOperator,
        value: Option<String>,
    ) -> Result<()> {
        let rule = self
            .table
            .active_view_mut()
            .and_then(|view| view.filter.iter_mut().find(|rule| rule.id == rule_id))
            .ok_or_else(|| GridError::Store(format!("no filter rule '{}'", rule_id)))?;
        rule.column_id = column_id.into();
        rule.operator = operator;
        rule.value = value;

        self.refresh();
        self.persist();
        Ok(())
    }

    pub fn remove_filter_rule(&mut self, rule_id: &str) -> Result<()> {
        let view = self
            .table
            .active_view_mut()
            .ok_or_else(|| GridError::Store("table has no view".to_string()))?;
        let before = view.filter.len();
        view.filter.retain(|rule| rule.id != rule_id);
        if view.filter.len() == before {
            return Err(GridError::Store(format!("no filter rule '{}'", rule_id)));
        }

        self.refresh();
        self.persist();
        Ok(())
    }

    // ---- pointer gestures ----

    /// Start a column drag. Refused (returns false) while another
    /// gesture is active or the index is out of range.
    pub fn begin_column_drag(&mut self, from: usize) -> bool {
        if self.gesture != Gesture::None || from >= self.table.columns.len() {
            return false;
        }
        self.gesture = Gesture::ColumnDrag { from };
        true
    }

    /// Drop the dragged column at `to`, committing the reorder.
    pub fn end_column_drag(&mut self, to: usize) -> Result<()> {
        let Gesture::ColumnDrag { from } = std::mem::replace(&mut self.gesture, Gesture::None)
        else {
            return Err(GridError::Store("no column drag in progress".to_string()));
        };
        self.move_column(from, to)
    }

    /// Start a resize drag. Continuous width changes during the drag are
    /// the host's visual concern; nothing persists until
    /// [`GridController::end_resize`].
    pub fn begin_resize(&mut self, column_id: &str) -> bool {
        if self.gesture != Gesture::None || self.table.column(column_id).is_none() {
            return false;
        }
        self.gesture = Gesture::Resize {
            column_id: column_id.to_string(),
        };
        true
    }

    /// Mouse-up of a resize drag: persist the final width.
    pub fn end_resize(&mut self, width: u32) -> Result<()> {
        let Gesture::Resize { column_id } = std::mem::replace(&mut self.gesture, Gesture::None)
        else {
            return Err(GridError::Store("no resize in progress".to_string()));
        };
        self.resize_column(&column_id, width)
    }

    /// Abandon the active gesture (pointer cancel, escape).
    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::None;
    }
}
