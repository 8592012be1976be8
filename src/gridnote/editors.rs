//! Per-column-type cell value editors.
//!
//! Every cell value is stored as a string regardless of its semantic
//! type. An editor converts between that stored representation and what
//! the user sees and types: `display` renders the stored string for the
//! grid, `commit` normalizes editor input back into the stored form.
//!
//! One strategy object exists per [`ColumnType`], reached through
//! [`editor_for`]. Adding a column type means adding a strategy here;
//! nothing subclasses anything.

use chrono::{DateTime, NaiveDate};

use crate::model::{ColumnType, DateFormat, TypeOptions};

pub trait CellEditor: Sync {
    /// Render the stored value for display in the grid.
    fn display(&self, value: &str, options: &TypeOptions) -> String;

    /// Normalize editor input into the stored string form.
    fn commit(&self, input: &str, options: &TypeOptions) -> String;

    /// The stored value a fresh cell of this type starts with.
    fn default_value(&self) -> &'static str {
        ""
    }
}

/// The strategy for a column type.
pub fn editor_for(column_type: ColumnType) -> &'static dyn CellEditor {
    match column_type {
        ColumnType::Text => &TextEditor,
        ColumnType::Checkbox => &CheckboxEditor,
        ColumnType::Dropdown => &DropdownEditor,
        ColumnType::Multiselect => &MultiselectEditor,
        ColumnType::NoteLink => &NoteLinkEditor,
        ColumnType::Date => &DateEditor,
    }
}

pub struct TextEditor;

impl CellEditor for TextEditor {
    fn display(&self, value: &str, _options: &TypeOptions) -> String {
        value.to_string()
    }

    fn commit(&self, input: &str, _options: &TypeOptions) -> String {
        input.to_string()
    }
}

/// Stored as `"true"`/`"false"`.
pub struct CheckboxEditor;

impl CellEditor for CheckboxEditor {
    fn display(&self, value: &str, _options: &TypeOptions) -> String {
        if value == "true" { "[x]" } else { "[ ]" }.to_string()
    }

    fn commit(&self, input: &str, _options: &TypeOptions) -> String {
        match input.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "x" => "true",
            _ => "false",
        }
        .to_string()
    }

    fn default_value(&self) -> &'static str {
        "false"
    }
}

pub struct DropdownEditor;

impl CellEditor for DropdownEditor {
    fn display(&self, value: &str, _options: &TypeOptions) -> String {
        value.to_string()
    }

    // Free strings are tolerated: an option removed from the column's
    // list leaves its old cell values intact.
    fn commit(&self, input: &str, _options: &TypeOptions) -> String {
        input.trim().to_string()
    }
}

/// Stored as a comma-joined list of option values.
pub struct MultiselectEditor;

impl CellEditor for MultiselectEditor {
    fn display(&self, value: &str, _options: &TypeOptions) -> String {
        value
            .split(',')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn commit(&self, input: &str, _options: &TypeOptions) -> String {
        input
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Stored as the resolved path of the linked document.
pub struct NoteLinkEditor;

impl CellEditor for NoteLinkEditor {
    fn display(&self, value: &str, _options: &TypeOptions) -> String {
        let base = value.rsplit('/').next().unwrap_or(value);
        base.strip_suffix(".md").unwrap_or(base).to_string()
    }

    fn commit(&self, input: &str, _options: &TypeOptions) -> String {
        input.trim().to_string()
    }
}

/// Stored as a millisecond-epoch timestamp in decimal; displayed and
/// parsed per the column's [`DateFormat`].
pub struct DateEditor;

impl CellEditor for DateEditor {
    fn display(&self, value: &str, options: &TypeOptions) -> String {
        let Ok(millis) = value.trim().parse::<i64>() else {
            return String::new();
        };
        let Some(dt) = DateTime::from_timestamp_millis(millis) else {
            return String::new();
        };
        let format = options.date_format.unwrap_or_default();
        dt.format(format.pattern()).to_string()
    }

    fn commit(&self, input: &str, options: &TypeOptions) -> String {
        let input = input.trim();
        if input.is_empty() {
            return String::new();
        }
        // Already-numeric input passes through as an epoch value.
        if input.parse::<i64>().is_ok() {
            return input.to_string();
        }
        let format = options.date_format.unwrap_or_default();
        NaiveDate::parse_from_str(input, format.pattern())
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis().to_string())
            .unwrap_or_default()
    }
}
