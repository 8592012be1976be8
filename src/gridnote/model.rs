use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The semantic type of a column. Cell values are stored as strings for
/// every type; the type decides how they are compared, filtered, and
/// edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Checkbox,
    Dropdown,
    Multiselect,
    #[serde(rename = "notelink")]
    NoteLink,
    Date,
}

/// Display patterns for date columns. The stored cell value is always a
/// millisecond-epoch timestamp rendered as a decimal string; the format
/// only affects display and input parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "yyyy-mm-dd")]
    YearMonthDay,
    #[serde(rename = "dd-mm-yyyy")]
    DayMonthYear,
    #[serde(rename = "mm-dd-yyyy")]
    MonthDayYear,
    #[serde(rename = "dd/mm/yyyy")]
    DayMonthYearSlash,
    #[serde(rename = "mm/dd/yyyy")]
    MonthDayYearSlash,
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::YearMonthDay
    }
}

impl DateFormat {
    /// The chrono strftime pattern for this format.
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::YearMonthDay => "%Y-%m-%d",
            DateFormat::DayMonthYear => "%d-%m-%Y",
            DateFormat::MonthDayYear => "%m-%d-%Y",
            DateFormat::DayMonthYearSlash => "%d/%m/%Y",
            DateFormat::MonthDayYearSlash => "%m/%d/%Y",
        }
    }
}

/// Color tag attached to a dropdown/multiselect option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Gray,
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
}

impl Default for ColorTag {
    fn default() -> Self {
        ColorTag::Gray
    }
}

/// One selectable option of a dropdown or multiselect column. `value` is
/// unique within the column's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    #[serde(default)]
    pub style: ColorTag,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, style: ColorTag) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }
}

/// Options seeded onto a freshly created dropdown/multiselect column.
pub static DEFAULT_CHOICES: Lazy<Vec<ChoiceOption>> = Lazy::new(|| {
    vec![
        ChoiceOption::new("Option 1", ColorTag::Gray),
        ChoiceOption::new("Option 2", ColorTag::Blue),
        ChoiceOption::new("Option 3", ColorTag::Green),
    ]
});

/// Per-type column configuration.
///
/// This is a bag of optional fields rather than a per-type enum: the wire
/// format is an untagged `typeOptions` object (always present, possibly
/// empty), and older documents carried these fields flat on the column.
/// See [`crate::normalize`] for the migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggest_all_files: Option<bool>,
}

impl TypeOptions {
    pub fn is_empty(&self) -> bool {
        self.date_format.is_none() && self.options.is_none() && self.suggest_all_files.is_none()
    }
}

/// A typed field definition shared by all rows. The `id` is opaque,
/// unique within the table, and stable across renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default)]
    pub type_options: TypeOptions,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            width: None,
            type_options: TypeOptions::default(),
        }
    }
}

/// A single row's string value for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub column: String,
    pub value: String,
}

impl Cell {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of cells, at most one per column id.
///
/// Rows serialize as bare cell arrays (the persisted format has no row
/// ids); the `id` is synthetic, assigned at creation or load, and is what
/// every row-level operation addresses. Identity never depends on the
/// row's position in the canonical order, which the sort engine mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Row {
    pub id: Uuid,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            id: Uuid::new_v4(),
            cells,
        }
    }

    pub fn cell(&self, column_id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.column == column_id)
    }

    pub fn cell_mut(&mut self, column_id: &str) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.column == column_id)
    }

    /// The stored value for a column; a missing cell reads as "".
    pub fn cell_text(&self, column_id: &str) -> &str {
        self.cell(column_id).map(|c| c.value.as_str()).unwrap_or("")
    }
}

impl From<Vec<Cell>> for Row {
    fn from(cells: Vec<Cell>) -> Self {
        Row::new(cells)
    }
}

impl From<Row> for Vec<Cell> {
    fn from(row: Row) -> Self {
        row.cells
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// The single active sort rule lives in `views[0].sort`, which holds at
/// most one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRule {
    pub column_id: String,
    pub direction: SortDirection,
}

/// Predicate operators for filter rules. Everything except
/// `IsEmpty`/`IsNotEmpty` compares case-insensitively.
///
/// An operator string we don't recognize is preserved as `Unknown` rather
/// than rejected at load time; the filter engine treats it as passing so
/// a corrupt rule never silently hides data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    Equals,
    NotEqual,
    Unknown(String),
}

impl From<String> for FilterOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "contains" => FilterOperator::Contains,
            "doesNotContain" => FilterOperator::DoesNotContain,
            "startsWith" => FilterOperator::StartsWith,
            "endsWith" => FilterOperator::EndsWith,
            "isEmpty" => FilterOperator::IsEmpty,
            "isNotEmpty" => FilterOperator::IsNotEmpty,
            "equals" => FilterOperator::Equals,
            "notEqual" => FilterOperator::NotEqual,
            _ => FilterOperator::Unknown(s),
        }
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        match op {
            FilterOperator::Contains => "contains".to_string(),
            FilterOperator::DoesNotContain => "doesNotContain".to_string(),
            FilterOperator::StartsWith => "startsWith".to_string(),
            FilterOperator::EndsWith => "endsWith".to_string(),
            FilterOperator::IsEmpty => "isEmpty".to_string(),
            FilterOperator::IsNotEmpty => "isNotEmpty".to_string(),
            FilterOperator::Equals => "equals".to_string(),
            FilterOperator::NotEqual => "notEqual".to_string(),
            FilterOperator::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    pub id: String,
    pub column_id: String,
    pub operator: FilterOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A named bundle of sort + filter configuration. Only `views[0]` is
/// active; the list exists for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort: Vec<SortRule>,
    #[serde(default)]
    pub filter: Vec<FilterRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_columns: Option<Vec<String>>,
}

impl View {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sort: Vec::new(),
            filter: Vec::new(),
            hidden_columns: None,
        }
    }
}

/// The unit of persistence: the entire structure round-trips atomically
/// through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub views: Vec<View>,
}

impl Table {
    /// The "new table" factory: two text columns, one empty row, one
    /// default view with no sort and no filter.
    pub fn new_default() -> Self {
        let ts = Utc::now().timestamp_millis();
        let columns = vec![
            Column::new(format!("col_{}_1", ts), "Column 1", ColumnType::Text),
            Column::new(format!("col_{}_2", ts), "Column 2", ColumnType::Text),
        ];
        let row = Row::new(columns.iter().map(|c| Cell::new(&c.id, "")).collect());
        Table {
            columns,
            rows: vec![row],
            views: vec![View::new(format!("default_{}", ts), "Default")],
        }
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_index(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn row(&self, id: Uuid) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn row_mut(&mut self, id: Uuid) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub fn active_view(&self) -> Option<&View> {
        self.views.first()
    }

    pub fn active_view_mut(&mut self) -> Option<&mut View> {
        self.views.first_mut()
    }

    /// The single active sort rule, if any.
    pub fn active_sort(&self) -> Option<&SortRule> {
        self.views.first().and_then(|v| v.sort.first())
    }

    /// The active filter rules, AND-combined by the filter engine.
    pub fn active_filters(&self) -> &[FilterRule] {
        self.views.first().map(|v| v.filter.as_slice()).unwrap_or(&[])
    }
}

/// Fresh timestamp-derived column id. Collisions are possible within one
/// millisecond; acceptable for user-paced column creation, not for bulk
/// automated creation.
pub fn fresh_column_id() -> String {
    format!("col_{}", Utc::now().timestamp_millis())
}

pub fn fresh_filter_id() -> String {
    format!("flt_{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_shape() {
        let t = Table::new_default();
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.views.len(), 1);
        assert!(t.active_sort().is_none());
        assert!(t.active_filters().is_empty());
        // The seed row has one empty cell per column
        assert_eq!(t.rows[0].cells.len(), 2);
        for col in &t.columns {
            assert_eq!(t.rows[0].cell_text(&col.id), "");
        }
        // The two seed column ids are distinct even within one millisecond
        assert_ne!(t.columns[0].id, t.columns[1].id);
    }

    #[test]
    fn missing_cell_reads_as_empty() {
        let row = Row::new(vec![Cell::new("a", "x")]);
        assert_eq!(row.cell_text("a"), "x");
        assert_eq!(row.cell_text("b"), "");
    }

    #[test]
    fn row_serializes_as_cell_array() {
        let row = Row::new(vec![Cell::new("c1", "v1"), Cell::new("c2", "")]);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"column": "c1", "value": "v1"},
                {"column": "c2", "value": ""}
            ])
        );
    }

    #[test]
    fn rows_get_fresh_ids_on_load() {
        let json = r#"[{"column": "c1", "value": "v"}]"#;
        let a: Row = serde_json::from_str(json).unwrap();
        let b: Row = serde_json::from_str(json).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.cells, b.cells);
    }

    #[test]
    fn unknown_filter_operator_round_trips() {
        let json = r#"{"id": "f1", "columnId": "c1", "operator": "isGreater", "value": "3"}"#;
        let rule: FilterRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.operator, FilterOperator::Unknown("isGreater".into()));
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["operator"], "isGreater");
    }

    #[test]
    fn filter_operator_wire_names() {
        for (op, name) in [
            (FilterOperator::Contains, "contains"),
            (FilterOperator::DoesNotContain, "doesNotContain"),
            (FilterOperator::StartsWith, "startsWith"),
            (FilterOperator::EndsWith, "endsWith"),
            (FilterOperator::IsEmpty, "isEmpty"),
            (FilterOperator::IsNotEmpty, "isNotEmpty"),
            (FilterOperator::Equals, "equals"),
            (FilterOperator::NotEqual, "notEqual"),
        ] {
            assert_eq!(String::from(op.clone()), name);
            assert_eq!(FilterOperator::from(name.to_string()), op);
        }
    }

    #[test]
    fn column_type_wire_names() {
        let col = Column::new("c1", "Links", ColumnType::NoteLink);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "notelink");
        // Empty typeOptions still serializes, as an empty object
        assert_eq!(json["typeOptions"], serde_json::json!({}));
    }
}
