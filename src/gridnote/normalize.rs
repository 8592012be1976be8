//! Load-time validation and migration of persisted tables.
//!
//! Runs on the raw JSON value, before typed deserialization, because the
//! legacy shapes it repairs (flat per-type options on the column, missing
//! `views`) don't fit the typed model. Both storage adapters funnel every
//! load through [`normalize`]; running it twice is a fixpoint.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{GridError, Result};
use crate::model::Table;

/// Per-type option keys that older documents carried flat on the column
/// instead of inside `typeOptions`.
const LEGACY_COLUMN_KEYS: [&str; 3] = ["dateFormat", "options", "suggestAllFiles"];

/// Validate and migrate a raw document into a [`Table`].
///
/// Guarantees after this call:
/// - `columns` and `rows` are arrays, or the document is rejected with
///   [`GridError::Structure`] (it is not a table);
/// - every column has a `typeOptions` object, with legacy flat keys moved
///   into it and the flat duplicates removed;
/// - `views` has at least one entry, and `views[0].sort`/`filter` are
///   arrays.
pub fn normalize(raw: Value) -> Result<Table> {
    let mut root = match raw {
        Value::Object(map) => map,
        _ => {
            return Err(GridError::Structure(
                "document root is not an object".to_string(),
            ))
        }
    };

    match root.get_mut("columns") {
        Some(Value::Array(columns)) => {
            for column in columns.iter_mut() {
                migrate_column(column);
            }
        }
        _ => {
            return Err(GridError::Structure(
                "'columns' is missing or not an array".to_string(),
            ))
        }
    }

    if !matches!(root.get("rows"), Some(Value::Array(_))) {
        return Err(GridError::Structure(
            "'rows' is missing or not an array".to_string(),
        ));
    }

    ensure_views(&mut root);

    serde_json::from_value(Value::Object(root)).map_err(GridError::Serialization)
}

fn migrate_column(column: &mut Value) {
    let Value::Object(obj) = column else {
        return;
    };

    if !matches!(obj.get("typeOptions"), Some(Value::Object(_))) {
        obj.insert("typeOptions".to_string(), Value::Object(Map::new()));
    }

    for key in LEGACY_COLUMN_KEYS {
        let Some(flat) = obj.remove(key) else {
            continue;
        };
        // A value already nested under typeOptions wins over the flat one.
        if let Some(Value::Object(opts)) = obj.get_mut("typeOptions") {
            opts.entry(key.to_string()).or_insert(flat);
        }
    }
}

fn ensure_views(root: &mut Map<String, Value>) {
    if let Some(Value::Array(views)) = root.get_mut("views") {
        if let Some(Value::Object(first)) = views.first_mut() {
            for key in ["sort", "filter"] {
                if !matches!(first.get(key), Some(Value::Array(_))) {
                    first.insert(key.to_string(), Value::Array(Vec::new()));
                }
            }
            return;
        }
    }

    root.insert(
        "views".to_string(),
        serde_json::json!([{
            "id": format!("default_{}", Utc::now().timestamp_millis()),
            "name": "Default",
            "sort": [],
            "filter": [],
        }]),
    );
}
