//! The filter engine: computes the visible subset of rows without
//! mutating storage.
//!
//! Rules combine with logical AND; there is no OR or grouping. The
//! returned references point into the canonical slice in its current
//! (post-sort) order, so callers can resolve a visible row back to its
//! canonical position by identity.

use tracing::warn;

use crate::model::{FilterOperator, FilterRule, Row};

/// Rows satisfying every rule, in canonical order.
///
/// An empty rule set returns the full sequence.
pub fn visible_rows<'a>(rows: &'a [Row], rules: &[FilterRule]) -> Vec<&'a Row> {
    if rules.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| rules.iter().all(|rule| rule_matches(row, rule)))
        .collect()
}

/// Evaluate one rule against one row.
///
/// The compared cell value defaults to "" when the cell (or the rule's
/// column) is absent, and the rule's comparison value defaults to "".
/// String operators are case-insensitive; emptiness checks look at the
/// raw stored value. An unknown operator passes the row, so a corrupt
/// rule never hides data.
pub fn rule_matches(row: &Row, rule: &FilterRule) -> bool {
    let stored = row.cell_text(&rule.column_id);
    let target = rule.value.as_deref().unwrap_or("");

    match &rule.operator {
        FilterOperator::IsEmpty => stored.is_empty(),
        FilterOperator::IsNotEmpty => !stored.is_empty(),
        FilterOperator::Contains => fold(stored).contains(&fold(target)),
        FilterOperator::DoesNotContain => !fold(stored).contains(&fold(target)),
        FilterOperator::StartsWith => fold(stored).starts_with(&fold(target)),
        FilterOperator::EndsWith => fold(stored).ends_with(&fold(target)),
        FilterOperator::Equals => fold(stored) == fold(target),
        FilterOperator::NotEqual => fold(stored) != fold(target),
        FilterOperator::Unknown(op) => {
            warn!(operator = %op, rule_id = %rule.id, "unknown filter operator, letting the row through");
            true
        }
    }
}

fn fold(value: &str) -> String {
    value.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    fn row(status: &str, name: &str) -> Row {
        Row::new(vec![Cell::new("status", status), Cell::new("name", name)])
    }

    fn rule(column_id: &str, operator: FilterOperator, value: Option<&str>) -> FilterRule {
        FilterRule {
            id: "f1".to_string(),
            column_id: column_id.to_string(),
            operator,
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn empty_rules_return_every_row_by_reference() {
        let rows = vec![row("Done", "a"), row("", "b")];
        let visible = visible_rows(&rows, &[]);
        assert_eq!(visible.len(), 2);
        // Same elements, not copies: callers rely on identity lookups.
        assert!(std::ptr::eq(visible[0], &rows[0]));
        assert!(std::ptr::eq(visible[1], &rows[1]));
    }

    #[test]
    fn operators_match_case_insensitively() {
        let r = row("In Progress", "Write the spec");
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::Contains, Some("progress"))
        ));
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::StartsWith, Some("in "))
        ));
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::EndsWith, Some("PROGRESS"))
        ));
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::Equals, Some("in progress"))
        ));
        assert!(!rule_matches(
            &r,
            &rule("status", FilterOperator::NotEqual, Some("IN PROGRESS"))
        ));
        assert!(rule_matches(
            &r,
            &rule("name", FilterOperator::DoesNotContain, Some("deadline"))
        ));
    }

    #[test]
    fn emptiness_checks_use_the_raw_value() {
        let empty = row("", "x");
        let blank = row(" ", "x");
        assert!(rule_matches(
            &empty,
            &rule("status", FilterOperator::IsEmpty, None)
        ));
        // Whitespace is a value: not empty.
        assert!(!rule_matches(
            &blank,
            &rule("status", FilterOperator::IsEmpty, None)
        ));
        assert!(rule_matches(
            &blank,
            &rule("status", FilterOperator::IsNotEmpty, None)
        ));
    }

    #[test]
    fn missing_cell_and_missing_value_default_to_empty() {
        let r = Row::new(vec![Cell::new("name", "a")]);
        // status cell absent: "" equals the absent rule value "".
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::Equals, None)
        ));
        assert!(rule_matches(
            &r,
            &rule("status", FilterOperator::IsEmpty, None)
        ));
    }

    #[test]
    fn unknown_operator_fails_open() {
        let r = row("Done", "a");
        assert!(rule_matches(
            &r,
            &rule(
                "status",
                FilterOperator::Unknown("isGreater".to_string()),
                Some("zzz")
            )
        ));
    }

    #[test]
    fn rules_combine_with_and() {
        let rows = vec![row("Done", "alpha"), row("Done", "beta"), row("Open", "alpha")];
        let r1 = rule("status", FilterOperator::Equals, Some("done"));
        let r2 = rule("name", FilterOperator::StartsWith, Some("a"));
        let visible = visible_rows(&rows, &[r1.clone(), r2.clone()]);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].cell_text("name"), "alpha");

        // Adding a rule never increases the visible set.
        let only_r1 = visible_rows(&rows, &[r1]);
        assert!(visible.iter().all(|v| only_r1.iter().any(|o| o.id == v.id)));
    }

    #[test]
    fn filtering_preserves_relative_order() {
        let rows = vec![row("a", "1"), row("b", "2"), row("a", "3"), row("a", "4")];
        let visible = visible_rows(&rows, &[rule("status", FilterOperator::Equals, Some("a"))]);
        let names: Vec<_> = visible.iter().map(|r| r.cell_text("name")).collect();
        assert_eq!(names, ["1", "3", "4"]);
    }
}
