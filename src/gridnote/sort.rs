//! The sort engine: reorders the canonical row sequence in place
//! according to the single active sort rule.
//!
//! Clearing a sort rule does not restore the pre-sort order; reordering is
//! permanent. This is a documented limitation of the engine.

use std::cmp::Ordering;

use tracing::warn;

use crate::model::{Column, ColumnType, Row, SortDirection, SortRule};

/// Stable in-place sort of `rows` by `rule`.
///
/// - No rule: rows keep their existing order.
/// - Rule references a column that no longer exists: logged, no reorder.
/// - A row whose value for the sort column is empty/missing orders after
///   every row with a non-empty value, regardless of direction; two empty
///   values compare equal.
/// - The direction only negates the non-empty comparison.
pub fn sort_rows(rows: &mut [Row], columns: &[Column], rule: Option<&SortRule>) {
    let Some(rule) = rule else {
        return;
    };
    let Some(column) = columns.iter().find(|c| c.id == rule.column_id) else {
        warn!(
            column_id = %rule.column_id,
            "sort rule references a missing column, leaving row order unchanged"
        );
        return;
    };
    let column_type = column.column_type;

    rows.sort_by(|a, b| {
        let va = a.cell_text(&rule.column_id);
        let vb = b.cell_text(&rule.column_id);
        match (va.is_empty(), vb.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_values(va, vb, column_type);
                match rule.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
        }
    });
}

/// Compare two non-empty stored values under a column type.
///
/// Dates compare as integers (an unparsable non-empty string counts as
/// zero, it is not skipped); checkboxes as false < true; everything else
/// as emoji-stripped, case-folded strings.
pub fn compare_values(a: &str, b: &str, column_type: ColumnType) -> Ordering {
    match column_type {
        ColumnType::Date => parse_epoch(a).cmp(&parse_epoch(b)),
        ColumnType::Checkbox => (a == "true").cmp(&(b == "true")),
        ColumnType::Text | ColumnType::Dropdown | ColumnType::Multiselect | ColumnType::NoteLink => {
            fold(a).cmp(&fold(b))
        }
    }
}

fn parse_epoch(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

fn fold(value: &str) -> String {
    strip_emoji(value).to_lowercase()
}

/// Code point ranges dropped before string comparison: emoji and other
/// pictographs, their variation selectors, and the zero-width joiner.
const PICTOGRAPH_RANGES: &[(u32, u32)] = &[
    (0x200D, 0x200D),
    (0x2600, 0x27BF),
    (0x2B00, 0x2BFF),
    (0xFE00, 0xFE0F),
    (0x1F000, 0x1FAFF),
];

fn is_pictograph(c: char) -> bool {
    let cp = c as u32;
    PICTOGRAPH_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

fn strip_emoji(value: &str) -> String {
    value.chars().filter(|c| !is_pictograph(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("c1", "Name", ColumnType::Text),
            Column::new("c2", "Due", ColumnType::Date),
            Column::new("c3", "Done", ColumnType::Checkbox),
        ]
    }

    fn row(c1: &str, c2: &str, c3: &str) -> Row {
        Row::new(vec![
            Cell::new("c1", c1),
            Cell::new("c2", c2),
            Cell::new("c3", c3),
        ])
    }

    fn rule(column_id: &str, direction: SortDirection) -> SortRule {
        SortRule {
            column_id: column_id.to_string(),
            direction,
        }
    }

    fn order_of(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.cell_text("c1")).collect()
    }

    #[test]
    fn no_rule_keeps_order() {
        let mut rows = vec![row("b", "", ""), row("a", "", "")];
        sort_rows(&mut rows, &columns(), None);
        assert_eq!(order_of(&rows), ["b", "a"]);
    }

    #[test]
    fn missing_column_is_a_no_op() {
        let mut rows = vec![row("b", "", ""), row("a", "", "")];
        sort_rows(
            &mut rows,
            &columns(),
            Some(&rule("gone", SortDirection::Ascending)),
        );
        assert_eq!(order_of(&rows), ["b", "a"]);
    }

    #[test]
    fn empty_date_sorts_last_ascending() {
        // The concrete scenario: sorting by date ascending yields
        // 50, 100, then the empty-date row last.
        let mut rows = vec![row("b", "100", ""), row("a", "", ""), row("", "50", "")];
        sort_rows(
            &mut rows,
            &columns(),
            Some(&rule("c2", SortDirection::Ascending)),
        );
        assert_eq!(
            rows.iter().map(|r| r.cell_text("c2")).collect::<Vec<_>>(),
            ["50", "100", ""]
        );
    }

    #[test]
    fn empty_values_sort_last_regardless_of_direction() {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let mut rows = vec![row("x", "", ""), row("y", "100", ""), row("z", "", "")];
            sort_rows(&mut rows, &columns(), Some(&rule("c2", direction)));
            assert_eq!(rows[0].cell_text("c1"), "y");
            assert!(rows[1].cell_text("c2").is_empty());
            assert!(rows[2].cell_text("c2").is_empty());
        }
    }

    #[test]
    fn descending_reverses_non_empty_order() {
        let mut asc = vec![row("a", "", ""), row("c", "", ""), row("b", "", "")];
        let mut desc = asc.clone();
        sort_rows(&mut asc, &columns(), Some(&rule("c1", SortDirection::Ascending)));
        sort_rows(
            &mut desc,
            &columns(),
            Some(&rule("c1", SortDirection::Descending)),
        );
        assert_eq!(order_of(&asc), ["a", "b", "c"]);
        assert_eq!(order_of(&desc), ["c", "b", "a"]);
    }

    #[test]
    fn text_comparison_is_case_insensitive() {
        let mut rows = vec![row("Banana", "", ""), row("apple", "", "")];
        sort_rows(&mut rows, &columns(), Some(&rule("c1", SortDirection::Ascending)));
        assert_eq!(order_of(&rows), ["apple", "Banana"]);
    }

    #[test]
    fn emoji_is_ignored_in_text_comparison() {
        // Without stripping, the leading emoji code point would push
        // "🙂apple" after "banana"; stripped, it compares as "apple".
        let mut rows = vec![row("banana", "", ""), row("🙂apple", "", "")];
        sort_rows(&mut rows, &columns(), Some(&rule("c1", SortDirection::Ascending)));
        assert_eq!(order_of(&rows), ["🙂apple", "banana"]);
    }

    #[test]
    fn checkbox_false_before_true_ascending() {
        let mut rows = vec![row("t", "", "true"), row("f", "", "false")];
        sort_rows(&mut rows, &columns(), Some(&rule("c3", SortDirection::Ascending)));
        assert_eq!(order_of(&rows), ["f", "t"]);

        let mut rows = vec![row("f", "", "false"), row("t", "", "true")];
        sort_rows(
            &mut rows,
            &columns(),
            Some(&rule("c3", SortDirection::Descending)),
        );
        assert_eq!(order_of(&rows), ["t", "f"]);
    }

    #[test]
    fn empty_checkbox_still_sorts_last_descending() {
        let mut rows = vec![row("e", "", ""), row("t", "", "true"), row("f", "", "false")];
        sort_rows(
            &mut rows,
            &columns(),
            Some(&rule("c3", SortDirection::Descending)),
        );
        assert_eq!(order_of(&rows), ["t", "f", "e"]);
    }

    #[test]
    fn unparsable_date_counts_as_zero() {
        let mut rows = vec![row("big", "100", ""), row("junk", "not-a-date", "")];
        sort_rows(&mut rows, &columns(), Some(&rule("c2", SortDirection::Ascending)));
        assert_eq!(order_of(&rows), ["junk", "big"]);
    }

    #[test]
    fn negative_epoch_dates_compare_as_integers() {
        let mut rows = vec![row("later", "50", ""), row("earlier", "-100", "")];
        sort_rows(&mut rows, &columns(), Some(&rule("c2", SortDirection::Ascending)));
        assert_eq!(order_of(&rows), ["earlier", "later"]);
    }

    #[test]
    fn ties_are_stable() {
        let mut rows = vec![row("first", "7", ""), row("second", "7", ""), row("third", "7", "")];
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        sort_rows(&mut rows, &columns(), Some(&rule("c2", SortDirection::Ascending)));
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
    }
}
