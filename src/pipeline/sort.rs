//! Multi-column sort stage.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::models::{ColumnKind, Record, SortColumn, SortDirection, SortState};

/// Order records by the active sort column.
///
/// Unsorted state returns the input order. The sort is stable, and blank
/// values of optional text columns stay last in both directions.
pub fn sort<'a>(records: &[&'a Record], state: &SortState) -> Vec<&'a Record> {
    let mut sorted = records.to_vec();

    let Some((column, direction)) = state.get() else {
        return sorted;
    };

    match column.kind() {
        ColumnKind::Text => {
            sorted.sort_by(|a, b| {
                directed(
                    compare_text(&text_value(a, column), &text_value(b, column)),
                    direction,
                )
            });
        }
        ColumnKind::OptionalText => {
            sorted.sort_by(|a, b| {
                let a = text_value(a, column);
                let b = text_value(b, column);
                match (is_blank(&a), is_blank(&b)) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => directed(compare_text(&a, &b), direction),
                }
            });
        }
        ColumnKind::Flag => {
            sorted.sort_by(|a, b| {
                directed(flag_value(a, column).cmp(&flag_value(b, column)), direction)
            });
        }
    }

    sorted
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn text_value(record: &Record, column: SortColumn) -> Cow<'_, str> {
    match column {
        SortColumn::Id => Cow::Borrowed(&record.id),
        SortColumn::Name => Cow::Borrowed(&record.display_name),
        SortColumn::Groups => Cow::Owned(record.groups.join(", ")),
        _ => Cow::Borrowed(""),
    }
}

fn flag_value(record: &Record, column: SortColumn) -> bool {
    match column {
        SortColumn::Shirt => record.shirt_claimed,
        SortColumn::Meal => record.meal_claimed,
        SortColumn::Consented => record.consented,
        SortColumn::Performing => record.performing,
        SortColumn::Booth => record.booth,
        _ => false,
    }
}
