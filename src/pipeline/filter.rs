//! Multi-criteria filter stage.

use crate::models::{FilterCriteria, Record};

/// Keep records satisfying every active criterion, preserving order.
pub fn filter<'a>(records: &[&'a Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    records
        .iter()
        .copied()
        .filter(|record| matches(record, criteria))
        .collect()
}

fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    if !criteria.groups.is_empty()
        && !record
            .groups
            .iter()
            .any(|group| criteria.groups.contains(group))
    {
        return false;
    }

    flag_matches(criteria.shirt_claimed, record.shirt_claimed)
        && flag_matches(criteria.meal_claimed, record.meal_claimed)
        && flag_matches(criteria.performing, record.performing)
        && flag_matches(criteria.booth, record.booth)
}

fn flag_matches(required: Option<bool>, actual: bool) -> bool {
    required.map_or(true, |value| value == actual)
}
