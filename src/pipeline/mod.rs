//! Client-side view pipeline.
//!
//! Pure functions deriving the table view from the canonical collection:
//! search, then filter, then sort. None of them mutate their input, so they
//! are safe to run on every view request.

mod filter;
mod search;
mod sort;

pub use filter::*;
pub use search::*;
pub use sort::*;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{FilterCriteria, Record, SortState};

/// Run search, filter and sort in that order.
pub fn apply<'a>(
    records: &'a [Record],
    query: &str,
    criteria: &FilterCriteria,
    sort_state: &SortState,
) -> Vec<&'a Record> {
    let all: Vec<&Record> = records.iter().collect();
    let searched = search(&all, query);
    let filtered = filter(&searched, criteria);
    sort(&filtered, sort_state)
}

/// Distinct group names across the collection, sorted, for the group filter options.
pub fn available_groups(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.groups.iter())
        .filter(|group| !group.trim().is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distribution counters over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
    pub total: usize,
    pub shirts_claimed: usize,
    pub meals_claimed: usize,
}

impl ClaimStats {
    pub fn collect(records: &[&Record]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            stats.shirts_claimed += usize::from(record.shirt_claimed);
            stats.meals_claimed += usize::from(record.meal_claimed);
            stats
        })
    }
}
