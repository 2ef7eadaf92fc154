//! Free-text search stage.

use crate::models::Record;

/// Keep records whose id or display name contains the query, case-insensitively.
///
/// A blank query returns the input unchanged. Trimming only decides blankness;
/// the query is matched as typed.
pub fn search<'a>(records: &[&'a Record], query: &str) -> Vec<&'a Record> {
    if query.trim().is_empty() {
        return records.to_vec();
    }

    let needle = query.to_lowercase();

    records
        .iter()
        .copied()
        .filter(|record| {
            record.id.to_lowercase().contains(&needle)
                || record.display_name.to_lowercase().contains(&needle)
        })
        .collect()
}
