//! Filter and sort state for the attendee table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Snapshot of the active filter selections.
///
/// `None` on a boolean criterion means inactive. The default value is the
/// cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Selected clubs, OR-combined
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub shirt_claimed: Option<bool>,
    #[serde(default)]
    pub meal_claimed: Option<bool>,
    #[serde(default)]
    pub performing: Option<bool>,
    #[serde(default)]
    pub booth: Option<bool>,
}

impl FilterCriteria {
    /// Reset every criterion to inactive.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether any criterion is active.
    pub fn is_active(&self) -> bool {
        !self.groups.is_empty()
            || self.shirt_claimed.is_some()
            || self.meal_claimed.is_some()
            || self.performing.is_some()
            || self.booth.is_some()
    }
}

/// Column the table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Id,
    Name,
    Groups,
    Shirt,
    Meal,
    Consented,
    Performing,
    Booth,
}

/// How a column's values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Case-insensitive text
    Text,
    /// Case-insensitive text where blank values always sort last
    OptionalText,
    /// Boolean, `false` before `true` ascending
    Flag,
}

impl SortColumn {
    pub fn kind(&self) -> ColumnKind {
        match self {
            SortColumn::Id => ColumnKind::Text,
            SortColumn::Name | SortColumn::Groups => ColumnKind::OptionalText,
            SortColumn::Shirt
            | SortColumn::Meal
            | SortColumn::Consented
            | SortColumn::Performing
            | SortColumn::Booth => ColumnKind::Flag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active ordering of the table.
///
/// Column and direction are either both set or both absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SortParts", into = "SortParts")]
pub struct SortState(Option<(SortColumn, SortDirection)>);

impl SortState {
    pub fn unsorted() -> Self {
        Self(None)
    }

    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self(Some((column, direction)))
    }

    /// Build from independently optional parts; anything less than both is unsorted.
    pub fn from_parts(column: Option<SortColumn>, direction: Option<SortDirection>) -> Self {
        match (column, direction) {
            (Some(column), Some(direction)) => Self::new(column, direction),
            _ => Self::unsorted(),
        }
    }

    pub fn column(&self) -> Option<SortColumn> {
        self.0.map(|(column, _)| column)
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.0.map(|(_, direction)| direction)
    }

    pub fn get(&self) -> Option<(SortColumn, SortDirection)> {
        self.0
    }

    /// Header click: ascending, then descending, then unsorted.
    pub fn toggle(&mut self, column: SortColumn) {
        self.0 = match self.0 {
            Some((current, SortDirection::Asc)) if current == column => {
                Some((column, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == column => None,
            _ => Some((column, SortDirection::Asc)),
        };
    }
}

/// Wire form of [`SortState`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParts {
    #[serde(default)]
    pub column: Option<SortColumn>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl From<SortParts> for SortState {
    fn from(parts: SortParts) -> Self {
        SortState::from_parts(parts.column, parts.direction)
    }
}

impl From<SortState> for SortParts {
    fn from(state: SortState) -> Self {
        SortParts {
            column: state.column(),
            direction: state.direction(),
        }
    }
}
