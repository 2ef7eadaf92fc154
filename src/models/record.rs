//! Attendee record models matching the upstream check-in API.

use serde::{Deserialize, Serialize};

use crate::parser::parse_organization_details;

/// Attendee row as delivered by the upstream record endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub id: String,
    pub name: String,
    pub shirt_claimed: bool,
    pub meal_claimed: bool,
    pub consented: bool,
    /// Free text of the form `Tag: <club>, Kind: <role>; ...`
    #[serde(default)]
    pub organization_details: Option<String>,
}

/// A single attendee in the canonical collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub display_name: String,
    pub shirt_claimed: bool,
    pub meal_claimed: bool,
    /// Read-only display field
    pub consented: bool,
    /// Club memberships, order irrelevant
    pub groups: Vec<String>,
    pub performing: bool,
    pub booth: bool,
}

impl Record {
    /// Current value of a claim field.
    pub fn claim(&self, field: ClaimField) -> bool {
        match field {
            ClaimField::Shirt => self.shirt_claimed,
            ClaimField::Meal => self.meal_claimed,
        }
    }

    pub(crate) fn set_claim(&mut self, field: ClaimField, value: bool) {
        match field {
            ClaimField::Shirt => self.shirt_claimed = value,
            ClaimField::Meal => self.meal_claimed = value,
        }
    }
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        let details = parse_organization_details(raw.organization_details.as_deref());

        Self {
            id: raw.id,
            display_name: raw.name,
            shirt_claimed: raw.shirt_claimed,
            meal_claimed: raw.meal_claimed,
            consented: raw.consented,
            groups: details.groups,
            performing: details.performing,
            booth: details.booth,
        }
    }
}

/// Independently toggleable claim state on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimField {
    Shirt,
    Meal,
}

impl ClaimField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimField::Shirt => "shirt",
            ClaimField::Meal => "meal",
        }
    }
}

impl std::fmt::Display for ClaimField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
