//! Organization details parser.
//!
//! Turns the free-text `Tag: <club>, Kind: <role>; ...` blob attached to an
//! attendee into club memberships and involvement flags. Malformed entries are
//! skipped; parsing never fails.

const ENTRY_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ',';
const TAG_PREFIX: &str = "Tag:";
const KIND_PREFIX: &str = "Kind:";

const PERFORMANCE_MARKER: &str = "performance";
const BOOTH_MARKER: &str = "booth";

/// Structured form of an organization details blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationDetails {
    /// Group names in input order, duplicates preserved
    pub groups: Vec<String>,
    pub performing: bool,
    pub booth: bool,
}

/// Parse an optional organization details blob.
pub fn parse_organization_details(raw: Option<&str>) -> OrganizationDetails {
    let mut details = OrganizationDetails::default();

    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return details;
    };

    for entry in raw.split(ENTRY_SEPARATOR) {
        let Some((name, role)) = parse_entry(entry) else {
            continue;
        };

        if !name.is_empty() {
            details.groups.push(name.to_string());
        }

        let role = role.to_lowercase();
        details.performing |= role.contains(PERFORMANCE_MARKER);
        details.booth |= role.contains(BOOTH_MARKER);
    }

    details
}

/// Split one entry into its group name and role text.
///
/// The role runs from the `Kind:` field to the end of the entry, so roles
/// containing commas stay whole.
fn parse_entry(entry: &str) -> Option<(&str, &str)> {
    let mut name = None;
    let mut offset = 0;

    for field in entry.split(FIELD_SEPARATOR) {
        let trimmed = field.trim_start();
        let field_start = offset + (field.len() - trimmed.len());
        offset += field.len() + FIELD_SEPARATOR.len_utf8();

        if name.is_none() {
            if let Some(value) = trimmed.strip_prefix(TAG_PREFIX) {
                name = Some(value.trim());
                continue;
            }
        }
        if trimmed.starts_with(KIND_PREFIX) {
            let role = &entry[field_start + KIND_PREFIX.len()..];
            return Some((name?, role));
        }
    }

    None
}
